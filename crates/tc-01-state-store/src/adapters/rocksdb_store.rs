//! # RocksDB State Store
//!
//! Durable backend on an embedded LSM tree.
//!
//! ## Layout
//!
//! See [`crate::domain::keys`]. A task record and its status index entry are
//! always written in one `WriteBatch`, so a crash never leaves the index
//! pointing at a stale status.
//!
//! ## Concurrency
//!
//! Reads share the lock; every mutation takes it exclusively so that
//! read-check-write sequences (status transitions, duplicate detection) are
//! linearizable. Background compaction runs on the blocking pool against a
//! weak handle to the database and never contends on the lock.

use crate::adapters::sweeper::PeriodicSweeper;
use crate::domain::config::RocksDbConfig;
use crate::domain::errors::{StoreError, StoreResult};
use crate::domain::keys;
use crate::ports::inbound::StateStore;
use parking_lot::{Mutex, RwLock};
use rocksdb::{Direction, IteratorMode, Options, WriteBatch, WriteOptions, DB};
use shared_types::{BlockRecord, ChainId, Task, TaskId, TaskRecord, TaskStatus};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// RocksDB implementation of [`StateStore`].
pub struct RocksDbStateStore {
    db: RwLock<Option<Arc<DB>>>,
    config: RocksDbConfig,
    compaction: Mutex<Option<PeriodicSweeper>>,
}

impl RocksDbStateStore {
    /// Open (or create) the database and schedule background compaction on
    /// the current tokio runtime. Opened outside a runtime, the store works
    /// without compaction.
    pub fn open(config: RocksDbConfig) -> StoreResult<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(config.create_if_missing);
        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_max_write_buffer_number(config.max_write_buffer_number);
        opts.set_compression_type(rocksdb::DBCompressionType::Snappy);

        let db = DB::open(&opts, &config.path).map_err(|e| {
            StoreError::Database(format!(
                "failed to open RocksDB at {}: {}",
                config.path.display(),
                e
            ))
        })?;
        let db = Arc::new(db);

        let gc_db = Arc::downgrade(&db);
        let sweeper = PeriodicSweeper::spawn("tc-01-compaction", config.gc_interval, move || {
            if let Some(db) = gc_db.upgrade() {
                db.compact_range(None::<&[u8]>, None::<&[u8]>);
                debug!("[tc-01] Compaction pass finished");
            }
        });

        info!(
            "[tc-01] RocksDB state store opened at {} (gc every {:?})",
            config.path.display(),
            config.gc_interval
        );

        Ok(Self {
            db: RwLock::new(Some(db)),
            config,
            compaction: Mutex::new(sweeper),
        })
    }

    fn write_options(&self) -> WriteOptions {
        let mut opts = WriteOptions::default();
        opts.set_sync(self.config.sync_writes);
        opts
    }

    fn read_record(db: &DB, task_id: &TaskId) -> StoreResult<Option<TaskRecord>> {
        match db.get_pinned(keys::task_key(task_id))? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    fn read_block(db: &DB, key: &[u8]) -> StoreResult<Option<BlockRecord>> {
        match db.get_pinned(key)? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Keys of every block of the pair numbered below `number`.
    fn block_keys_below(db: &DB, prefix: &[u8], number: u64) -> StoreResult<Vec<Vec<u8>>> {
        let mut found = Vec::new();
        for item in db.iterator(IteratorMode::From(prefix, Direction::Forward)) {
            let (key, _) = item?;
            match keys::block_number_from_key(prefix, &key) {
                Some(n) if n < number => found.push(key.to_vec()),
                Some(_) => break,
                None if key.starts_with(prefix) => continue,
                None => break,
            }
        }
        Ok(found)
    }
}

impl StateStore for RocksDbStateStore {
    fn save_pending_task(&self, task: &Task) -> StoreResult<()> {
        let guard = self.db.write();
        let db = guard.as_ref().ok_or(StoreError::StoreClosed)?;

        if db.get_pinned(keys::task_key(&task.task_id))?.is_some() {
            return Err(StoreError::AlreadyExists(task.task_id.clone()));
        }

        let record = TaskRecord::pending(task.clone());
        let mut batch = WriteBatch::default();
        batch.put(keys::task_key(&task.task_id), bincode::serialize(&record)?);
        batch.put(keys::status_key(TaskStatus::Pending, &task.task_id), b"");
        db.write_opt(batch, &self.write_options())?;

        debug!("[tc-01] Saved pending task {}", task.task_id);
        Ok(())
    }

    fn get_task(&self, task_id: &TaskId) -> StoreResult<TaskRecord> {
        let guard = self.db.read();
        let db = guard.as_ref().ok_or(StoreError::StoreClosed)?;
        Self::read_record(db, task_id)?.ok_or_else(|| StoreError::task_not_found(task_id))
    }

    fn list_tasks_with_status(&self, status: TaskStatus) -> StoreResult<Vec<TaskRecord>> {
        let guard = self.db.read();
        let db = guard.as_ref().ok_or(StoreError::StoreClosed)?;

        let prefix = keys::status_prefix(status);
        let mut records = Vec::new();
        for item in db.iterator(IteratorMode::From(prefix.as_slice(), Direction::Forward)) {
            let (key, _) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            let Some(task_id) = keys::task_id_from_status_key(status, &key) else {
                continue;
            };
            match Self::read_record(db, &task_id)? {
                Some(record) if record.status == status => records.push(record),
                _ => warn!("[tc-01] Dangling {} index entry for task {}", status, task_id),
            }
        }
        Ok(records)
    }

    fn update_task_status(&self, task_id: &TaskId, status: TaskStatus) -> StoreResult<TaskRecord> {
        let guard = self.db.write();
        let db = guard.as_ref().ok_or(StoreError::StoreClosed)?;

        let mut record =
            Self::read_record(db, task_id)?.ok_or_else(|| StoreError::task_not_found(task_id))?;
        let from = record.status;
        record.transition(status).map_err(|from| {
            warn!("[tc-01] Rejected transition {} -> {} for task {}", from, status, task_id);
            StoreError::InvalidTaskStatus {
                task_id: task_id.clone(),
                from,
                to: status,
            }
        })?;

        let mut batch = WriteBatch::default();
        batch.put(keys::task_key(task_id), bincode::serialize(&record)?);
        batch.delete(keys::status_key(from, task_id));
        batch.put(keys::status_key(status, task_id), b"");
        db.write_opt(batch, &self.write_options())?;

        debug!("[tc-01] Task {} is now {}", task_id, status);
        Ok(record)
    }

    fn delete_task(&self, task_id: &TaskId) -> StoreResult<()> {
        let guard = self.db.write();
        let db = guard.as_ref().ok_or(StoreError::StoreClosed)?;

        let record =
            Self::read_record(db, task_id)?.ok_or_else(|| StoreError::task_not_found(task_id))?;
        let mut batch = WriteBatch::default();
        batch.delete(keys::task_key(task_id));
        batch.delete(keys::status_key(record.status, task_id));
        db.write_opt(batch, &self.write_options())?;
        Ok(())
    }

    fn save_block(&self, avs_address: &str, block: &BlockRecord) -> StoreResult<()> {
        block.chain_id.validate()?;
        let guard = self.db.write();
        let db = guard.as_ref().ok_or(StoreError::StoreClosed)?;

        let key = keys::block_key(avs_address, block.chain_id, block.number);
        db.put_opt(key, bincode::serialize(block)?, &self.write_options())?;
        Ok(())
    }

    fn get_block(
        &self,
        avs_address: &str,
        chain_id: ChainId,
        number: u64,
    ) -> StoreResult<BlockRecord> {
        chain_id.validate()?;
        let guard = self.db.read();
        let db = guard.as_ref().ok_or(StoreError::StoreClosed)?;

        Self::read_block(db, &keys::block_key(avs_address, chain_id, number))?
            .ok_or_else(|| StoreError::block_not_found(avs_address, chain_id, number))
    }

    fn delete_block(&self, avs_address: &str, chain_id: ChainId, number: u64) -> StoreResult<()> {
        chain_id.validate()?;
        let guard = self.db.write();
        let db = guard.as_ref().ok_or(StoreError::StoreClosed)?;

        let key = keys::block_key(avs_address, chain_id, number);
        if db.get_pinned(&key)?.is_none() {
            return Err(StoreError::block_not_found(avs_address, chain_id, number));
        }
        db.delete_opt(key, &self.write_options())?;
        Ok(())
    }

    fn get_last_processed_block(
        &self,
        avs_address: &str,
        chain_id: ChainId,
    ) -> StoreResult<BlockRecord> {
        chain_id.validate()?;
        let guard = self.db.read();
        let db = guard.as_ref().ok_or(StoreError::StoreClosed)?;

        let prefix = keys::block_prefix(avs_address, chain_id);
        let upper = keys::block_key(avs_address, chain_id, u64::MAX);
        for item in db.iterator(IteratorMode::From(upper.as_slice(), Direction::Reverse)) {
            let (key, value) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            if keys::block_number_from_key(&prefix, &key).is_some() {
                return Ok(bincode::deserialize(&value)?);
            }
        }
        Err(StoreError::no_processed_block(avs_address, chain_id))
    }

    fn prune_blocks_before(
        &self,
        avs_address: &str,
        chain_id: ChainId,
        number: u64,
    ) -> StoreResult<usize> {
        chain_id.validate()?;
        let guard = self.db.write();
        let db = guard.as_ref().ok_or(StoreError::StoreClosed)?;

        let prefix = keys::block_prefix(avs_address, chain_id);
        let stale = Self::block_keys_below(db, &prefix, number)?;
        if stale.is_empty() {
            return Ok(0);
        }

        let mut batch = WriteBatch::default();
        for key in &stale {
            batch.delete(key);
        }
        db.write_opt(batch, &self.write_options())?;
        debug!(
            "[tc-01] Pruned {} blocks below {} for {} on chain {}",
            stale.len(),
            number,
            avs_address,
            chain_id
        );
        Ok(stale.len())
    }

    fn close(&self) -> StoreResult<()> {
        let mut guard = self.db.write();
        if guard.is_none() {
            return Ok(());
        }

        if let Some(sweeper) = self.compaction.lock().take() {
            sweeper.stop();
        }
        if let Some(db) = guard.take() {
            db.flush()?;
        }
        info!("[tc-01] RocksDB state store closed");
        Ok(())
    }
}

impl Drop for RocksDbStateStore {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("[tc-01] Error closing RocksDB state store: {}", e);
        }
    }
}
