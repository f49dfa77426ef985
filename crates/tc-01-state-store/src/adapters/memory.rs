//! # In-Memory State Store
//!
//! Process-local backend for tests and ephemeral deployments.

use crate::domain::errors::{StoreError, StoreResult};
use crate::ports::inbound::StateStore;
use parking_lot::RwLock;
use shared_types::{normalize_avs, BlockRecord, ChainId, Task, TaskId, TaskRecord, TaskStatus};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

type BlockLedger = BTreeMap<u64, BlockRecord>;

#[derive(Default)]
struct MemoryState {
    tasks: HashMap<TaskId, TaskRecord>,
    /// Keyed by (lowercase avs, chain).
    blocks: HashMap<(String, ChainId), BlockLedger>,
    closed: bool,
}

impl MemoryState {
    fn ensure_open(&self) -> StoreResult<()> {
        if self.closed {
            return Err(StoreError::StoreClosed);
        }
        Ok(())
    }
}

/// In-memory implementation of [`StateStore`].
#[derive(Default)]
pub struct InMemoryStateStore {
    state: RwLock<MemoryState>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of task records held.
    pub fn task_count(&self) -> usize {
        self.state.read().tasks.len()
    }
}

fn ledger_key(avs_address: &str, chain_id: ChainId) -> StoreResult<(String, ChainId)> {
    Ok((normalize_avs(avs_address), chain_id.validate()?))
}

impl StateStore for InMemoryStateStore {
    fn save_pending_task(&self, task: &Task) -> StoreResult<()> {
        let mut state = self.state.write();
        state.ensure_open()?;

        if state.tasks.contains_key(&task.task_id) {
            return Err(StoreError::AlreadyExists(task.task_id.clone()));
        }
        state
            .tasks
            .insert(task.task_id.clone(), TaskRecord::pending(task.clone()));
        debug!("[tc-01] Saved pending task {}", task.task_id);
        Ok(())
    }

    fn get_task(&self, task_id: &TaskId) -> StoreResult<TaskRecord> {
        let state = self.state.read();
        state.ensure_open()?;
        state
            .tasks
            .get(task_id)
            .cloned()
            .ok_or_else(|| StoreError::task_not_found(task_id))
    }

    fn list_tasks_with_status(&self, status: TaskStatus) -> StoreResult<Vec<TaskRecord>> {
        let state = self.state.read();
        state.ensure_open()?;
        let mut records: Vec<TaskRecord> = state
            .tasks
            .values()
            .filter(|record| record.status == status)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.task_id().cmp(b.task_id()));
        Ok(records)
    }

    fn update_task_status(&self, task_id: &TaskId, status: TaskStatus) -> StoreResult<TaskRecord> {
        let mut state = self.state.write();
        state.ensure_open()?;

        let record = state
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| StoreError::task_not_found(task_id))?;

        record.transition(status).map_err(|from| {
            warn!("[tc-01] Rejected transition {} -> {} for task {}", from, status, task_id);
            StoreError::InvalidTaskStatus {
                task_id: task_id.clone(),
                from,
                to: status,
            }
        })?;
        debug!("[tc-01] Task {} is now {}", task_id, status);
        Ok(record.clone())
    }

    fn delete_task(&self, task_id: &TaskId) -> StoreResult<()> {
        let mut state = self.state.write();
        state.ensure_open()?;
        state
            .tasks
            .remove(task_id)
            .map(|_| ())
            .ok_or_else(|| StoreError::task_not_found(task_id))
    }

    fn save_block(&self, avs_address: &str, block: &BlockRecord) -> StoreResult<()> {
        let key = ledger_key(avs_address, block.chain_id)?;
        let mut state = self.state.write();
        state.ensure_open()?;
        state
            .blocks
            .entry(key)
            .or_default()
            .insert(block.number, block.clone());
        Ok(())
    }

    fn get_block(
        &self,
        avs_address: &str,
        chain_id: ChainId,
        number: u64,
    ) -> StoreResult<BlockRecord> {
        let key = ledger_key(avs_address, chain_id)?;
        let state = self.state.read();
        state.ensure_open()?;
        state
            .blocks
            .get(&key)
            .and_then(|ledger| ledger.get(&number))
            .cloned()
            .ok_or_else(|| StoreError::block_not_found(avs_address, chain_id, number))
    }

    fn delete_block(&self, avs_address: &str, chain_id: ChainId, number: u64) -> StoreResult<()> {
        let key = ledger_key(avs_address, chain_id)?;
        let mut state = self.state.write();
        state.ensure_open()?;

        let ledger = state
            .blocks
            .get_mut(&key)
            .ok_or_else(|| StoreError::block_not_found(avs_address, chain_id, number))?;
        ledger
            .remove(&number)
            .ok_or_else(|| StoreError::block_not_found(avs_address, chain_id, number))?;
        if ledger.is_empty() {
            state.blocks.remove(&key);
        }
        Ok(())
    }

    fn get_last_processed_block(
        &self,
        avs_address: &str,
        chain_id: ChainId,
    ) -> StoreResult<BlockRecord> {
        let key = ledger_key(avs_address, chain_id)?;
        let state = self.state.read();
        state.ensure_open()?;
        state
            .blocks
            .get(&key)
            .and_then(|ledger| ledger.values().next_back())
            .cloned()
            .ok_or_else(|| StoreError::no_processed_block(avs_address, chain_id))
    }

    fn prune_blocks_before(
        &self,
        avs_address: &str,
        chain_id: ChainId,
        number: u64,
    ) -> StoreResult<usize> {
        let key = ledger_key(avs_address, chain_id)?;
        let mut state = self.state.write();
        state.ensure_open()?;

        let Some(ledger) = state.blocks.get_mut(&key) else {
            return Ok(0);
        };
        let kept = ledger.split_off(&number);
        let removed = ledger.len();
        *ledger = kept;
        if ledger.is_empty() {
            state.blocks.remove(&key);
        }
        Ok(removed)
    }

    fn close(&self) -> StoreResult<()> {
        let mut state = self.state.write();
        if state.closed {
            return Ok(());
        }
        state.closed = true;
        state.tasks.clear();
        state.blocks.clear();
        info!("[tc-01] In-memory state store closed");
        Ok(())
    }
}
