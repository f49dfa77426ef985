//! # Aggregator
//!
//! Drives chain poller events through the engine:
//!
//! ```text
//! TaskCreated ──→ save pending ──→ block context ──→ resolve peers
//!                                                        │
//!        completed ←── sink ←── certificate ←── process ←┘ (pending → processing)
//!            └──────────── any failure: → failed ─────────┘
//!
//! NewBlock ──→ reorg check ──→ cancel replaced blocks ──→ save ──→ prune
//! ```
//!
//! One `BlockContextManager` per configured chain, all children of one root
//! token. Cancelling the root (shutdown) ends every in-flight session.

use crate::config::{AggregatorConfig, AvsConfig};
use crate::errors::{AggregatorError, AggregatorResult};
use crate::ports::{CertificateSink, ChainEvent};
use shared_types::{normalize_avs, BlockRecord, ChainId, Task, TaskId, TaskStatus};
use std::collections::HashMap;
use std::sync::Arc;
use tc_01_state_store::{StateStore, StoreError};
use tc_02_block_context::{BlockContext, BlockContextManager};
use tc_03_signature_schemes::{
    scheme_for, signer_from_secret, task_payload_digest, SignatureScheme, TaskSigner,
};
use tc_04_consensus_session::{
    Certificate, ConsensusSession, OperatorDirectory, OperatorTransport,
};
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// How a task left the pipeline.
#[derive(Debug, Clone)]
pub enum TaskOutcome {
    Completed(Certificate),
    /// Marked `failed`; the reason is the session or sink error.
    Failed(String),
    /// Already known to the store; not processed again.
    Duplicate,
}

/// What `handle_block` changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockOutcome {
    /// Block numbers discarded as belonging to a replaced fork, highest first.
    pub reorged: Vec<u64>,
    pub pruned: usize,
    /// The exact block was already recorded.
    pub duplicate: bool,
}

struct AvsRuntime {
    config: AvsConfig,
    scheme: Arc<dyn SignatureScheme>,
    signer: Arc<dyn TaskSigner>,
}

/// The task consensus aggregator.
pub struct Aggregator {
    store: Arc<dyn StateStore>,
    directory: Arc<dyn OperatorDirectory>,
    transport: Arc<dyn OperatorTransport>,
    sink: Arc<dyn CertificateSink>,
    /// Keyed by normalized AVS address.
    avs: HashMap<String, AvsRuntime>,
    contexts: HashMap<ChainId, Arc<BlockContextManager>>,
    root: CancellationToken,
    block_retention: u64,
}

impl Aggregator {
    pub fn new(
        config: &AggregatorConfig,
        store: Arc<dyn StateStore>,
        directory: Arc<dyn OperatorDirectory>,
        transport: Arc<dyn OperatorTransport>,
        sink: Arc<dyn CertificateSink>,
    ) -> AggregatorResult<Self> {
        config.validate()?;
        let root = CancellationToken::new();
        let context_config = config.block_context_config();

        let mut avs = HashMap::new();
        let mut contexts = HashMap::new();
        for entry in &config.avs {
            let invalid_key = |reason: String| AggregatorError::InvalidSigningKey {
                avs: entry.address.clone(),
                reason,
            };
            let secret = hex::decode(entry.signing_key.trim().trim_start_matches("0x"))
                .map_err(|e| invalid_key(e.to_string()))?;
            let signer = signer_from_secret(entry.curve_type, &secret)
                .map_err(|e| invalid_key(e.to_string()))?;

            for chain_id in &entry.chain_ids {
                contexts.entry(ChainId(*chain_id)).or_insert_with(|| {
                    Arc::new(BlockContextManager::new(root.clone(), context_config.clone()))
                });
            }
            info!(
                "[runtime] Serving AVS {} ({}) on chains {:?}",
                entry.address, entry.curve_type, entry.chain_ids
            );
            avs.insert(
                entry.key(),
                AvsRuntime {
                    config: entry.clone(),
                    scheme: scheme_for(entry.curve_type),
                    signer,
                },
            );
        }

        Ok(Self {
            store,
            directory,
            transport,
            sink,
            avs,
            contexts,
            root,
            block_retention: config.block_retention,
        })
    }

    pub fn store(&self) -> &Arc<dyn StateStore> {
        &self.store
    }

    pub fn context_manager(&self, chain_id: ChainId) -> Option<&Arc<BlockContextManager>> {
        self.contexts.get(&chain_id)
    }

    /// Parent of every block context.
    pub fn root_token(&self) -> &CancellationToken {
        &self.root
    }

    fn avs(&self, address: &str) -> AggregatorResult<&AvsRuntime> {
        self.avs
            .get(&normalize_avs(address))
            .ok_or_else(|| AggregatorError::UnknownAvs(address.to_string()))
    }

    fn manager_for(
        &self,
        avs: &AvsRuntime,
        chain_id: ChainId,
    ) -> AggregatorResult<&Arc<BlockContextManager>> {
        chain_id.validate()?;
        let unknown = || AggregatorError::UnknownChain {
            avs: avs.config.address.clone(),
            chain_id: chain_id.0,
        };
        if !avs.config.chain_ids.contains(&chain_id.0) {
            return Err(unknown());
        }
        self.contexts.get(&chain_id).ok_or_else(unknown)
    }

    fn context_for(&self, task: &Task) -> AggregatorResult<BlockContext> {
        let avs = self.avs(&task.avs_address)?;
        let manager = self.manager_for(avs, task.chain_id)?;
        Ok(manager.get_context(task.source_block_number, task))
    }

    // =========================================================================
    // Task pipeline
    // =========================================================================

    /// Run a newly observed task to completion or failure.
    pub async fn process_task(&self, task: Task) -> AggregatorResult<TaskOutcome> {
        match self.admit_task(&task)? {
            Some(ctx) => self.execute(task, ctx).await,
            None => Ok(TaskOutcome::Duplicate),
        }
    }

    /// Persist `task` as pending and bind it to its block context.
    ///
    /// Returns `None` for a task the store already knows.
    pub fn admit_task(&self, task: &Task) -> AggregatorResult<Option<BlockContext>> {
        let ctx = self.context_for(task)?;
        match self.store.save_pending_task(task) {
            Ok(()) => {}
            Err(StoreError::AlreadyExists(task_id)) => {
                debug!(task_id = %task_id, "[runtime] Task already known, skipping");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        }
        info!(
            task_id = %task.task_id,
            block = task.source_block_number,
            "[runtime] Admitted task for AVS {} on chain {}",
            task.avs_address,
            task.chain_id
        );
        Ok(Some(ctx))
    }

    /// Drive a pending task through its consensus session.
    pub async fn execute(&self, task: Task, ctx: BlockContext) -> AggregatorResult<TaskOutcome> {
        let session = match self.build_session(&task, ctx).await {
            Ok(session) => session,
            Err(e) => return self.fail(&task.task_id, e.to_string()),
        };
        self.store
            .update_task_status(&task.task_id, TaskStatus::Processing)?;

        let certificate = match session.process().await {
            Ok(certificate) => certificate,
            Err(e) => return self.fail(&task.task_id, e.to_string()),
        };
        if let Err(reason) = self.sink.submit(&task, &certificate).await {
            return self.fail(&task.task_id, AggregatorError::Sink(reason).to_string());
        }

        self.store
            .update_task_status(&task.task_id, TaskStatus::Completed)?;
        info!(
            task_id = %task.task_id,
            session = %certificate.session_id,
            "[runtime] Task completed with {} signers",
            certificate.signers.len()
        );
        Ok(TaskOutcome::Completed(certificate))
    }

    async fn build_session(
        &self,
        task: &Task,
        ctx: BlockContext,
    ) -> AggregatorResult<ConsensusSession> {
        let avs = self.avs(&task.avs_address)?;
        let peers = self
            .directory
            .get_operator_peers(
                &task.avs_address,
                task.operator_set_id,
                task.reference_timestamp,
            )
            .await?;
        let signature = avs.signer.sign(&task_payload_digest(task))?;

        Ok(ConsensusSession::new(
            task.clone(),
            signature,
            avs.signer.public_key(),
            &peers,
            Arc::clone(&avs.scheme),
            Arc::clone(&self.transport),
            ctx,
        )?)
    }

    fn fail(&self, task_id: &TaskId, reason: String) -> AggregatorResult<TaskOutcome> {
        self.store.update_task_status(task_id, TaskStatus::Failed)?;
        warn!(task_id = %task_id, "[runtime] Task failed: {}", reason);
        Ok(TaskOutcome::Failed(reason))
    }

    // =========================================================================
    // Blocks and reorgs
    // =========================================================================

    /// Record a new block for `avs_address`, handling reorgs and retention.
    pub fn handle_block(
        &self,
        avs_address: &str,
        block: &BlockRecord,
    ) -> AggregatorResult<BlockOutcome> {
        let avs = self.avs(avs_address)?;
        let manager = self.manager_for(avs, block.chain_id)?;
        let chain_id = block.chain_id;
        let mut outcome = BlockOutcome::default();

        match self.stored_block(avs_address, chain_id, block.number)? {
            Some(existing) if existing.hash == block.hash => {
                outcome.duplicate = true;
                return Ok(outcome);
            }
            Some(_) => {
                // this height and everything above it belong to the replaced fork
                let last = self.store.get_last_processed_block(avs_address, chain_id)?;
                for number in (block.number..=last.number).rev() {
                    self.discard_block(avs_address, chain_id, number, manager, &mut outcome)?;
                }
            }
            None => {}
        }

        if let Some(parent_number) = block.number.checked_sub(1) {
            if let Some(parent) = self.stored_block(avs_address, chain_id, parent_number)? {
                if parent.hash != block.parent_hash {
                    self.discard_block(avs_address, chain_id, parent_number, manager, &mut outcome)?;
                }
            }
        }

        self.store.save_block(avs_address, block)?;

        if block.number >= self.block_retention {
            let cutoff = block.number + 1 - self.block_retention;
            outcome.pruned = self.store.prune_blocks_before(avs_address, chain_id, cutoff)?;
        }
        if !outcome.reorged.is_empty() {
            warn!(
                "[runtime] Reorg on chain {} for AVS {}: discarded blocks {:?}",
                chain_id, avs_address, outcome.reorged
            );
        }
        Ok(outcome)
    }

    fn stored_block(
        &self,
        avs_address: &str,
        chain_id: ChainId,
        number: u64,
    ) -> AggregatorResult<Option<BlockRecord>> {
        match self.store.get_block(avs_address, chain_id, number) {
            Ok(block) => Ok(Some(block)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn discard_block(
        &self,
        avs_address: &str,
        chain_id: ChainId,
        number: u64,
        manager: &BlockContextManager,
        outcome: &mut BlockOutcome,
    ) -> AggregatorResult<()> {
        let deleted = match self.store.delete_block(avs_address, chain_id, number) {
            Ok(()) => true,
            Err(e) if e.is_not_found() => false,
            Err(e) => return Err(e.into()),
        };
        let cancelled = manager.cancel_block(number);
        if deleted || cancelled {
            outcome.reorged.push(number);
        }
        Ok(())
    }

    // =========================================================================
    // Recovery and event loop
    // =========================================================================

    /// Fail tasks stranded in `processing` and return pending tasks to resume.
    pub fn recover(&self) -> AggregatorResult<Vec<Task>> {
        let stranded = self.store.list_tasks_with_status(TaskStatus::Processing)?;
        for record in &stranded {
            self.store
                .update_task_status(record.task_id(), TaskStatus::Failed)?;
            warn!(
                task_id = %record.task_id(),
                "[runtime] Task was processing at shutdown, marked failed"
            );
        }

        let mut pending = Vec::new();
        for avs in self.avs.values() {
            let records = self.store.list_pending_tasks_for_avs(&avs.config.address)?;
            pending.extend(records.into_iter().map(|record| record.task));
        }
        info!(
            "[runtime] Recovery: {} stranded tasks failed, {} pending tasks resumed",
            stranded.len(),
            pending.len()
        );
        Ok(pending)
    }

    /// Consume chain events until `shutdown` fires or the stream ends.
    ///
    /// On shutdown every block context is cancelled, so in-flight sessions
    /// end as failed. When the stream ends, in-flight tasks are awaited
    /// normally until they finish or `shutdown` fires. The store is closed on
    /// return.
    pub async fn run(
        self: Arc<Self>,
        mut events: mpsc::Receiver<ChainEvent>,
        shutdown: CancellationToken,
    ) -> AggregatorResult<()> {
        let sweepers: Vec<JoinHandle<()>> =
            self.contexts.values().map(|m| m.spawn_sweeper()).collect();
        let mut in_flight = JoinSet::new();

        for task in self.recover()? {
            match self.context_for(&task) {
                Ok(ctx) => self.spawn_execute(&mut in_flight, task, ctx),
                Err(e) => error!(task_id = %task.task_id, "[runtime] Cannot resume task: {}", e),
            }
        }

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("[runtime] Shutdown requested, cancelling {} in-flight tasks", in_flight.len());
                    self.root.cancel();
                    break;
                }
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(e) = joined {
                        error!("[runtime] Task worker aborted: {}", e);
                    }
                }
                event = events.recv() => match event {
                    Some(ChainEvent::TaskCreated(task)) => match self.admit_task(&task) {
                        Ok(Some(ctx)) => self.spawn_execute(&mut in_flight, task, ctx),
                        Ok(None) => {}
                        Err(e) => error!(task_id = %task.task_id, "[runtime] Task rejected: {}", e),
                    },
                    Some(ChainEvent::NewBlock { avs, block }) => {
                        if let Err(e) = self.handle_block(&avs, &block) {
                            error!(block = block.number, "[runtime] Block handling failed: {}", e);
                        }
                    }
                    None => {
                        info!("[runtime] Event stream closed, draining {} tasks", in_flight.len());
                        break;
                    }
                },
            }
        }

        // a shutdown during the drain still ends every open session
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled(), if !self.root.is_cancelled() => {
                    info!("[runtime] Shutdown requested while draining {} tasks", in_flight.len());
                    self.root.cancel();
                }
                joined = in_flight.join_next() => match joined {
                    Some(Err(e)) => error!("[runtime] Task worker aborted: {}", e),
                    Some(Ok(())) => {}
                    None => break,
                },
            }
        }
        self.root.cancel();
        for sweeper in sweepers {
            let _ = sweeper.await;
        }
        self.store.close()?;
        info!("[runtime] Aggregator stopped");
        Ok(())
    }

    fn spawn_execute(self: &Arc<Self>, in_flight: &mut JoinSet<()>, task: Task, ctx: BlockContext) {
        let this = Arc::clone(self);
        in_flight.spawn(async move {
            let task_id = task.task_id.clone();
            if let Err(e) = this.execute(task, ctx).await {
                error!(task_id = %task_id, "[runtime] Task pipeline error: {}", e);
            }
        });
    }
}
