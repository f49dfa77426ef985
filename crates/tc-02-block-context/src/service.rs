//! # Block Context Manager Service
//!
//! Owns the block-number → context map for one chain.

use crate::domain::config::BlockContextConfig;
use crate::domain::context::BlockContext;
use parking_lot::Mutex;
use shared_types::Task;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Tracks one live context per block number.
pub struct BlockContextManager {
    parent: CancellationToken,
    contexts: Mutex<HashMap<u64, BlockContext>>,
    config: BlockContextConfig,
}

impl BlockContextManager {
    /// Create a manager whose contexts all derive from `parent`.
    pub fn new(parent: CancellationToken, config: BlockContextConfig) -> Self {
        Self {
            parent,
            contexts: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Context for `block_number`, creating it from `task`'s deadline if absent.
    ///
    /// An existing context is returned unchanged whatever deadline `task`
    /// carries.
    pub fn get_context(&self, block_number: u64, task: &Task) -> BlockContext {
        let mut contexts = self.contexts.lock();
        if let Some(existing) = contexts.get(&block_number) {
            return existing.clone();
        }

        let ctx =
            BlockContext::with_unix_deadline(&self.parent, block_number, task.deadline_unix_seconds);
        contexts.insert(block_number, ctx.clone());
        debug!(
            task_id = %task.task_id,
            "[tc-02] Created context for block {} (deadline {:?})",
            block_number,
            task.deadline_unix_seconds
        );
        ctx
    }

    /// Cancel and forget the context for `block_number`. Returns whether a
    /// context was tracked.
    pub fn cancel_block(&self, block_number: u64) -> bool {
        let removed = self.contexts.lock().remove(&block_number);
        match removed {
            Some(ctx) => {
                ctx.cancel();
                info!("[tc-02] Cancelled context for block {}", block_number);
                true
            }
            None => false,
        }
    }

    /// Evict every context that is already done. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let mut contexts = self.contexts.lock();
        let before = contexts.len();
        contexts.retain(|_, ctx| !ctx.is_done());
        let evicted = before - contexts.len();
        if evicted > 0 {
            debug!("[tc-02] Swept {} finished block contexts", evicted);
        }
        evicted
    }

    /// Run `sweep` every `sweep_interval` until the parent token is cancelled,
    /// then shut the manager down.
    pub fn spawn_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(manager.config.sweep_interval);
            // the first tick completes immediately
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = manager.parent.cancelled() => {
                        manager.shutdown();
                        break;
                    }
                    _ = ticker.tick() => {
                        manager.sweep();
                    }
                }
            }
        })
    }

    /// Cancel every tracked context and clear the map.
    pub fn shutdown(&self) {
        let drained: Vec<BlockContext> = self.contexts.lock().drain().map(|(_, ctx)| ctx).collect();
        let count = drained.len();
        for ctx in drained {
            ctx.cancel();
        }
        info!("[tc-02] Block context manager shut down ({} contexts cancelled)", count);
    }

    pub fn contains(&self, block_number: u64) -> bool {
        self.contexts.lock().contains_key(&block_number)
    }

    pub fn len(&self) -> usize {
        self.contexts.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.lock().is_empty()
    }

    pub fn parent_token(&self) -> &CancellationToken {
        &self.parent
    }
}
