//! # Inbound Ports
//!
//! The API the aggregator runtime uses to persist tasks and blocks.
//!
//! Every method is safe to call from many threads at once. Callers observe a
//! single linear history per task id: a status change that loses a race sees
//! the winner's status and fails with `InvalidTaskStatus`.

use crate::domain::errors::StoreResult;
use shared_types::{BlockRecord, ChainId, Task, TaskId, TaskRecord, TaskStatus};

/// Persistent state store.
pub trait StateStore: Send + Sync {
    /// Record a newly observed task with status `pending`.
    ///
    /// A second save under the same id fails with `AlreadyExists` and leaves
    /// the stored record untouched.
    fn save_pending_task(&self, task: &Task) -> StoreResult<()>;

    /// Fetch a task record by id.
    fn get_task(&self, task_id: &TaskId) -> StoreResult<TaskRecord>;

    /// All records currently in `status`.
    fn list_tasks_with_status(&self, status: TaskStatus) -> StoreResult<Vec<TaskRecord>>;

    /// All records currently in `pending`.
    fn list_pending_tasks(&self) -> StoreResult<Vec<TaskRecord>> {
        self.list_tasks_with_status(TaskStatus::Pending)
    }

    /// Pending records whose AVS matches `avs_address` (case-insensitive).
    fn list_pending_tasks_for_avs(&self, avs_address: &str) -> StoreResult<Vec<TaskRecord>> {
        Ok(self
            .list_pending_tasks()?
            .into_iter()
            .filter(|record| record.task.belongs_to(avs_address))
            .collect())
    }

    /// Move a task to `status`, returning the updated record.
    ///
    /// Fails with `NotFound` for unknown ids and `InvalidTaskStatus` when the
    /// status machine forbids the edge.
    fn update_task_status(&self, task_id: &TaskId, status: TaskStatus) -> StoreResult<TaskRecord>;

    /// Remove a task record.
    fn delete_task(&self, task_id: &TaskId) -> StoreResult<()>;

    /// Record a processed block for `avs_address`, replacing any record at the
    /// same number.
    fn save_block(&self, avs_address: &str, block: &BlockRecord) -> StoreResult<()>;

    fn get_block(&self, avs_address: &str, chain_id: ChainId, number: u64)
        -> StoreResult<BlockRecord>;

    fn delete_block(&self, avs_address: &str, chain_id: ChainId, number: u64) -> StoreResult<()>;

    /// Highest-numbered block stored for the pair.
    fn get_last_processed_block(&self, avs_address: &str, chain_id: ChainId)
        -> StoreResult<BlockRecord>;

    /// Delete all blocks of the pair numbered below `number`. Returns the
    /// number of records removed.
    fn prune_blocks_before(
        &self,
        avs_address: &str,
        chain_id: ChainId,
        number: u64,
    ) -> StoreResult<usize>;

    /// Release resources. Subsequent calls other than `close` fail with
    /// `StoreClosed`.
    fn close(&self) -> StoreResult<()>;
}
