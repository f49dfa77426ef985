//! # Domain Errors
//!
//! Error types for the state store.
//!
//! Not-found and state-machine violations are always surfaced to the caller;
//! the store never retries or swallows them.

use shared_types::{ChainId, EntityError, TaskId, TaskStatus};
use thiserror::Error;

/// Errors that can occur during state store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No record exists under the requested key.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A pending task with this id was already saved.
    #[error("Task already exists: {0}")]
    AlreadyExists(TaskId),

    /// The store has been closed.
    #[error("State store is closed")]
    StoreClosed,

    /// The requested status change is not an edge of the task status machine.
    #[error("Invalid status transition for task {task_id}: {from} -> {to}")]
    InvalidTaskStatus {
        task_id: TaskId,
        from: TaskStatus,
        to: TaskStatus,
    },

    /// Chain id 0 was supplied for a block operation.
    #[error("Invalid chain id: {0}")]
    InvalidChainId(u64),

    /// Record could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Underlying storage engine failure.
    #[error("Database error: {0}")]
    Database(String),
}

impl StoreError {
    pub fn task_not_found(task_id: &TaskId) -> Self {
        StoreError::NotFound(format!("task {task_id}"))
    }

    pub fn block_not_found(avs_address: &str, chain_id: ChainId, number: u64) -> Self {
        StoreError::NotFound(format!(
            "block {number} on chain {chain_id} for avs {avs_address}"
        ))
    }

    pub fn no_processed_block(avs_address: &str, chain_id: ChainId) -> Self {
        StoreError::NotFound(format!(
            "last processed block on chain {chain_id} for avs {avs_address}"
        ))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

impl From<EntityError> for StoreError {
    fn from(err: EntityError) -> Self {
        match err {
            EntityError::InvalidChainId(id) => StoreError::InvalidChainId(id),
            other => StoreError::Database(other.to_string()),
        }
    }
}

impl From<bincode::Error> for StoreError {
    fn from(err: bincode::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

#[cfg(feature = "rocksdb")]
impl From<rocksdb::Error> for StoreError {
    fn from(err: rocksdb::Error) -> Self {
        StoreError::Database(err.into_string())
    }
}

/// Result type for state store operations.
pub type StoreResult<T> = Result<T, StoreError>;
