//! # Domain Errors

use thiserror::Error;

/// Why a block context is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ContextError {
    /// The block was cancelled (reorg) or the process is shutting down.
    #[error("context cancelled")]
    Cancelled,

    /// The task deadline passed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

pub type ContextResult<T> = Result<T, ContextError>;
