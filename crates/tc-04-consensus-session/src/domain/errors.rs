//! # Session Errors

use shared_types::{format_address, Address, CurveType};
use tc_02_block_context::ContextError;
use tc_03_signature_schemes::SignatureError;
use thiserror::Error;

/// Errors from building or running a consensus session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsensusError {
    /// No peers were supplied, or the resolved set carries no weight.
    #[error("Operator set {operator_set_id} is empty")]
    EmptyOperatorSet { operator_set_id: u32 },

    /// No supplied peer is a member of the requested set.
    #[error("Operator set {operator_set_id} not found among supplied peers")]
    UnknownOperatorSet { operator_set_id: u32 },

    #[error("Invalid threshold: {0} bips, must be within (0, 10000]")]
    InvalidThreshold(u16),

    /// A member is registered on a different curve than the session scheme.
    #[error("Operator {} uses curve {actual}, session expects {expected}", format_address(.operator))]
    CurveMismatch {
        operator: Address,
        expected: CurveType,
        actual: CurveType,
    },

    /// A member's public key does not decode for the session curve.
    #[error("Operator {} has an invalid public key: {reason}", format_address(.operator))]
    InvalidOperatorKey { operator: Address, reason: String },

    #[error("Session already processed")]
    AlreadyProcessed,

    /// The task deadline passed before the threshold was met.
    #[error("Deadline exceeded before threshold was met")]
    DeadlineExceeded,

    /// The block context was cancelled (reorg or shutdown).
    #[error("Session cancelled")]
    Cancelled,

    /// Threshold was met but the shares did not aggregate.
    #[error("Aggregation failed: {0}")]
    Aggregation(#[from] SignatureError),
}

impl From<ContextError> for ConsensusError {
    fn from(err: ContextError) -> Self {
        match err {
            ContextError::Cancelled => ConsensusError::Cancelled,
            ContextError::DeadlineExceeded => ConsensusError::DeadlineExceeded,
        }
    }
}

impl ConsensusError {
    /// Whether the session ended because its context ended.
    pub fn is_context_ended(&self) -> bool {
        matches!(self, ConsensusError::DeadlineExceeded | ConsensusError::Cancelled)
    }
}

pub type ConsensusResult<T> = Result<T, ConsensusError>;
