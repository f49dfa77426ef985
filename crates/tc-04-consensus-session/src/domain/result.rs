//! # Submissions and Results

use serde::{Deserialize, Serialize};
use shared_types::{format_address, Address, Hash, Task, TaskId};
use std::fmt;
use tc_03_signature_schemes::{PublicKeyBytes, SignatureBytes};

/// What the aggregator sends to every operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSubmission {
    pub task: Task,
    /// `task_payload_digest(task)`.
    pub task_digest: Hash,
    /// Aggregator signature over `task_digest`, authorizing the broadcast.
    pub aggregator_signature: SignatureBytes,
    pub aggregator_public_key: PublicKeyBytes,
}

/// An operator's signed response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResult {
    pub task_id: TaskId,
    pub operator_address: Address,
    pub output: Vec<u8>,
    /// Must equal `keccak256(output)`.
    pub output_digest: Hash,
    /// Signature over `result_signing_message(task_id, output_digest)`.
    pub signature: SignatureBytes,
}

/// Why a result was not merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    WrongTask { expected: TaskId, actual: TaskId },
    UnknownOperator(Address),
    Duplicate(Address),
    DigestMismatch,
    /// Disagrees with the response the session already pinned.
    ResponseMismatch,
    InvalidSignature(String),
    /// The session already resolved.
    SessionClosed,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::WrongTask { expected, actual } => {
                write!(f, "result for task {actual}, expected {expected}")
            }
            RejectReason::UnknownOperator(a) => {
                write!(f, "operator {} not in set", format_address(a))
            }
            RejectReason::Duplicate(a) => write!(f, "duplicate result from {}", format_address(a)),
            RejectReason::DigestMismatch => f.write_str("output digest does not match output"),
            RejectReason::ResponseMismatch => f.write_str("response differs from pinned response"),
            RejectReason::InvalidSignature(e) => write!(f, "invalid signature: {e}"),
            RejectReason::SessionClosed => f.write_str("session already resolved"),
        }
    }
}

/// Outcome of `ConsensusSession::record_result`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Accepted {
        signed_weight: u128,
        threshold_met: bool,
    },
    Rejected(RejectReason),
}

impl RecordOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, RecordOutcome::Accepted { .. })
    }
}
