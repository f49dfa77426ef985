//! # Certificate

use serde::{Deserialize, Serialize};
use shared_types::{Address, CurveType, Hash, TaskId};
use tc_03_signature_schemes::AggregateSignature;
use uuid::Uuid;

/// Proof that stake-weighted consensus was reached on a task's response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    pub task_id: TaskId,
    pub session_id: Uuid,
    pub response_digest: Hash,
    pub response: Vec<u8>,
    /// Sorted by address.
    pub signers: Vec<Address>,
    /// Members that did not contribute, sorted by address.
    pub non_signers: Vec<Address>,
    pub signed_weight: u128,
    pub total_weight: u128,
    pub threshold_bips: u16,
    pub curve: CurveType,
    pub aggregate: AggregateSignature,
}
