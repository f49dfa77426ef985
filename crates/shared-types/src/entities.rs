//! # Core Domain Entities
//!
//! Defines the entities observed on chain and carried through the engine.
//!
//! ## Clusters
//!
//! - **Tasks**: `TaskId`, `Task`
//! - **Chain**: `ChainId`, `BlockRecord`
//! - **Signing**: `CurveType`

use crate::errors::EntityError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

// =============================================================================
// PRIMITIVES
// =============================================================================

/// A 32-byte hash (keccak256 throughout this workspace).
pub type Hash = [u8; 32];

/// A 20-byte Ethereum-style address.
pub type Address = [u8; 20];

/// Basis-point denominator: 10000 bips is 100% of stake weight.
pub const BIPS_DENOMINATOR: u16 = 10_000;

/// Current unix timestamp in seconds.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Compare two AVS addresses the way the chain does: case-insensitively.
pub fn avs_matches(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// Canonical (lowercase) form of an AVS address, used for storage keys.
pub fn normalize_avs(address: &str) -> String {
    address.to_ascii_lowercase()
}

/// Render an operator address as `0x`-prefixed hex.
pub fn format_address(address: &Address) -> String {
    format!("0x{}", hex::encode(address))
}

// =============================================================================
// CLUSTER A: TASKS
// =============================================================================

/// Unique identifier of a task, as emitted by the task mailbox contract.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A task observed on chain and handed to the engine by the chain poller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Task {
    pub task_id: TaskId,
    /// AVS on whose behalf the task was created (hex string, any case).
    pub avs_address: String,
    pub operator_set_id: u32,
    pub chain_id: ChainId,
    /// Block in which the task-creation event was observed.
    pub source_block_number: u64,
    /// Hash of the source block, used to tie the task to a fork.
    pub source_block_hash: Hash,
    /// Block timestamp used to resolve the operator set.
    pub reference_timestamp: u64,
    /// Opaque task input forwarded to operators.
    pub payload: Vec<u8>,
    /// Required fraction of operator-set stake, in basis points.
    pub threshold_bips: u16,
    /// Absolute deadline (unix seconds); `None` means bounded only by cancellation.
    pub deadline_unix_seconds: Option<u64>,
    pub callback_addr: String,
}

impl Task {
    /// Check the threshold invariant: `0 < threshold_bips <= 10000`.
    pub fn validate_threshold(&self) -> Result<(), EntityError> {
        if self.threshold_bips == 0 || self.threshold_bips > BIPS_DENOMINATOR {
            return Err(EntityError::InvalidThreshold {
                bips: self.threshold_bips,
                max: BIPS_DENOMINATOR,
            });
        }
        Ok(())
    }

    /// Whether this task belongs to the given AVS (case-insensitive).
    pub fn belongs_to(&self, avs_address: &str) -> bool {
        avs_matches(&self.avs_address, avs_address)
    }

    /// Whether the deadline has already passed at `now` (unix seconds).
    pub fn is_expired_at(&self, now: u64) -> bool {
        matches!(self.deadline_unix_seconds, Some(deadline) if deadline <= now)
    }
}

// =============================================================================
// CLUSTER B: CHAIN
// =============================================================================

/// EVM chain identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct ChainId(pub u64);

impl ChainId {
    /// Chain id 0 is never a valid chain.
    pub fn validate(self) -> Result<Self, EntityError> {
        if self.0 == 0 {
            return Err(EntityError::InvalidChainId(self.0));
        }
        Ok(self)
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A processed block, kept per AVS as the reorg-detection ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BlockRecord {
    pub chain_id: ChainId,
    pub number: u64,
    pub hash: Hash,
    pub parent_hash: Hash,
    pub timestamp: u64,
}

impl BlockRecord {
    /// Whether `child` builds directly on top of this block.
    pub fn is_parent_of(&self, child: &BlockRecord) -> bool {
        self.chain_id == child.chain_id
            && self.number + 1 == child.number
            && self.hash == child.parent_hash
    }
}

// =============================================================================
// CLUSTER C: SIGNING
// =============================================================================

/// Signature curve configured for an AVS operator set.
///
/// Curve-A aggregates into a single signature; curve-B keeps per-signer
/// signatures. Session semantics are identical for both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveType {
    /// BLS12-381 aggregate signatures.
    Bls12381,
    /// secp256k1 ECDSA signatures, one per signer.
    Ecdsa,
}

impl fmt::Display for CurveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CurveType::Bls12381 => f.write_str("bls12381"),
            CurveType::Ecdsa => f.write_str("ecdsa"),
        }
    }
}

impl std::str::FromStr for CurveType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bls12381" | "bls" | "bn254" => Ok(CurveType::Bls12381),
            "ecdsa" | "secp256k1" => Ok(CurveType::Ecdsa),
            other => Err(format!("unknown curve type: {other}")),
        }
    }
}
