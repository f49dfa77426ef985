//! # Error Types
//!
//! Validation errors raised by the shared entities themselves.

use thiserror::Error;

/// Errors produced when an entity fails its own invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntityError {
    /// Chain id 0 is reserved and never identifies a real chain.
    #[error("Invalid chain id: {0}")]
    InvalidChainId(u64),

    /// Threshold must be within (0, 10000] basis points.
    #[error("Invalid threshold: {bips} bips, must be within (0, {max}]")]
    InvalidThreshold { bips: u16, max: u16 },
}
