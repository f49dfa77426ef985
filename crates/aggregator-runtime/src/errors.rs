//! # Runtime Errors

use crate::config::ConfigError;
use shared_types::EntityError;
use tc_01_state_store::StoreError;
use tc_03_signature_schemes::SignatureError;
use tc_04_consensus_session::{ConsensusError, DirectoryError};
use thiserror::Error;

/// Errors surfaced by the aggregator pipeline.
#[derive(Debug, Error)]
pub enum AggregatorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Entity(#[from] EntityError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Consensus error: {0}")]
    Consensus(#[from] ConsensusError),

    #[error("Signing error: {0}")]
    Signature(#[from] SignatureError),

    #[error("Operator directory error: {0}")]
    Directory(#[from] DirectoryError),

    /// The certificate sink refused the certificate.
    #[error("Certificate sink error: {0}")]
    Sink(String),

    #[error("AVS {0} is not configured")]
    UnknownAvs(String),

    #[error("Chain {chain_id} is not configured for AVS {avs}")]
    UnknownChain { avs: String, chain_id: u64 },

    #[error("Invalid signing key for AVS {avs}: {reason}")]
    InvalidSigningKey { avs: String, reason: String },

    #[error("Logging init failed: {0}")]
    Logging(String),
}

pub type AggregatorResult<T> = Result<T, AggregatorError>;
