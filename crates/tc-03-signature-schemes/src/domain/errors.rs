//! # Signature Errors

use shared_types::{format_address, Address};
use thiserror::Error;

/// Errors raised while signing, verifying or aggregating.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignatureError {
    /// Signature bytes have the wrong length or encoding.
    #[error("Invalid signature format: {0}")]
    InvalidFormat(String),

    /// Public key bytes do not decode for this curve.
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    /// Secret key material is unusable.
    #[error("Invalid secret key")]
    InvalidSecretKey,

    /// The signature does not match the message and key.
    #[error("Signature verification failed")]
    VerificationFailed,

    /// High-S ECDSA signature.
    #[error("Malleable signature (high S value)")]
    MalleableSignature,

    /// v must be 0, 1, 27 or 28.
    #[error("Invalid recovery ID: {0}")]
    InvalidRecoveryId(u8),

    #[error("Failed to recover public key")]
    RecoveryFailed,

    /// Recovered signer differs from the expected address.
    #[error("Signer mismatch: expected {}, got {}", format_address(.expected), format_address(.actual))]
    SignerMismatch { expected: Address, actual: Address },

    #[error("Cannot aggregate empty signature list")]
    EmptyAggregation,

    /// Aggregation math failed (e.g. point not in group).
    #[error("Aggregation failed: {0}")]
    AggregationFailed(String),
}

pub type SignatureResult<T> = Result<T, SignatureError>;
