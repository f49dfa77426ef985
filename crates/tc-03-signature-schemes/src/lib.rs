//! # Signature Schemes (tc-03)
//!
//! The opaque signing capability used by consensus sessions. A session picks
//! one [`SignatureScheme`] from the AVS curve type at construction and never
//! branches on the curve again.
//!
//! | Curve | Signature | Public key | Aggregate |
//! |-------|-----------|------------|-----------|
//! | BLS12-381 (`min_sig`) | 48-byte G1 | 96-byte G2 | one signature + aggregated key |
//! | secp256k1 ECDSA | 65-byte `r‖s‖v` | 20-byte address | signer-sorted list |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Byte carriers, digests, errors
//! - `ports/` - `SignatureScheme` and `TaskSigner`
//! - `adapters/` - `blst` and `k256` implementations

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::bls::{BlsScheme, BlsSigner};
pub use adapters::ecdsa::{EcdsaScheme, EcdsaSigner};
pub use adapters::{scheme_for, signer_from_secret, signer_from_seed};
pub use domain::digest::{keccak256, result_signing_message, task_payload_digest};
pub use domain::errors::{SignatureError, SignatureResult};
pub use domain::types::{
    AggregateSignature, BlsPublicKey, BlsSignature, EcdsaShare, EcdsaSignature, PublicKeyBytes,
    SignatureBytes, SignatureShare,
};
pub use ports::inbound::{SignatureScheme, TaskSigner};
