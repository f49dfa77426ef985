//! # Adapters Layer
//!
//! - `bls` - BLS12-381 via `blst`
//! - `ecdsa` - secp256k1 via `k256`

pub mod bls;
pub mod ecdsa;

use crate::domain::errors::SignatureResult;
use crate::ports::inbound::{SignatureScheme, TaskSigner};
use bls::{BlsScheme, BlsSigner};
use ecdsa::{EcdsaScheme, EcdsaSigner};
use shared_types::CurveType;
use std::sync::Arc;

/// The scheme for an AVS's configured curve.
pub fn scheme_for(curve: CurveType) -> Arc<dyn SignatureScheme> {
    match curve {
        CurveType::Bls12381 => Arc::new(BlsScheme),
        CurveType::Ecdsa => Arc::new(EcdsaScheme),
    }
}

/// Load a signer from raw secret key bytes.
pub fn signer_from_secret(curve: CurveType, secret: &[u8]) -> SignatureResult<Arc<dyn TaskSigner>> {
    Ok(match curve {
        CurveType::Bls12381 => Arc::new(BlsSigner::from_secret_bytes(secret)?),
        CurveType::Ecdsa => Arc::new(EcdsaSigner::from_secret_bytes(secret)?),
    })
}

/// Deterministic signer derived from `seed`.
pub fn signer_from_seed(curve: CurveType, seed: &[u8]) -> SignatureResult<Arc<dyn TaskSigner>> {
    Ok(match curve {
        CurveType::Bls12381 => Arc::new(BlsSigner::from_seed(seed)?),
        CurveType::Ecdsa => Arc::new(EcdsaSigner::from_seed(seed)?),
    })
}
