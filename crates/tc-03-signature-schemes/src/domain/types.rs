//! # Signature Types
//!
//! Curve-agnostic byte carriers cross the port boundary; the fixed-size
//! curve types live behind them.

use crate::domain::errors::SignatureError;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use shared_types::{Address, CurveType};
use std::fmt;

/// Encoded public key as carried in operator-set membership.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct PublicKeyBytes(pub Vec<u8>);

impl PublicKeyBytes {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for PublicKeyBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0))
    }
}

impl From<Address> for PublicKeyBytes {
    fn from(address: Address) -> Self {
        Self(address.to_vec())
    }
}

/// Encoded signature as returned by an operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SignatureBytes(pub Vec<u8>);

impl SignatureBytes {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// One operator's contribution to an aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureShare {
    pub signer: Address,
    pub public_key: PublicKeyBytes,
    pub signature: SignatureBytes,
}

// =============================================================================
// BLS Types (BLS12-381, min_sig)
// =============================================================================

/// BLS signature (G1 point, compressed).
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlsSignature {
    #[serde_as(as = "Bytes")]
    pub bytes: [u8; 48],
}

/// BLS public key (G2 point, compressed).
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlsPublicKey {
    #[serde_as(as = "Bytes")]
    pub bytes: [u8; 96],
}

impl TryFrom<&SignatureBytes> for BlsSignature {
    type Error = SignatureError;

    fn try_from(value: &SignatureBytes) -> Result<Self, Self::Error> {
        let bytes: [u8; 48] = value.as_bytes().try_into().map_err(|_| {
            SignatureError::InvalidFormat(format!(
                "BLS signature must be 48 bytes, got {}",
                value.0.len()
            ))
        })?;
        Ok(Self { bytes })
    }
}

impl TryFrom<&PublicKeyBytes> for BlsPublicKey {
    type Error = SignatureError;

    fn try_from(value: &PublicKeyBytes) -> Result<Self, Self::Error> {
        let bytes: [u8; 96] = value.as_bytes().try_into().map_err(|_| {
            SignatureError::InvalidPublicKey(format!(
                "BLS public key must be 96 bytes, got {}",
                value.0.len()
            ))
        })?;
        Ok(Self { bytes })
    }
}

// =============================================================================
// ECDSA Types (secp256k1)
// =============================================================================

/// Recoverable ECDSA signature, `r || s || v`.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcdsaSignature {
    #[serde_as(as = "Bytes")]
    pub bytes: [u8; 65],
}

impl EcdsaSignature {
    pub fn r(&self) -> &[u8] {
        &self.bytes[..32]
    }

    pub fn s(&self) -> &[u8] {
        &self.bytes[32..64]
    }

    pub fn v(&self) -> u8 {
        self.bytes[64]
    }
}

impl TryFrom<&SignatureBytes> for EcdsaSignature {
    type Error = SignatureError;

    fn try_from(value: &SignatureBytes) -> Result<Self, Self::Error> {
        let bytes: [u8; 65] = value.as_bytes().try_into().map_err(|_| {
            SignatureError::InvalidFormat(format!(
                "ECDSA signature must be 65 bytes, got {}",
                value.0.len()
            ))
        })?;
        Ok(Self { bytes })
    }
}

/// A verified ECDSA signature attributed to its signer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcdsaShare {
    pub signer: Address,
    pub signature: EcdsaSignature,
}

// =============================================================================
// Aggregate
// =============================================================================

/// The combined proof carried in a certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateSignature {
    Bls12381 {
        signature: BlsSignature,
        aggregate_public_key: BlsPublicKey,
        signer_count: usize,
    },
    /// Sorted by signer address.
    Ecdsa { signatures: Vec<EcdsaShare> },
}

impl AggregateSignature {
    pub fn curve(&self) -> CurveType {
        match self {
            AggregateSignature::Bls12381 { .. } => CurveType::Bls12381,
            AggregateSignature::Ecdsa { .. } => CurveType::Ecdsa,
        }
    }

    pub fn signer_count(&self) -> usize {
        match self {
            AggregateSignature::Bls12381 { signer_count, .. } => *signer_count,
            AggregateSignature::Ecdsa { signatures } => signatures.len(),
        }
    }
}
