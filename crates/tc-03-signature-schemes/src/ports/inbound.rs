//! # Inbound Ports
//!
//! `SignatureScheme` verifies and combines; `TaskSigner` holds a secret key.

use crate::domain::errors::SignatureResult;
use crate::domain::types::{AggregateSignature, PublicKeyBytes, SignatureBytes, SignatureShare};
use shared_types::CurveType;

/// Verification and aggregation for one curve.
pub trait SignatureScheme: Send + Sync + std::fmt::Debug {
    fn curve(&self) -> CurveType;

    /// Check that `public_key` decodes for this curve.
    fn validate_public_key(&self, public_key: &PublicKeyBytes) -> SignatureResult<()>;

    /// Verify one signature over `message`.
    fn verify(
        &self,
        message: &[u8],
        signature: &SignatureBytes,
        public_key: &PublicKeyBytes,
    ) -> SignatureResult<()>;

    /// Combine shares that all signed `message` and verify the combination.
    fn aggregate_and_verify(
        &self,
        message: &[u8],
        shares: &[SignatureShare],
    ) -> SignatureResult<AggregateSignature>;
}

/// A signing key for one curve.
pub trait TaskSigner: Send + Sync {
    fn curve(&self) -> CurveType;

    /// Public key in the form operator-set memberships carry.
    fn public_key(&self) -> PublicKeyBytes;

    fn sign(&self, message: &[u8]) -> SignatureResult<SignatureBytes>;
}
