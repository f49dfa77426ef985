//! # secp256k1 ECDSA Scheme
//!
//! Operators are identified by their 20-byte keccak address, so verification
//! recovers the signer from the signature and compares addresses. Messages
//! are keccak256-prehashed before signing.
//!
//! High-S signatures are rejected (EIP-2). There is no curve-level
//! aggregation: the aggregate is the signer-sorted list of signatures.

use crate::domain::digest::keccak256;
use crate::domain::errors::{SignatureError, SignatureResult};
use crate::domain::types::{
    AggregateSignature, EcdsaShare, EcdsaSignature, PublicKeyBytes, SignatureBytes, SignatureShare,
};
use crate::ports::inbound::{SignatureScheme, TaskSigner};
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use shared_types::{Address, CurveType};

/// Derive the Ethereum-style address of a verifying key.
pub fn address_from_verifying_key(key: &VerifyingKey) -> Address {
    let encoded = key.to_encoded_point(false);
    // skip the 0x04 tag
    let hash = keccak256(&encoded.as_bytes()[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}

fn parse_address(public_key: &PublicKeyBytes) -> SignatureResult<Address> {
    public_key.as_bytes().try_into().map_err(|_| {
        SignatureError::InvalidPublicKey(format!(
            "ECDSA public key must be a 20-byte address, got {} bytes",
            public_key.0.len()
        ))
    })
}

fn parse_recovery_id(v: u8) -> SignatureResult<RecoveryId> {
    let normalized = match v {
        0 | 1 => v,
        27 | 28 => v - 27,
        other => return Err(SignatureError::InvalidRecoveryId(other)),
    };
    RecoveryId::from_byte(normalized).ok_or(SignatureError::InvalidRecoveryId(v))
}

/// Recover the address that produced `signature` over `message`.
pub fn recover_signer(message: &[u8], signature: &EcdsaSignature) -> SignatureResult<Address> {
    let recovery_id = parse_recovery_id(signature.v())?;
    let sig = Signature::from_slice(&signature.bytes[..64])
        .map_err(|e| SignatureError::InvalidFormat(e.to_string()))?;
    if sig.normalize_s().is_some() {
        return Err(SignatureError::MalleableSignature);
    }

    let prehash = keccak256(message);
    let key = VerifyingKey::recover_from_prehash(&prehash, &sig, recovery_id)
        .map_err(|_| SignatureError::RecoveryFailed)?;
    Ok(address_from_verifying_key(&key))
}

#[derive(Debug, Default, Clone, Copy)]
pub struct EcdsaScheme;

impl EcdsaScheme {
    fn verify_typed(
        message: &[u8],
        signature: &EcdsaSignature,
        public_key: &PublicKeyBytes,
    ) -> SignatureResult<Address> {
        let expected = parse_address(public_key)?;
        let actual = recover_signer(message, signature)?;
        if actual != expected {
            return Err(SignatureError::SignerMismatch { expected, actual });
        }
        Ok(actual)
    }
}

impl SignatureScheme for EcdsaScheme {
    fn curve(&self) -> CurveType {
        CurveType::Ecdsa
    }

    fn validate_public_key(&self, public_key: &PublicKeyBytes) -> SignatureResult<()> {
        parse_address(public_key).map(|_| ())
    }

    fn verify(
        &self,
        message: &[u8],
        signature: &SignatureBytes,
        public_key: &PublicKeyBytes,
    ) -> SignatureResult<()> {
        let typed = EcdsaSignature::try_from(signature)?;
        Self::verify_typed(message, &typed, public_key).map(|_| ())
    }

    fn aggregate_and_verify(
        &self,
        message: &[u8],
        shares: &[SignatureShare],
    ) -> SignatureResult<AggregateSignature> {
        if shares.is_empty() {
            return Err(SignatureError::EmptyAggregation);
        }

        let mut signatures = shares
            .iter()
            .map(|share| {
                let signature = EcdsaSignature::try_from(&share.signature)?;
                Self::verify_typed(message, &signature, &share.public_key)?;
                Ok(EcdsaShare {
                    signer: share.signer,
                    signature,
                })
            })
            .collect::<SignatureResult<Vec<_>>>()?;
        signatures.sort_by(|a, b| a.signer.cmp(&b.signer));

        Ok(AggregateSignature::Ecdsa { signatures })
    }
}

/// secp256k1 secret key.
pub struct EcdsaSigner {
    key: SigningKey,
    address: Address,
}

impl EcdsaSigner {
    /// Load a 32-byte secret scalar.
    pub fn from_secret_bytes(bytes: &[u8]) -> SignatureResult<Self> {
        let key = SigningKey::from_slice(bytes).map_err(|_| SignatureError::InvalidSecretKey)?;
        Ok(Self::from_signing_key(key))
    }

    /// Deterministic key from an arbitrary seed.
    pub fn from_seed(seed: &[u8]) -> SignatureResult<Self> {
        Self::from_secret_bytes(&keccak256(seed))
    }

    pub fn from_signing_key(key: SigningKey) -> Self {
        let address = address_from_verifying_key(key.verifying_key());
        Self { key, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }
}

impl TaskSigner for EcdsaSigner {
    fn curve(&self) -> CurveType {
        CurveType::Ecdsa
    }

    fn public_key(&self) -> PublicKeyBytes {
        PublicKeyBytes::from(self.address)
    }

    fn sign(&self, message: &[u8]) -> SignatureResult<SignatureBytes> {
        let prehash = keccak256(message);
        let (sig, recovery_id) = self
            .key
            .sign_prehash_recoverable(&prehash)
            .map_err(|e| SignatureError::InvalidFormat(e.to_string()))?;

        let mut bytes = Vec::with_capacity(65);
        bytes.extend_from_slice(&sig.to_bytes());
        bytes.push(recovery_id.to_byte());
        Ok(SignatureBytes(bytes))
    }
}
