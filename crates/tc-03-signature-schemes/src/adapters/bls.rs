//! # BLS12-381 Scheme
//!
//! `min_sig` variant: signatures on G1 (48 bytes), public keys on G2
//! (96 bytes). Every signer in a session signs the same message, so the
//! aggregate is checked with one pairing against the aggregated key.

use crate::domain::digest::keccak256;
use crate::domain::errors::{SignatureError, SignatureResult};
use crate::domain::types::{
    AggregateSignature, BlsPublicKey, BlsSignature, PublicKeyBytes, SignatureBytes, SignatureShare,
};
use crate::ports::inbound::{SignatureScheme, TaskSigner};
use blst::min_sig::{
    AggregatePublicKey, AggregateSignature as BlstAggregate, PublicKey, SecretKey, Signature,
};
use blst::BLST_ERROR;
use shared_types::CurveType;

/// Domain Separation Tag for `min_sig` signatures: hash-to-G1 under the
/// proof-of-possession ciphersuite.
pub const DST: &[u8] = b"BLS_SIG_BLS12381G1_XMD:SHA-256_SSWU_RO_POP_";

fn parse_public_key(public_key: &PublicKeyBytes) -> SignatureResult<PublicKey> {
    let typed = BlsPublicKey::try_from(public_key)?;
    PublicKey::key_validate(&typed.bytes)
        .map_err(|e| SignatureError::InvalidPublicKey(format!("{e:?}")))
}

fn parse_signature(signature: &SignatureBytes) -> SignatureResult<Signature> {
    let typed = BlsSignature::try_from(signature)?;
    Signature::from_bytes(&typed.bytes).map_err(|e| SignatureError::InvalidFormat(format!("{e:?}")))
}

#[derive(Debug, Default, Clone, Copy)]
pub struct BlsScheme;

impl SignatureScheme for BlsScheme {
    fn curve(&self) -> CurveType {
        CurveType::Bls12381
    }

    fn validate_public_key(&self, public_key: &PublicKeyBytes) -> SignatureResult<()> {
        parse_public_key(public_key).map(|_| ())
    }

    fn verify(
        &self,
        message: &[u8],
        signature: &SignatureBytes,
        public_key: &PublicKeyBytes,
    ) -> SignatureResult<()> {
        let pk = parse_public_key(public_key)?;
        let sig = parse_signature(signature)?;
        match sig.verify(true, message, DST, &[], &pk, false) {
            BLST_ERROR::BLST_SUCCESS => Ok(()),
            _ => Err(SignatureError::VerificationFailed),
        }
    }

    fn aggregate_and_verify(
        &self,
        message: &[u8],
        shares: &[SignatureShare],
    ) -> SignatureResult<AggregateSignature> {
        if shares.is_empty() {
            return Err(SignatureError::EmptyAggregation);
        }

        let sigs = shares
            .iter()
            .map(|share| parse_signature(&share.signature))
            .collect::<SignatureResult<Vec<_>>>()?;
        let pks = shares
            .iter()
            .map(|share| parse_public_key(&share.public_key))
            .collect::<SignatureResult<Vec<_>>>()?;

        let sig_refs: Vec<&Signature> = sigs.iter().collect();
        let pk_refs: Vec<&PublicKey> = pks.iter().collect();

        let aggregate = BlstAggregate::aggregate(&sig_refs, true)
            .map_err(|e| SignatureError::AggregationFailed(format!("{e:?}")))?
            .to_signature();
        let aggregate_pk = AggregatePublicKey::aggregate(&pk_refs, false)
            .map_err(|e| SignatureError::AggregationFailed(format!("{e:?}")))?
            .to_public_key();

        if aggregate.verify(false, message, DST, &[], &aggregate_pk, false)
            != BLST_ERROR::BLST_SUCCESS
        {
            return Err(SignatureError::VerificationFailed);
        }

        Ok(AggregateSignature::Bls12381 {
            signature: BlsSignature {
                bytes: aggregate.to_bytes(),
            },
            aggregate_public_key: BlsPublicKey {
                bytes: aggregate_pk.to_bytes(),
            },
            signer_count: shares.len(),
        })
    }
}

/// BLS secret key.
pub struct BlsSigner {
    secret: SecretKey,
    public: PublicKey,
}

impl BlsSigner {
    /// Derive a key from at least 32 bytes of input keying material.
    pub fn from_ikm(ikm: &[u8]) -> SignatureResult<Self> {
        let secret = SecretKey::key_gen(ikm, &[]).map_err(|_| SignatureError::InvalidSecretKey)?;
        Ok(Self::from_secret(secret))
    }

    /// Load a serialized 32-byte secret scalar.
    pub fn from_secret_bytes(bytes: &[u8]) -> SignatureResult<Self> {
        let secret = SecretKey::from_bytes(bytes).map_err(|_| SignatureError::InvalidSecretKey)?;
        Ok(Self::from_secret(secret))
    }

    /// Deterministic key from an arbitrary seed.
    pub fn from_seed(seed: &[u8]) -> SignatureResult<Self> {
        Self::from_ikm(&keccak256(seed))
    }

    fn from_secret(secret: SecretKey) -> Self {
        let public = secret.sk_to_pk();
        Self { secret, public }
    }

    pub fn secret_bytes(&self) -> [u8; 32] {
        self.secret.to_bytes()
    }
}

impl TaskSigner for BlsSigner {
    fn curve(&self) -> CurveType {
        CurveType::Bls12381
    }

    fn public_key(&self) -> PublicKeyBytes {
        PublicKeyBytes(self.public.to_bytes().to_vec())
    }

    fn sign(&self, message: &[u8]) -> SignatureResult<SignatureBytes> {
        Ok(SignatureBytes(
            self.secret.sign(message, DST, &[]).to_bytes().to_vec(),
        ))
    }
}
