//! # Hybrid Suites
//!
//! ECDSA composed with one post-quantum family over the same message hash.
//! Verification is conjunctive: the classical sub-signature must recover to
//! the relayer's address AND the post-quantum sub-signature must verify
//! against the registered key. A forgery has to break both algorithms.

use super::ecdsa;
use super::entities::{AlgorithmId, BridgeSignature, HybridSignature};
use super::errors::SignatureError;
use super::registry::{SignatureSuite, SignerBinding, SuiteKeypair};
use super::{mldsa, slhdsa};
use k256::ecdsa::SigningKey;
use shared_types::Hash;
use zeroize::Zeroizing;

/// Byte length of the classical secret scalar at the front of a hybrid
/// secret-key encoding.
const CLASSICAL_SECRET_LEN: usize = 32;

/// Which post-quantum family the classical half is paired with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PqFamily {
    MlDsa,
    SlhDsa,
}

/// Hybrid suite, parameterized over the post-quantum family.
pub struct HybridSuite {
    family: PqFamily,
}

impl HybridSuite {
    /// ECDSA + ML-DSA-65.
    pub fn ml_dsa() -> Self {
        Self {
            family: PqFamily::MlDsa,
        }
    }

    /// ECDSA + SLH-DSA-SHA2-128s.
    pub fn slh_dsa() -> Self {
        Self {
            family: PqFamily::SlhDsa,
        }
    }

    fn split_secret<'a>(
        &self,
        secret_key: &'a [u8],
    ) -> Result<(&'a [u8], &'a [u8]), SignatureError> {
        if secret_key.len() <= CLASSICAL_SECRET_LEN {
            return Err(SignatureError::InvalidFormat);
        }
        Ok(secret_key.split_at(CLASSICAL_SECRET_LEN))
    }
}

impl SignatureSuite for HybridSuite {
    fn algorithm(&self) -> AlgorithmId {
        match self.family {
            PqFamily::MlDsa => AlgorithmId::HybridMlDsa,
            PqFamily::SlhDsa => AlgorithmId::HybridSlhDsa,
        }
    }

    fn generate_keypair(&self) -> Result<SuiteKeypair, SignatureError> {
        let classical = SigningKey::random(&mut rand::thread_rng());
        let address = ecdsa::address_from_pubkey(classical.verifying_key());

        let (pq_public, pq_secret) = match self.family {
            PqFamily::MlDsa => mldsa::generate()?,
            PqFamily::SlhDsa => slhdsa::generate()?,
        };

        let mut secret = Zeroizing::new(Vec::with_capacity(
            CLASSICAL_SECRET_LEN + pq_secret.len(),
        ));
        secret.extend_from_slice(&classical.to_bytes());
        secret.extend_from_slice(&pq_secret);

        Ok(SuiteKeypair {
            algorithm: self.algorithm(),
            address,
            public_key: pq_public,
            secret_key: secret,
        })
    }

    fn sign(
        &self,
        message_hash: &Hash,
        secret_key: &[u8],
    ) -> Result<BridgeSignature, SignatureError> {
        let (classical_sk, pq_sk) = self.split_secret(secret_key)?;
        let signing_key =
            SigningKey::from_slice(classical_sk).map_err(|_| SignatureError::InvalidFormat)?;
        let classical = ecdsa::sign_prehash(message_hash, &signing_key)?;

        let post_quantum = match self.family {
            PqFamily::MlDsa => mldsa::sign(message_hash, pq_sk)?,
            PqFamily::SlhDsa => slhdsa::sign(message_hash, pq_sk)?,
        };

        let sig = HybridSignature {
            classical,
            post_quantum,
        };
        Ok(match self.family {
            PqFamily::MlDsa => BridgeSignature::HybridMlDsa(sig),
            PqFamily::SlhDsa => BridgeSignature::HybridSlhDsa(sig),
        })
    }

    fn verify(
        &self,
        message_hash: &Hash,
        signature: &BridgeSignature,
        binding: &SignerBinding<'_>,
    ) -> Result<(), SignatureError> {
        let sig = match (self.family, signature) {
            (PqFamily::MlDsa, BridgeSignature::HybridMlDsa(sig)) => sig,
            (PqFamily::SlhDsa, BridgeSignature::HybridSlhDsa(sig)) => sig,
            _ => return Err(SignatureError::InvalidFormat),
        };

        // Classical half binds identity through address recovery.
        ecdsa::verify_signer(message_hash, &sig.classical, binding.address)?;

        // Post-quantum half binds through the registered key.
        match self.family {
            PqFamily::MlDsa => mldsa::verify(message_hash, &sig.post_quantum, binding.public_key),
            PqFamily::SlhDsa => slhdsa::verify(message_hash, &sig.post_quantum, binding.public_key),
        }
    }
}
