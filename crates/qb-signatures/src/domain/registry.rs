//! # Algorithm Registry
//!
//! Capability table mapping each [`AlgorithmId`] to its suite implementation.
//! Consumers dispatch through the registry instead of branching on wire
//! codes, so adding an algorithm touches one table and one suite file.

use super::entities::{AlgorithmId, BridgeSignature};
use super::errors::SignatureError;
use shared_types::{Address, Hash};
use std::collections::HashMap;
use zeroize::Zeroizing;

/// Key material produced by a suite's key generation.
///
/// The secret bytes are wrapped in [`Zeroizing`] so they are wiped on drop.
pub struct SuiteKeypair {
    /// Algorithm this keypair belongs to.
    pub algorithm: AlgorithmId,
    /// Bridge address bound to this keypair.
    pub address: Address,
    /// Public key bytes, in the algorithm's registered-key encoding.
    pub public_key: Vec<u8>,
    /// Secret key bytes, in the algorithm's signing encoding.
    pub secret_key: Zeroizing<Vec<u8>>,
}

/// The registered identity a signature is checked against.
///
/// ECDSA binds through address recovery alone; post-quantum families bind
/// through the registered public key; hybrids require both.
#[derive(Clone, Copy, Debug)]
pub struct SignerBinding<'a> {
    /// Relayer address.
    pub address: &'a Address,
    /// Registered public key bytes for the signature's algorithm.
    pub public_key: &'a [u8],
}

/// One signature algorithm's full capability surface.
pub trait SignatureSuite: Send + Sync {
    /// Algorithm implemented by this suite.
    fn algorithm(&self) -> AlgorithmId;

    /// Generate a fresh keypair.
    fn generate_keypair(&self) -> Result<SuiteKeypair, SignatureError>;

    /// Sign a prehashed message with this suite's secret key encoding.
    fn sign(&self, message_hash: &Hash, secret_key: &[u8])
        -> Result<BridgeSignature, SignatureError>;

    /// Verify a signature against a signer binding. Returns `Ok(())` only
    /// when every sub-signature the algorithm carries is valid for this
    /// signer.
    fn verify(
        &self,
        message_hash: &Hash,
        signature: &BridgeSignature,
        binding: &SignerBinding<'_>,
    ) -> Result<(), SignatureError>;
}

/// Table of all supported suites.
pub struct AlgorithmRegistry {
    suites: HashMap<AlgorithmId, Box<dyn SignatureSuite>>,
}

impl AlgorithmRegistry {
    /// Empty registry. Prefer [`AlgorithmRegistry::with_defaults`].
    pub fn new() -> Self {
        Self {
            suites: HashMap::new(),
        }
    }

    /// Registry holding every supported algorithm.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.insert(Box::new(super::ecdsa::EcdsaSuite));
        registry.insert(Box::new(super::mldsa::MlDsaSuite));
        registry.insert(Box::new(super::slhdsa::SlhDsaSuite));
        registry.insert(Box::new(super::hybrid::HybridSuite::ml_dsa()));
        registry.insert(Box::new(super::hybrid::HybridSuite::slh_dsa()));
        registry
    }

    fn insert(&mut self, suite: Box<dyn SignatureSuite>) {
        self.suites.insert(suite.algorithm(), suite);
    }

    /// Look up the suite for an algorithm.
    pub fn suite(&self, algorithm: AlgorithmId) -> Result<&dyn SignatureSuite, SignatureError> {
        self.suites
            .get(&algorithm)
            .map(|s| s.as_ref())
            .ok_or(SignatureError::UnknownAlgorithm(algorithm.code()))
    }

    /// Verify a signature by dispatching on its own algorithm tag.
    pub fn verify(
        &self,
        message_hash: &Hash,
        signature: &BridgeSignature,
        binding: &SignerBinding<'_>,
    ) -> Result<(), SignatureError> {
        self.suite(signature.algorithm())?
            .verify(message_hash, signature, binding)
    }
}

impl Default for AlgorithmRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Length-check a registered public key against the algorithm's fixed size.
pub(crate) fn check_key_len(algorithm: AlgorithmId, key: &[u8]) -> Result<(), SignatureError> {
    let expected = algorithm.public_key_len();
    if key.len() != expected {
        return Err(SignatureError::KeyLengthMismatch {
            algorithm,
            expected,
            actual: key.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ecdsa::keccak256;

    #[test]
    fn test_defaults_cover_every_algorithm() {
        let registry = AlgorithmRegistry::with_defaults();
        for id in AlgorithmId::ALL {
            assert_eq!(registry.suite(id).unwrap().algorithm(), id);
        }
    }

    #[test]
    fn test_empty_registry_rejects_lookup() {
        let registry = AlgorithmRegistry::new();
        assert!(matches!(
            registry.suite(AlgorithmId::Ecdsa),
            Err(SignatureError::UnknownAlgorithm(0x01))
        ));
    }

    #[test]
    fn test_key_len_check() {
        assert!(check_key_len(AlgorithmId::SlhDsa, &[0u8; 32]).is_ok());
        assert!(matches!(
            check_key_len(AlgorithmId::SlhDsa, &[0u8; 31]),
            Err(SignatureError::KeyLengthMismatch {
                expected: 32,
                actual: 31,
                ..
            })
        ));
    }

    #[test]
    fn test_dispatch_sign_verify_per_suite() {
        let registry = AlgorithmRegistry::with_defaults();
        let message = keccak256(b"registry dispatch");

        for id in AlgorithmId::ALL {
            let suite = registry.suite(id).unwrap();
            let keypair = suite.generate_keypair().unwrap();
            let signature = suite.sign(&message, &keypair.secret_key).unwrap();
            assert_eq!(signature.algorithm(), id);

            let binding = SignerBinding {
                address: &keypair.address,
                public_key: &keypair.public_key,
            };
            registry.verify(&message, &signature, &binding).unwrap();

            let other = keccak256(b"different message");
            assert!(registry.verify(&other, &signature, &binding).is_err());
        }
    }
}
