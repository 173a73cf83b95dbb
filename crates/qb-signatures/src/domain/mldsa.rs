//! # ML-DSA-65 (FIPS 204)
//!
//! Lattice-based signatures via the `fips204` crate. Key and signature
//! sizes are fixed by the parameter set; everything is length-checked
//! before it reaches the backend.

use super::ecdsa::keccak256;
use super::entities::{
    AlgorithmId, BridgeSignature, PqSignature, ML_DSA_SIGNATURE_LEN,
};
use super::errors::SignatureError;
use super::registry::{check_key_len, SignatureSuite, SignerBinding, SuiteKeypair};
use fips204::ml_dsa_65;
use fips204::traits::{SerDes, Signer, Verifier};
use shared_types::{Address, Hash};
use zeroize::Zeroizing;

/// Derive the bridge address for a post-quantum-only relayer: last 20
/// bytes of keccak256 of the registered public key.
pub(crate) fn pq_address(public_key: &[u8]) -> Address {
    let hash = keccak256(public_key);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}

pub(crate) fn generate() -> Result<(Vec<u8>, Zeroizing<Vec<u8>>), SignatureError> {
    let (pk, sk) = ml_dsa_65::try_keygen()
        .map_err(|e| SignatureError::SigningFailed(e.to_string()))?;
    Ok((
        pk.into_bytes().to_vec(),
        Zeroizing::new(sk.into_bytes().to_vec()),
    ))
}

pub(crate) fn sign(message_hash: &Hash, secret_key: &[u8]) -> Result<PqSignature, SignatureError> {
    let sk_bytes: &[u8; ml_dsa_65::SK_LEN] = secret_key
        .try_into()
        .map_err(|_| SignatureError::InvalidFormat)?;
    let sk = ml_dsa_65::PrivateKey::try_from_bytes(*sk_bytes)
        .map_err(|e| SignatureError::SigningFailed(e.to_string()))?;
    let sig = sk
        .try_sign(message_hash, &[])
        .map_err(|e| SignatureError::SigningFailed(e.to_string()))?;
    Ok(PqSignature(sig.to_vec()))
}

pub(crate) fn verify(
    message_hash: &Hash,
    signature: &PqSignature,
    public_key: &[u8],
) -> Result<(), SignatureError> {
    check_key_len(AlgorithmId::MlDsa, public_key)?;
    let sig_bytes: &[u8; ML_DSA_SIGNATURE_LEN] = signature
        .as_bytes()
        .try_into()
        .map_err(|_| SignatureError::InvalidFormat)?;
    let pk_bytes: &[u8; ml_dsa_65::PK_LEN] = public_key
        .try_into()
        .map_err(|_| SignatureError::InvalidFormat)?;
    let pk = ml_dsa_65::PublicKey::try_from_bytes(*pk_bytes)
        .map_err(|_| SignatureError::InvalidFormat)?;
    if !pk.verify(message_hash, sig_bytes, &[]) {
        return Err(SignatureError::VerificationFailed);
    }
    Ok(())
}

/// ML-DSA-65 suite.
pub struct MlDsaSuite;

impl SignatureSuite for MlDsaSuite {
    fn algorithm(&self) -> AlgorithmId {
        AlgorithmId::MlDsa
    }

    fn generate_keypair(&self) -> Result<SuiteKeypair, SignatureError> {
        let (public_key, secret_key) = generate()?;
        Ok(SuiteKeypair {
            algorithm: AlgorithmId::MlDsa,
            address: pq_address(&public_key),
            public_key,
            secret_key,
        })
    }

    fn sign(
        &self,
        message_hash: &Hash,
        secret_key: &[u8],
    ) -> Result<BridgeSignature, SignatureError> {
        Ok(BridgeSignature::MlDsa(sign(message_hash, secret_key)?))
    }

    fn verify(
        &self,
        message_hash: &Hash,
        signature: &BridgeSignature,
        binding: &SignerBinding<'_>,
    ) -> Result<(), SignatureError> {
        let BridgeSignature::MlDsa(sig) = signature else {
            return Err(SignatureError::InvalidFormat);
        };
        verify(message_hash, sig, binding.public_key)
    }
}
