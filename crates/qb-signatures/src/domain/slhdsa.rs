//! # SLH-DSA-SHA2-128s (FIPS 205)
//!
//! Hash-based signatures via the `fips205` crate. The 128s parameter set
//! trades signing time for the smallest signatures in the family, which is
//! what a bridge that ships signatures across chains wants.

use super::entities::{
    AlgorithmId, BridgeSignature, PqSignature, SLH_DSA_SIGNATURE_LEN,
};
use super::errors::SignatureError;
use super::mldsa::pq_address;
use super::registry::{check_key_len, SignatureSuite, SignerBinding, SuiteKeypair};
use fips205::slh_dsa_sha2_128s;
use fips205::traits::{SerDes, Signer, Verifier};
use shared_types::Hash;
use zeroize::Zeroizing;

pub(crate) fn generate() -> Result<(Vec<u8>, Zeroizing<Vec<u8>>), SignatureError> {
    let (pk, sk) = slh_dsa_sha2_128s::try_keygen()
        .map_err(|e| SignatureError::SigningFailed(e.to_string()))?;
    Ok((
        pk.into_bytes().to_vec(),
        Zeroizing::new(sk.into_bytes().to_vec()),
    ))
}

pub(crate) fn sign(message_hash: &Hash, secret_key: &[u8]) -> Result<PqSignature, SignatureError> {
    let sk_bytes: &[u8; slh_dsa_sha2_128s::SK_LEN] = secret_key
        .try_into()
        .map_err(|_| SignatureError::InvalidFormat)?;
    let sk = slh_dsa_sha2_128s::PrivateKey::try_from_bytes(sk_bytes)
        .map_err(|e| SignatureError::SigningFailed(e.to_string()))?;
    // Hedged signing mixes fresh randomness into the nonce derivation.
    let sig = sk
        .try_sign(message_hash, &[], true)
        .map_err(|e| SignatureError::SigningFailed(e.to_string()))?;
    Ok(PqSignature(sig.to_vec()))
}

pub(crate) fn verify(
    message_hash: &Hash,
    signature: &PqSignature,
    public_key: &[u8],
) -> Result<(), SignatureError> {
    check_key_len(AlgorithmId::SlhDsa, public_key)?;
    let sig_bytes: &[u8; SLH_DSA_SIGNATURE_LEN] = signature
        .as_bytes()
        .try_into()
        .map_err(|_| SignatureError::InvalidFormat)?;
    let pk_bytes: &[u8; slh_dsa_sha2_128s::PK_LEN] = public_key
        .try_into()
        .map_err(|_| SignatureError::InvalidFormat)?;
    let pk = slh_dsa_sha2_128s::PublicKey::try_from_bytes(pk_bytes)
        .map_err(|_| SignatureError::InvalidFormat)?;
    if !pk.verify(message_hash, sig_bytes, &[]) {
        return Err(SignatureError::VerificationFailed);
    }
    Ok(())
}

/// SLH-DSA-SHA2-128s suite.
pub struct SlhDsaSuite;

impl SignatureSuite for SlhDsaSuite {
    fn algorithm(&self) -> AlgorithmId {
        AlgorithmId::SlhDsa
    }

    fn generate_keypair(&self) -> Result<SuiteKeypair, SignatureError> {
        let (public_key, secret_key) = generate()?;
        Ok(SuiteKeypair {
            algorithm: AlgorithmId::SlhDsa,
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
        Ok(BridgeSignature::SlhDsa(sign(message_hash, secret_key)?))
    }

    fn verify(
        &self,
        message_hash: &Hash,
        signature: &BridgeSignature,
        binding: &SignerBinding<'_>,
    ) -> Result<(), SignatureError> {
        let BridgeSignature::SlhDsa(sig) = signature else {
            return Err(SignatureError::InvalidFormat);
        };
        verify(message_hash, sig, binding.public_key)
    }
}
