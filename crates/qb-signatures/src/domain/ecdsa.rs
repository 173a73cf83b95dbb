//! # Recoverable ECDSA (secp256k1)
//!
//! Pure domain logic for the classical half of the algorithm set.
//!
//! ## Security Notes
//!
//! - **Malleability Prevention (EIP-2)**: S must be strictly less than half
//!   the curve order.
//! - **Scalar Range Validation**: R and S must be in [1, n-1].
//! - **Constant-Time Comparisons**: scalar checks use the `subtle` crate.

use super::entities::{AlgorithmId, BridgeSignature, EcdsaSignature};
use super::errors::SignatureError;
use super::registry::{SignatureSuite, SignerBinding, SuiteKeypair};
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use sha3::{Digest, Keccak256};
use shared_types::{Address, Hash};
use subtle::{Choice, ConstantTimeEq};

/// secp256k1 curve order n.
const SECP256K1_ORDER: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE,
    0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B, 0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36, 0x41, 0x41,
];

/// Half of the secp256k1 curve order, for the EIP-2 malleability check.
const SECP256K1_HALF_ORDER: [u8; 32] = [
    0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0x5D, 0x57, 0x6E, 0x73, 0x57, 0xA4, 0x50, 0x1D, 0xDF, 0xE9, 0x2F, 0x46, 0x68, 0x1B, 0x20, 0xA0,
];

/// Keccak256 hash function.
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

/// Derive the bridge address from a public key: last 20 bytes of
/// keccak256 of the uncompressed point without the 0x04 prefix.
pub fn address_from_pubkey(public_key: &VerifyingKey) -> Address {
    let encoded = public_key.to_encoded_point(false);
    let hash = keccak256(&encoded.as_bytes()[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}

/// Verify an ECDSA signature over a prehashed message and recover the
/// signer's address.
///
/// Performs scalar range validation on R and S, rejects high-S signatures
/// per EIP-2, then recovers the public key.
pub fn verify_and_recover(
    message_hash: &Hash,
    signature: &EcdsaSignature,
) -> Result<Address, SignatureError> {
    if !is_valid_scalar(&signature.r) || !is_valid_scalar(&signature.s) {
        return Err(SignatureError::InvalidFormat);
    }
    if !is_low_s(&signature.s) {
        return Err(SignatureError::MalleableSignature);
    }

    let recovery_id = parse_recovery_id(signature.v)?;

    let mut sig_bytes = [0u8; 64];
    sig_bytes[..32].copy_from_slice(&signature.r);
    sig_bytes[32..].copy_from_slice(&signature.s);
    let sig = Signature::from_slice(&sig_bytes).map_err(|_| SignatureError::InvalidFormat)?;

    let recovered = VerifyingKey::recover_from_prehash(message_hash, &sig, recovery_id)
        .map_err(|_| SignatureError::RecoveryFailed)?;

    Ok(address_from_pubkey(&recovered))
}

/// Verify an ECDSA signature and check the recovered signer.
pub fn verify_signer(
    message_hash: &Hash,
    signature: &EcdsaSignature,
    expected: &Address,
) -> Result<(), SignatureError> {
    let recovered = verify_and_recover(message_hash, signature)?;
    if &recovered != expected {
        return Err(SignatureError::VerificationFailed);
    }
    Ok(())
}

/// Sign a prehashed message, producing a low-S normalized recoverable
/// signature.
pub fn sign_prehash(
    message_hash: &Hash,
    signing_key: &SigningKey,
) -> Result<EcdsaSignature, SignatureError> {
    let (sig, recid) = signing_key
        .sign_prehash_recoverable(message_hash)
        .map_err(|e| SignatureError::SigningFailed(e.to_string()))?;

    let sig_bytes = sig.to_bytes();
    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&sig_bytes[..32]);
    s.copy_from_slice(&sig_bytes[32..]);

    // Normalize S into the lower half (EIP-2); flipping S flips the
    // recovery parity.
    let v = if is_low_s(&s) {
        recid.to_byte() + 27
    } else {
        s = invert_s(&s);
        if recid.to_byte() == 0 {
            28
        } else {
            27
        }
    };

    Ok(EcdsaSignature { r, s, v })
}

/// Check S < n/2 (strict, per EIP-2), in constant time.
pub(crate) fn is_low_s(s: &[u8; 32]) -> bool {
    ct_less_than(s, &SECP256K1_HALF_ORDER)
}

/// Check a scalar is in [1, n-1], in constant time.
fn is_valid_scalar(scalar: &[u8; 32]) -> bool {
    let mut is_zero = Choice::from(1u8);
    for &byte in scalar {
        is_zero &= byte.ct_eq(&0u8);
    }
    let below_order = ct_less_than(scalar, &SECP256K1_ORDER);
    bool::from(!is_zero) && below_order
}

/// Constant-time big-endian comparison: a < b.
fn ct_less_than(a: &[u8; 32], b: &[u8; 32]) -> bool {
    let mut less = Choice::from(0u8);
    let mut greater = Choice::from(0u8);
    for i in 0..32 {
        let not_decided = !(less | greater);
        let byte_less = Choice::from((a[i] < b[i]) as u8);
        let byte_greater = Choice::from((a[i] > b[i]) as u8);
        less |= not_decided & byte_less;
        greater |= not_decided & byte_greater;
    }
    less.into()
}

/// Compute n - s (used to normalize high-S signatures).
pub(crate) fn invert_s(s: &[u8; 32]) -> [u8; 32] {
    let mut result = [0u8; 32];
    let mut borrow: i32 = 0;
    for i in (0..32).rev() {
        let diff = (SECP256K1_ORDER[i] as i32) - (s[i] as i32) - borrow;
        if diff < 0 {
            result[i] = (diff + 256) as u8;
            borrow = 1;
        } else {
            result[i] = diff as u8;
            borrow = 0;
        }
    }
    result
}

/// Classical ECDSA suite. The identity binding is address recovery, so the
/// registered public key is stored for completeness but not consulted
/// during verification.
pub struct EcdsaSuite;

impl SignatureSuite for EcdsaSuite {
    fn algorithm(&self) -> AlgorithmId {
        AlgorithmId::Ecdsa
    }

    fn generate_keypair(&self) -> Result<SuiteKeypair, SignatureError> {
        let signing_key = SigningKey::random(&mut rand::thread_rng());
        let verifying_key = signing_key.verifying_key();
        Ok(SuiteKeypair {
            algorithm: AlgorithmId::Ecdsa,
            address: address_from_pubkey(verifying_key),
            public_key: verifying_key.to_encoded_point(false).as_bytes().to_vec(),
            secret_key: zeroize::Zeroizing::new(signing_key.to_bytes().to_vec()),
        })
    }

    fn sign(
        &self,
        message_hash: &Hash,
        secret_key: &[u8],
    ) -> Result<BridgeSignature, SignatureError> {
        let signing_key =
            SigningKey::from_slice(secret_key).map_err(|_| SignatureError::InvalidFormat)?;
        Ok(BridgeSignature::Ecdsa(sign_prehash(
            message_hash,
            &signing_key,
        )?))
    }

    fn verify(
        &self,
        message_hash: &Hash,
        signature: &BridgeSignature,
        binding: &SignerBinding<'_>,
    ) -> Result<(), SignatureError> {
        let BridgeSignature::Ecdsa(sig) = signature else {
            return Err(SignatureError::InvalidFormat);
        };
        verify_signer(message_hash, sig, binding.address)
    }
}

/// Parse recovery ID from the v byte. Valid values: 0, 1, 27, 28.
fn parse_recovery_id(v: u8) -> Result<RecoveryId, SignatureError> {
    let id = match v {
        0 | 27 => 0,
        1 | 28 => 1,
        _ => return Err(SignatureError::InvalidRecoveryId(v)),
    };
    RecoveryId::try_from(id).map_err(|_| SignatureError::InvalidRecoveryId(v))
}
