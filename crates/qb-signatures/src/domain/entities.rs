//! # Domain Entities
//!
//! The closed algorithm set, the signature sum type, and the wire codec
//! that tags every submitted signature with its algorithm id.

use super::errors::SignatureError;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};

/// ECDSA public key length (uncompressed: 0x04 || x || y).
pub const ECDSA_PUBLIC_KEY_LEN: usize = 65;
/// ECDSA serialized signature length (r || s || v).
pub const ECDSA_SIGNATURE_LEN: usize = 65;

/// ML-DSA-65 public key length (FIPS 204).
pub const ML_DSA_PUBLIC_KEY_LEN: usize = 1952;
/// ML-DSA-65 signature length (FIPS 204).
pub const ML_DSA_SIGNATURE_LEN: usize = 3309;

/// SLH-DSA-SHA2-128s public key length (FIPS 205).
pub const SLH_DSA_PUBLIC_KEY_LEN: usize = 32;
/// SLH-DSA-SHA2-128s signature length (FIPS 205).
pub const SLH_DSA_SIGNATURE_LEN: usize = 7856;

// =============================================================================
// Algorithm Identifiers
// =============================================================================

/// The closed set of supported signature algorithms.
///
/// During the post-quantum migration window both classical and hybrid
/// algorithms are accepted simultaneously; the set is closed so dispatch is
/// exhaustive and no stringly-typed algorithm naming leaks into the core.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum AlgorithmId {
    /// Recoverable secp256k1 ECDSA.
    Ecdsa = 0x01,
    /// ML-DSA-65 lattice signatures (FIPS 204).
    MlDsa = 0x02,
    /// SLH-DSA-SHA2-128s hash-based signatures (FIPS 205).
    SlhDsa = 0x03,
    /// ECDSA + ML-DSA-65, both required valid.
    HybridMlDsa = 0x04,
    /// ECDSA + SLH-DSA-SHA2-128s, both required valid.
    HybridSlhDsa = 0x05,
}

impl AlgorithmId {
    /// All algorithm ids, in wire-code order.
    pub const ALL: [AlgorithmId; 5] = [
        AlgorithmId::Ecdsa,
        AlgorithmId::MlDsa,
        AlgorithmId::SlhDsa,
        AlgorithmId::HybridMlDsa,
        AlgorithmId::HybridSlhDsa,
    ];

    /// Wire code for this algorithm.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Whether this algorithm carries a classical and a post-quantum part.
    pub fn is_hybrid(self) -> bool {
        matches!(self, AlgorithmId::HybridMlDsa | AlgorithmId::HybridSlhDsa)
    }

    /// Fixed registered-public-key length for this algorithm.
    ///
    /// Hybrids register the post-quantum key; the classical half is bound
    /// through address recovery, so no second key is stored.
    pub fn public_key_len(self) -> usize {
        match self {
            AlgorithmId::Ecdsa => ECDSA_PUBLIC_KEY_LEN,
            AlgorithmId::MlDsa | AlgorithmId::HybridMlDsa => ML_DSA_PUBLIC_KEY_LEN,
            AlgorithmId::SlhDsa | AlgorithmId::HybridSlhDsa => SLH_DSA_PUBLIC_KEY_LEN,
        }
    }
}

impl TryFrom<u8> for AlgorithmId {
    type Error = SignatureError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0x01 => Ok(AlgorithmId::Ecdsa),
            0x02 => Ok(AlgorithmId::MlDsa),
            0x03 => Ok(AlgorithmId::SlhDsa),
            0x04 => Ok(AlgorithmId::HybridMlDsa),
            0x05 => Ok(AlgorithmId::HybridSlhDsa),
            other => Err(SignatureError::UnknownAlgorithm(other)),
        }
    }
}

// =============================================================================
// Signature Payload Types
// =============================================================================

/// ECDSA signature on the secp256k1 curve.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcdsaSignature {
    /// R component (32 bytes).
    pub r: [u8; 32],
    /// S component (32 bytes).
    pub s: [u8; 32],
    /// Recovery ID (0, 1, 27, or 28).
    pub v: u8,
}

impl EcdsaSignature {
    /// Serialize as r || s || v (65 bytes).
    pub fn to_bytes(&self) -> [u8; ECDSA_SIGNATURE_LEN] {
        let mut out = [0u8; ECDSA_SIGNATURE_LEN];
        out[..32].copy_from_slice(&self.r);
        out[32..64].copy_from_slice(&self.s);
        out[64] = self.v;
        out
    }

    /// Parse from r || s || v (65 bytes).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignatureError> {
        if bytes.len() != ECDSA_SIGNATURE_LEN {
            return Err(SignatureError::InvalidFormat);
        }
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..64]);
        Ok(Self { r, s, v: bytes[64] })
    }
}

/// Raw post-quantum signature bytes.
///
/// Sizes are fixed per family but large, so payloads are carried as owned
/// byte strings and length-checked at the verification boundary.
#[serde_as]
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PqSignature(#[serde_as(as = "Bytes")] pub Vec<u8>);

impl PqSignature {
    /// Raw signature bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for PqSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PqSignature({} bytes)", self.0.len())
    }
}

/// Hybrid signature: one classical and one post-quantum sub-signature over
/// the same message. Both must verify; the composition defends against a
/// compromise of either algorithm.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HybridSignature {
    /// Classical (ECDSA) sub-signature.
    pub classical: EcdsaSignature,
    /// Post-quantum sub-signature bytes.
    pub post_quantum: PqSignature,
}

impl HybridSignature {
    /// Frame as `[u16 BE classical-len][classical bytes][pq bytes]`.
    pub fn to_framed_bytes(&self) -> Vec<u8> {
        let classical = self.classical.to_bytes();
        let mut out = Vec::with_capacity(2 + classical.len() + self.post_quantum.0.len());
        out.extend_from_slice(&(classical.len() as u16).to_be_bytes());
        out.extend_from_slice(&classical);
        out.extend_from_slice(&self.post_quantum.0);
        out
    }

    /// Split a framed payload. Fails closed if the length prefix overruns
    /// the buffer.
    pub fn from_framed_bytes(bytes: &[u8]) -> Result<Self, SignatureError> {
        if bytes.len() < 2 {
            return Err(SignatureError::TruncatedHybrid);
        }
        let classical_len = u16::from_be_bytes([bytes[0], bytes[1]]) as usize;
        let rest = &bytes[2..];
        if classical_len > rest.len() {
            return Err(SignatureError::TruncatedHybrid);
        }
        let classical = EcdsaSignature::from_bytes(&rest[..classical_len])?;
        let post_quantum = PqSignature(rest[classical_len..].to_vec());
        Ok(Self {
            classical,
            post_quantum,
        })
    }
}

/// A submitted signature, tagged by algorithm. The closed sum type replaces
/// numeric type-code branching: every consumer matches exhaustively.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BridgeSignature {
    /// Recoverable ECDSA.
    Ecdsa(EcdsaSignature),
    /// ML-DSA-65.
    MlDsa(PqSignature),
    /// SLH-DSA-SHA2-128s.
    SlhDsa(PqSignature),
    /// ECDSA + ML-DSA-65.
    HybridMlDsa(HybridSignature),
    /// ECDSA + SLH-DSA-SHA2-128s.
    HybridSlhDsa(HybridSignature),
}

impl BridgeSignature {
    /// Algorithm id of this signature.
    pub fn algorithm(&self) -> AlgorithmId {
        match self {
            BridgeSignature::Ecdsa(_) => AlgorithmId::Ecdsa,
            BridgeSignature::MlDsa(_) => AlgorithmId::MlDsa,
            BridgeSignature::SlhDsa(_) => AlgorithmId::SlhDsa,
            BridgeSignature::HybridMlDsa(_) => AlgorithmId::HybridMlDsa,
            BridgeSignature::HybridSlhDsa(_) => AlgorithmId::HybridSlhDsa,
        }
    }

    /// Encode as `[algorithm id][payload]` for transport.
    pub fn to_wire(&self) -> Vec<u8> {
        let mut out = vec![self.algorithm().code()];
        match self {
            BridgeSignature::Ecdsa(sig) => out.extend_from_slice(&sig.to_bytes()),
            BridgeSignature::MlDsa(sig) | BridgeSignature::SlhDsa(sig) => {
                out.extend_from_slice(&sig.0)
            }
            BridgeSignature::HybridMlDsa(sig) | BridgeSignature::HybridSlhDsa(sig) => {
                out.extend_from_slice(&sig.to_framed_bytes())
            }
        }
        out
    }

    /// Decode from `[algorithm id][payload]`.
    ///
    /// An unknown algorithm id is a caller defect and surfaces as
    /// `UnknownAlgorithm` rather than a silent mismatch.
    pub fn from_wire(bytes: &[u8]) -> Result<Self, SignatureError> {
        let (&code, payload) = bytes.split_first().ok_or(SignatureError::InvalidFormat)?;
        match AlgorithmId::try_from(code)? {
            AlgorithmId::Ecdsa => Ok(BridgeSignature::Ecdsa(EcdsaSignature::from_bytes(payload)?)),
            AlgorithmId::MlDsa => Ok(BridgeSignature::MlDsa(PqSignature(payload.to_vec()))),
            AlgorithmId::SlhDsa => Ok(BridgeSignature::SlhDsa(PqSignature(payload.to_vec()))),
            AlgorithmId::HybridMlDsa => Ok(BridgeSignature::HybridMlDsa(
                HybridSignature::from_framed_bytes(payload)?,
            )),
            AlgorithmId::HybridSlhDsa => Ok(BridgeSignature::HybridSlhDsa(
                HybridSignature::from_framed_bytes(payload)?,
            )),
        }
    }
}
