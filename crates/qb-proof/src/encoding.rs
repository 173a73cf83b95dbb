//! # Target-Chain Wire Encodings
//!
//! The same logical proof fields serialize to two chain-specific layouts:
//! a packed big-endian encoding with length-prefixed variable fields for
//! the EVM side, and a fixed-width little-endian layout for the Solana
//! side. Both round-trip losslessly.

use crate::proof::{ChainTag, ProofStatus, TransferProof, TransferRequest};
use shared_types::{Hash, ValidationError};

// Fixed-width slot sizes for the Solana layout.
const SOLANA_ADDR_SLOT: usize = 64;
const SOLANA_TOKEN_SLOT: usize = 16;
const SOLANA_TXREF_SLOT: usize = 66;

/// Total size of the Solana fixed-width layout.
pub const SOLANA_ENCODED_LEN: usize =
    2 + 2 * SOLANA_ADDR_SLOT + SOLANA_TOKEN_SLOT + SOLANA_TXREF_SLOT + 3 * 8 + 1 + 32;

// =============================================================================
// EVM Packed Encoding
// =============================================================================

/// Encode for the EVM side: chain tags, `[u32 BE len][bytes]` for each
/// string field, big-endian integers, status code, content hash.
pub fn encode_evm(proof: &TransferProof) -> Vec<u8> {
    let request = &proof.request;
    let mut out = Vec::with_capacity(192);
    out.push(request.source_chain.code());
    out.push(request.target_chain.code());
    for field in [
        &request.sender,
        &request.recipient,
        &request.token,
        &request.source_tx_ref,
    ] {
        out.extend_from_slice(&(field.len() as u32).to_be_bytes());
        out.extend_from_slice(field.as_bytes());
    }
    out.extend_from_slice(&request.amount.to_be_bytes());
    out.extend_from_slice(&request.nonce.to_be_bytes());
    out.extend_from_slice(&request.timestamp.to_be_bytes());
    out.push(proof.status.code());
    out.extend_from_slice(&proof.hash);
    out
}

/// Decode an EVM-side payload back into a proof (attestations and Merkle
/// anchors do not travel in the wire form).
pub fn decode_evm(bytes: &[u8]) -> Result<TransferProof, ValidationError> {
    let mut cursor = Cursor::new(bytes);
    let source_chain = ChainTag::try_from(cursor.u8()?)?;
    let target_chain = ChainTag::try_from(cursor.u8()?)?;
    let sender = cursor.prefixed_string()?;
    let recipient = cursor.prefixed_string()?;
    let token = cursor.prefixed_string()?;
    let source_tx_ref = cursor.prefixed_string()?;
    let amount = cursor.u64_be()?;
    let nonce = cursor.u64_be()?;
    let timestamp = cursor.u64_be()?;
    let status = ProofStatus::try_from(cursor.u8()?)?;
    let hash = cursor.hash()?;
    cursor.finish()?;

    rebuild(
        TransferRequest {
            source_chain,
            target_chain,
            sender,
            recipient,
            token,
            amount,
            nonce,
            timestamp,
            source_tx_ref,
        },
        status,
        hash,
    )
}

// =============================================================================
// Solana Fixed-Width Encoding
// =============================================================================

/// Encode for the Solana side: zero-padded fixed slots for strings,
/// little-endian integers, status code, content hash.
pub fn encode_solana(proof: &TransferProof) -> Result<Vec<u8>, ValidationError> {
    let request = &proof.request;
    let mut out = Vec::with_capacity(SOLANA_ENCODED_LEN);
    out.push(request.source_chain.code());
    out.push(request.target_chain.code());
    push_slot(&mut out, &request.sender, SOLANA_ADDR_SLOT)?;
    push_slot(&mut out, &request.recipient, SOLANA_ADDR_SLOT)?;
    push_slot(&mut out, &request.token, SOLANA_TOKEN_SLOT)?;
    push_slot(&mut out, &request.source_tx_ref, SOLANA_TXREF_SLOT)?;
    out.extend_from_slice(&request.amount.to_le_bytes());
    out.extend_from_slice(&request.nonce.to_le_bytes());
    out.extend_from_slice(&request.timestamp.to_le_bytes());
    out.push(proof.status.code());
    out.extend_from_slice(&proof.hash);
    Ok(out)
}

/// Decode a Solana-side payload back into a proof.
pub fn decode_solana(bytes: &[u8]) -> Result<TransferProof, ValidationError> {
    if bytes.len() != SOLANA_ENCODED_LEN {
        return Err(ValidationError::InvalidInput(format!(
            "solana payload must be {} bytes, got {}",
            SOLANA_ENCODED_LEN,
            bytes.len()
        )));
    }
    let mut cursor = Cursor::new(bytes);
    let source_chain = ChainTag::try_from(cursor.u8()?)?;
    let target_chain = ChainTag::try_from(cursor.u8()?)?;
    let sender = cursor.slot_string(SOLANA_ADDR_SLOT)?;
    let recipient = cursor.slot_string(SOLANA_ADDR_SLOT)?;
    let token = cursor.slot_string(SOLANA_TOKEN_SLOT)?;
    let source_tx_ref = cursor.slot_string(SOLANA_TXREF_SLOT)?;
    let amount = cursor.u64_le()?;
    let nonce = cursor.u64_le()?;
    let timestamp = cursor.u64_le()?;
    let status = ProofStatus::try_from(cursor.u8()?)?;
    let hash = cursor.hash()?;
    cursor.finish()?;

    rebuild(
        TransferRequest {
            source_chain,
            target_chain,
            sender,
            recipient,
            token,
            amount,
            nonce,
            timestamp,
            source_tx_ref,
        },
        status,
        hash,
    )
}

/// Revalidate decoded fields and reject a payload whose carried hash does
/// not match the recomputed content hash.
fn rebuild(
    request: TransferRequest,
    status: ProofStatus,
    hash: Hash,
) -> Result<TransferProof, ValidationError> {
    let mut proof = TransferProof::create(request)?;
    if proof.hash != hash {
        return Err(ValidationError::HashMismatch);
    }
    proof.status = status;
    Ok(proof)
}

fn push_slot(out: &mut Vec<u8>, value: &str, slot: usize) -> Result<(), ValidationError> {
    let bytes = value.as_bytes();
    if bytes.len() > slot {
        return Err(ValidationError::InvalidInput(format!(
            "field of {} bytes exceeds {}-byte slot",
            bytes.len(),
            slot
        )));
    }
    out.extend_from_slice(bytes);
    out.extend(std::iter::repeat(0u8).take(slot - bytes.len()));
    Ok(())
}

// =============================================================================
// Cursor
// =============================================================================

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], ValidationError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| ValidationError::InvalidInput("truncated payload".into()))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, ValidationError> {
        Ok(self.take(1)?[0])
    }

    fn u64_be(&mut self) -> Result<u64, ValidationError> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.take(8)?);
        Ok(u64::from_be_bytes(buf))
    }

    fn u64_le(&mut self) -> Result<u64, ValidationError> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.take(8)?);
        Ok(u64::from_le_bytes(buf))
    }

    fn prefixed_string(&mut self) -> Result<String, ValidationError> {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(self.take(4)?);
        let len = u32::from_be_bytes(buf) as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| ValidationError::InvalidInput("non-utf8 field".into()))
    }

    fn slot_string(&mut self, slot: usize) -> Result<String, ValidationError> {
        let bytes = self.take(slot)?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(slot);
        // Validation forbids NUL inside field content, so zero padding may
        // only trail.
        if bytes[end..].iter().any(|&b| b != 0) {
            return Err(ValidationError::InvalidInput(
                "embedded NUL in fixed-width field".into(),
            ));
        }
        String::from_utf8(bytes[..end].to_vec())
            .map_err(|_| ValidationError::InvalidInput("non-utf8 field".into()))
    }

    fn hash(&mut self) -> Result<Hash, ValidationError> {
        let mut out = [0u8; 32];
        out.copy_from_slice(self.take(32)?);
        Ok(out)
    }

    fn finish(&self) -> Result<(), ValidationError> {
        if self.pos != self.bytes.len() {
            return Err(ValidationError::InvalidInput(format!(
                "{} trailing bytes after payload",
                self.bytes.len() - self.pos
            )));
        }
        Ok(())
    }
}
