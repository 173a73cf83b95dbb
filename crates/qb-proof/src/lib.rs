//! # Quantum-Bridge Proof Format
//!
//! Canonical transfer proofs, their two target-chain wire encodings, and
//! Merkle batching for anchoring many proofs under one on-chain
//! commitment.

#![warn(missing_docs)]

pub mod encoding;
pub mod merkle;
pub mod proof;

pub use encoding::{decode_evm, decode_solana, encode_evm, encode_solana, SOLANA_ENCODED_LEN};
pub use merkle::{build_batch, verify_inclusion, MerkleBatch};
pub use proof::{
    content_hash, status_rules, AttachedSignature, ChainTag, ProofStatus, TransferProof,
    TransferRequest, MAX_TRANSFER_AMOUNT,
};
