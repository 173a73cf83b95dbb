//! # Shared Entities
//!
//! Block, transaction, and account shapes consumed across the trust core.
//! The auditor receives these from the chain-facing collaborators; the
//! guards and verifiers only ever see the fields relevant to their check.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};

/// 32-byte hash (keccak256 throughout the bridge core).
pub type Hash = [u8; 32];

/// 20-byte address (last 20 bytes of keccak256 of an uncompressed pubkey).
pub type Address = [u8; 20];

/// Block height on the audited chain.
pub type BlockHeight = u64;

/// A transaction as presented to the block auditor.
///
/// Signatures travel wire-encoded (algorithm-tagged byte strings) and are
/// decoded by the signature crate; this keeps the entity layer free of any
/// algorithm dependency.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeTransaction {
    /// Transaction hash.
    #[serde_as(as = "Bytes")]
    pub hash: Hash,
    /// The message hash the relayers signed.
    #[serde_as(as = "Bytes")]
    pub message_hash: Hash,
    /// Wire-encoded relayer signatures (`[algorithm id][payload]`).
    pub signatures: Vec<Vec<u8>>,
    /// Opaque instruction payloads. An empty list is a malformed transaction.
    pub instructions: Vec<Vec<u8>>,
    /// Consumed input references, checked by the double-spend guard.
    #[serde_as(as = "Vec<Bytes>")]
    pub inputs: Vec<Hash>,
    /// Transferred amount in base units.
    pub amount: u64,
    /// Declared execution-resource estimate.
    pub gas_estimate: u64,
}

impl BridgeTransaction {
    /// Approximate serialized size in bytes, used for the oversize check.
    pub fn encoded_len(&self) -> usize {
        let sigs: usize = self.signatures.iter().map(Vec::len).sum();
        let instrs: usize = self.instructions.iter().map(Vec::len).sum();
        // Two hashes, inputs, amount + gas, plus the variable payloads.
        64 + self.inputs.len() * 32 + 16 + sigs + instrs
    }
}

/// A block as fetched from the block provider.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeBlock {
    /// Height of this block.
    pub height: BlockHeight,
    /// Block hash.
    #[serde_as(as = "Bytes")]
    pub hash: Hash,
    /// Parent block hash.
    #[serde_as(as = "Bytes")]
    pub parent_hash: Hash,
    /// Unix timestamp.
    pub timestamp: u64,
    /// Transactions in block order.
    pub transactions: Vec<BridgeTransaction>,
}

/// Account snapshot used by the validator stake check.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    /// Account address.
    #[serde_as(as = "Bytes")]
    pub address: Address,
    /// Balance in base units.
    pub balance: u64,
    /// Authority controlling this account. Stake attribution sums balances
    /// over all accounts sharing one authority.
    #[serde_as(as = "Bytes")]
    pub authority: Address,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tx() -> BridgeTransaction {
        BridgeTransaction {
            hash: [1u8; 32],
            message_hash: [2u8; 32],
            signatures: vec![vec![0u8; 65]],
            instructions: vec![vec![0xAA, 0xBB]],
            inputs: vec![[3u8; 32]],
            amount: 1000,
            gas_estimate: 21_000,
        }
    }

    #[test]
    fn test_encoded_len_counts_payloads() {
        let tx = sample_tx();
        // 64 + 32 + 16 + 65 + 2
        assert_eq!(tx.encoded_len(), 179);
    }

    #[test]
    fn test_block_serde_round_trip() {
        let block = BridgeBlock {
            height: 7,
            hash: [9u8; 32],
            parent_hash: [8u8; 32],
            timestamp: 1_700_000_000,
            transactions: vec![sample_tx()],
        };
        let json = serde_json::to_string(&block).unwrap();
        let back: BridgeBlock = serde_json::from_str(&json).unwrap();
        assert_eq!(block, back);
    }
}
