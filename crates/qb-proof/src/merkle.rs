//! # Merkle Batching
//!
//! Commits many proof hashes under one root. Pairs are sorted before
//! concatenation and hashing, so inclusion verification needs no
//! leaf-index metadata; an odd node at any level is promoted unchanged.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use sha3::{Digest, Keccak256};
use shared_types::{Hash, ValidationError};

/// A built batch: the leaves in input order, the root, and one inclusion
/// path per leaf.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleBatch {
    /// Leaf hashes in input order.
    #[serde_as(as = "Vec<Bytes>")]
    pub leaves: Vec<Hash>,
    /// Batch root.
    #[serde_as(as = "Bytes")]
    pub root: Hash,
    /// Sibling path for each leaf, leaf level first.
    #[serde_as(as = "Vec<Vec<Bytes>>")]
    pub paths: Vec<Vec<Hash>>,
}

fn hash_sorted_pair(a: &Hash, b: &Hash) -> Hash {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut hasher = Keccak256::new();
    hasher.update(lo);
    hasher.update(hi);
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}

/// Build a batch over proof hashes. Rejects an empty leaf set.
pub fn build_batch(leaves: &[Hash]) -> Result<MerkleBatch, ValidationError> {
    if leaves.is_empty() {
        return Err(ValidationError::InvalidInput(
            "merkle batch needs at least one leaf".into(),
        ));
    }

    // Track, per original leaf, its position in the current level while
    // collecting sibling hashes.
    let mut paths: Vec<Vec<Hash>> = vec![Vec::new(); leaves.len()];
    let mut positions: Vec<usize> = (0..leaves.len()).collect();
    let mut level: Vec<Hash> = leaves.to_vec();

    while level.len() > 1 {
        for (leaf_idx, pos) in positions.iter_mut().enumerate() {
            let sibling = if *pos % 2 == 0 { *pos + 1 } else { *pos - 1 };
            if sibling < level.len() {
                paths[leaf_idx].push(level[sibling]);
            }
            *pos /= 2;
        }
        level = level
            .par_chunks(2)
            .map(|pair| match pair {
                [a, b] => hash_sorted_pair(a, b),
                // Odd node: promoted unchanged.
                [a] => *a,
                _ => unreachable!("chunks(2) yields one or two nodes"),
            })
            .collect();
    }

    Ok(MerkleBatch {
        leaves: leaves.to_vec(),
        root: level[0],
        paths,
    })
}

/// Verify a leaf against a root by folding the sibling path with
/// sorted-pair hashing.
pub fn verify_inclusion(leaf: &Hash, path: &[Hash], root: &Hash) -> bool {
    let mut current = *leaf;
    for sibling in path {
        current = hash_sorted_pair(&current, sibling);
    }
    &current == root
}

impl MerkleBatch {
    /// Inclusion path for the leaf at `index`, if present.
    pub fn path_for(&self, index: usize) -> Option<&[Hash]> {
        self.paths.get(index).map(Vec::as_slice)
    }
}
