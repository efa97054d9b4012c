//! Tests for the Merkle crate.

mod inclusion_tests;

use strata_types::Digest;
use strata_types::hash::{empty_root, hash_leaf, hash_node};

use crate::index::MerkleIndex;

/// Deterministic leaf hash for position `i`.
fn leaf(i: u64) -> Digest {
    hash_leaf(&i.to_be_bytes())
}

/// Tree with `n` deterministic leaves.
fn tree_of(n: u64) -> MerkleIndex {
    MerkleIndex::from_leaves((0..n).map(leaf))
}

/// Reference Merkle tree hash, straight from the recursive definition.
fn reference_root(leaves: &[Digest]) -> Digest {
    match leaves.len() {
        0 => empty_root(),
        1 => leaves[0],
        n => {
            let mut k = 1;
            while k * 2 < n {
                k *= 2;
            }
            hash_node(&reference_root(&leaves[..k]), &reference_root(&leaves[k..]))
        }
    }
}
