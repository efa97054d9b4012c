//! Incremental Merkle index and proof engine.
//!
//! [`MerkleIndex`] maintains a binary hash tree over appended leaf hashes in
//! O(log N) work per append. Every complete (power-of-two sized, aligned)
//! subtree hash is kept in a per-level arena, so the root of any prefix and
//! any inclusion or consistency proof can be produced without recomputing
//! the tree.
//!
//! The tree shape and proof formats follow the unbalanced Merkle tree of
//! RFC 6962: an odd-sized range splits at the largest power of two below its
//! size, and the rightmost unmatched subtree is carried up unchanged.
//! Verification lives on the proof types ([`InclusionProof::verify`],
//! [`ConsistencyProof::verify`]) so clients can check server output without
//! holding a tree.

mod error;
mod index;
mod proof;

#[cfg(test)]
mod tests;

pub use error::MerkleError;
pub use index::MerkleIndex;
pub use proof::{ConsistencyProof, InclusionProof};
