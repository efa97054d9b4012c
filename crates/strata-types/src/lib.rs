//! Shared types and hashing primitives for Strata.
//!
//! This crate defines the vocabulary used across the workspace:
//! the 32-byte [`Digest`], the tree checkpoint [`Root`], the log [`Entry`]
//! with its [`Payload`], the domain-separated hash functions in [`hash`],
//! and transport decoding helpers in [`encoding`].

mod digest;
mod entry;

pub mod encoding;
pub mod hash;

pub use digest::Digest;
pub use encoding::EncodingError;
pub use entry::{Entry, Payload};

use serde::{Deserialize, Serialize};

/// A checkpoint of the Merkle tree: the root hash over leaves `[0, size)`.
///
/// A client's trusted root is the highest-size `Root` it has independently
/// verified. It is the only state a client needs to persist to detect a
/// rewritten history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Root {
    /// Number of leaves covered.
    pub size: u64,
    /// Merkle tree hash over the first `size` leaves.
    pub hash: Digest,
}

impl Root {
    /// The root of the empty tree.
    pub fn empty() -> Self {
        Self {
            size: 0,
            hash: hash::empty_root(),
        }
    }

    /// Constant-time equality on both size and hash.
    pub fn matches(&self, other: &Root) -> bool {
        self.size == other.size && self.hash.ct_eq(&other.hash)
    }
}

impl std::fmt::Display for Root {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.hash, self.size)
    }
}
