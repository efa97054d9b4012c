//! Domain-separated BLAKE3 hashing for the Merkle tree.
//!
//! Leaves and interior nodes are hashed under distinct one-byte prefixes so
//! that an interior node can never be presented as a leaf (or vice versa).

use crate::Digest;

/// Prefix byte for leaf hashes.
pub const LEAF_PREFIX: u8 = 0x00;

/// Prefix byte for interior node hashes.
pub const NODE_PREFIX: u8 = 0x01;

/// `blake3(0x00 ‖ data)`.
pub fn hash_leaf(data: &[u8]) -> Digest {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&[LEAF_PREFIX]);
    hasher.update(data);
    hasher.finalize().into()
}

/// `blake3(0x01 ‖ left ‖ right)`.
pub fn hash_node(left: &Digest, right: &Digest) -> Digest {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&[NODE_PREFIX]);
    hasher.update(left.as_bytes());
    hasher.update(right.as_bytes());
    hasher.finalize().into()
}

/// Root hash of the empty tree: `blake3("")`.
pub fn empty_root() -> Digest {
    blake3::hash(b"").into()
}
