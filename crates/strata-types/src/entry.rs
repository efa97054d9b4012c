//! Log entry types.

use serde::{Deserialize, Serialize};

use crate::Digest;
use crate::hash;

/// What an entry carries: a literal value, or an alias to another key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payload {
    /// A literal value.
    Value(Vec<u8>),
    /// An alias: the de-facto value is the latest value of `target`.
    Reference {
        /// Key whose latest entry this alias points at.
        target: Vec<u8>,
    },
}

impl Payload {
    /// Whether this payload is an alias.
    pub fn is_reference(&self) -> bool {
        matches!(self, Payload::Reference { .. })
    }
}

/// A single entry of the append-only log.
///
/// `leaf_hash` is computed once from `(index, key, payload)` at construction
/// and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Position in the log, assigned in strict append order from 0.
    pub index: u64,
    /// Key bytes. Later entries with the same key shadow earlier ones.
    pub key: Vec<u8>,
    /// Value or alias target.
    pub payload: Payload,
    /// `hash_leaf(postcard(index, key, payload))`.
    pub leaf_hash: Digest,
}

/// Hashable content of an [`Entry`] (excludes `leaf_hash`).
#[derive(Serialize)]
struct HashableContent<'a> {
    index: u64,
    key: &'a [u8],
    payload: &'a Payload,
}

impl Entry {
    /// Build an entry and compute its leaf hash.
    pub fn new(index: u64, key: Vec<u8>, payload: Payload) -> Self {
        let leaf_hash = Self::compute_leaf_hash(index, &key, &payload);
        Self {
            index,
            key,
            payload,
            leaf_hash,
        }
    }

    /// Compute the leaf hash for `(index, key, payload)`.
    ///
    /// Clients call this with their own copy of the key and value to check
    /// that a server-returned proof covers exactly what they wrote.
    pub fn compute_leaf_hash(index: u64, key: &[u8], payload: &Payload) -> Digest {
        let content = HashableContent {
            index,
            key,
            payload,
        };
        let bytes = postcard::to_allocvec(&content).expect("serialization should not fail");
        hash::hash_leaf(&bytes)
    }

    /// Verify that the stored leaf hash matches the entry's content.
    pub fn verify_leaf_hash(&self) -> bool {
        let expected = Self::compute_leaf_hash(self.index, &self.key, &self.payload);
        self.leaf_hash.ct_eq(&expected)
    }

    /// The literal value, if this is not an alias.
    pub fn value(&self) -> Option<&[u8]> {
        match &self.payload {
            Payload::Value(v) => Some(v),
            Payload::Reference { .. } => None,
        }
    }

    /// The alias target, if this is a reference entry.
    pub fn target(&self) -> Option<&[u8]> {
        match &self.payload {
            Payload::Value(_) => None,
            Payload::Reference { target } => Some(target),
        }
    }
}
