//! What safe operations hand back to the caller.

use serde::{Deserialize, Serialize};
use strata_merkle::{ConsistencyProof, InclusionProof};
use strata_types::{Digest, Entry, Root};

/// An entry together with its inclusion proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenEntry {
    /// The entry.
    pub entry: Entry,
    /// Proof that `entry.leaf_hash` is in the receipt's root.
    pub proof: InclusionProof,
}

/// Result of SafeSet / SafeReference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetReceipt {
    /// The server checked these proofs itself before answering.
    pub verified: bool,
    /// Index assigned to the new entry.
    pub index: u64,
    /// Leaf hash of the new entry.
    pub leaf_hash: Digest,
    /// Root of the tree right after the append (`size == index + 1`).
    pub root: Root,
    /// Inclusion of the new entry in `root`.
    pub inclusion: InclusionProof,
    /// Consistency from the caller's trusted root to `root`, if one was given.
    pub consistency: Option<ConsistencyProof>,
}

/// Result of SafeGet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetReceipt {
    /// The server checked these proofs itself before answering.
    pub verified: bool,
    /// Resolved value.
    pub value: Vec<u8>,
    /// Index of the requested key's own entry.
    pub index: u64,
    /// Root every proof in this receipt is against.
    pub root: Root,
    /// The requested key's entry and its inclusion proof.
    pub entry: ProvenEntry,
    /// Entries reached by following references, in order; empty for a
    /// plain value.
    pub chain: Vec<ProvenEntry>,
}

impl GetReceipt {
    /// Index of the value entry the lookup resolved to.
    pub fn resolved_index(&self) -> u64 {
        self.chain
            .last()
            .map_or(self.entry.entry.index, |hop| hop.entry.index)
    }

    /// Inclusion proof of the requested key's entry.
    pub fn inclusion(&self) -> &InclusionProof {
        &self.entry.proof
    }
}
