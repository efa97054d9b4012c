//! Inclusion and consistency proofs, and their verification.
//!
//! Verification is a pure function of the proof, the caller's own leaf hash
//! or trusted root, and the claimed root. A mismatch of any kind is a
//! [`MerkleError::ProofVerification`] and must be treated as evidence of
//! tampering, never as a transient fault.

use serde::{Deserialize, Serialize};
use strata_types::hash::hash_node;
use strata_types::{Digest, Root};

use crate::error::MerkleError;

type Result<T> = std::result::Result<T, MerkleError>;

/// Sibling hashes, leaf to root, proving leaf `leaf_index` is under the root
/// of size `tree_size`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusionProof {
    /// Index of the proven leaf.
    pub leaf_index: u64,
    /// Tree size the proof was built against.
    pub tree_size: u64,
    /// Sibling hashes, bottom-up.
    pub path: Vec<Digest>,
}

impl InclusionProof {
    /// Recompute the root from `leaf_hash` and the path and compare it with
    /// `root`.
    pub fn verify(&self, leaf_hash: &Digest, root: &Root) -> Result<()> {
        if root.size != self.tree_size {
            return Err(MerkleError::verification(format!(
                "inclusion proof is for tree size {}, root has size {}",
                self.tree_size, root.size
            )));
        }
        if self.leaf_index >= self.tree_size {
            return Err(MerkleError::verification(format!(
                "leaf index {} out of range for tree size {}",
                self.leaf_index, self.tree_size
            )));
        }

        let mut fn_ = self.leaf_index;
        let mut sn = self.tree_size - 1;
        let mut hash = *leaf_hash;

        for sibling in &self.path {
            if sn == 0 {
                return Err(MerkleError::verification("inclusion proof is too long"));
            }

            if fn_ & 1 == 1 || fn_ == sn {
                hash = hash_node(sibling, &hash);
                // Skip levels where this node is carried up unpaired.
                if fn_ & 1 == 0 {
                    while fn_ & 1 == 0 && fn_ != 0 {
                        fn_ >>= 1;
                        sn >>= 1;
                    }
                }
            } else {
                hash = hash_node(&hash, sibling);
            }

            fn_ >>= 1;
            sn >>= 1;
        }

        if sn != 0 {
            return Err(MerkleError::verification("inclusion proof is too short"));
        }
        if !hash.ct_eq(&root.hash) {
            return Err(MerkleError::verification(format!(
                "inclusion proof for leaf {} does not reproduce root {}",
                self.leaf_index, root
            )));
        }
        Ok(())
    }
}

/// Node hashes proving the tree of `old_size` leaves is a prefix of the tree
/// of `new_size` leaves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyProof {
    /// Size of the older tree.
    pub old_size: u64,
    /// Size of the newer tree.
    pub new_size: u64,
    /// Node hashes as produced by [`MerkleIndex::consistency_proof`](crate::MerkleIndex::consistency_proof).
    pub path: Vec<Digest>,
}

impl ConsistencyProof {
    /// Check that `new` extends `old` without rewriting any of its leaves.
    pub fn verify(&self, old: &Root, new: &Root) -> Result<()> {
        if old.size != self.old_size || new.size != self.new_size {
            return Err(MerkleError::verification(format!(
                "consistency proof is for sizes {}..{}, roots have sizes {}..{}",
                self.old_size, self.new_size, old.size, new.size
            )));
        }
        if old.size > new.size {
            return Err(MerkleError::verification(format!(
                "old size {} is larger than new size {}",
                old.size, new.size
            )));
        }

        // An empty tree is a prefix of everything.
        if old.size == 0 {
            return self.expect_empty();
        }

        if old.size == new.size {
            self.expect_empty()?;
            if !old.hash.ct_eq(&new.hash) {
                return Err(MerkleError::verification(format!(
                    "roots of equal size {} differ",
                    old.size
                )));
            }
            return Ok(());
        }

        // When the old tree is a complete subtree its hash is the starting
        // node and is not repeated in the proof.
        let mut path = Vec::with_capacity(self.path.len() + 1);
        if old.size.is_power_of_two() {
            path.push(old.hash);
        }
        path.extend_from_slice(&self.path);

        let Some((first, rest)) = path.split_first() else {
            return Err(MerkleError::verification("consistency proof is empty"));
        };

        let mut fn_ = old.size - 1;
        let mut sn = new.size - 1;

        while fn_ & 1 == 1 {
            fn_ >>= 1;
            sn >>= 1;
        }

        let mut old_hash = *first;
        let mut new_hash = *first;

        for node in rest {
            if sn == 0 {
                return Err(MerkleError::verification("consistency proof is too long"));
            }

            if fn_ & 1 == 1 || fn_ == sn {
                old_hash = hash_node(node, &old_hash);
                new_hash = hash_node(node, &new_hash);
                if fn_ & 1 == 0 {
                    while fn_ & 1 == 0 && fn_ != 0 {
                        fn_ >>= 1;
                        sn >>= 1;
                    }
                }
            } else {
                new_hash = hash_node(&new_hash, node);
            }

            fn_ >>= 1;
            sn >>= 1;
        }

        if sn != 0 {
            return Err(MerkleError::verification("consistency proof is too short"));
        }
        if !old_hash.ct_eq(&old.hash) {
            return Err(MerkleError::verification(format!(
                "consistency proof does not reproduce old root {old}"
            )));
        }
        if !new_hash.ct_eq(&new.hash) {
            return Err(MerkleError::verification(format!(
                "consistency proof does not reproduce new root {new}"
            )));
        }
        Ok(())
    }

    fn expect_empty(&self) -> Result<()> {
        if !self.path.is_empty() {
            return Err(MerkleError::verification(format!(
                "expected empty consistency proof, got {} nodes",
                self.path.len()
            )));
        }
        Ok(())
    }
}
