//! Arena-backed incremental Merkle tree.

use strata_types::hash::{empty_root, hash_node};
use strata_types::{Digest, Root};
use tracing::trace;

use crate::error::MerkleError;
use crate::proof::{ConsistencyProof, InclusionProof};

type Result<T> = std::result::Result<T, MerkleError>;

/// Incremental Merkle tree over appended leaf hashes.
///
/// Nodes are addressed by `(level, position)` instead of pointers:
/// `levels[h][i]` is the hash of the complete subtree covering leaves
/// `[i * 2^h, (i + 1) * 2^h)`. A subtree hash is written exactly once, when
/// its last leaf arrives, and never modified afterwards. The hash of any
/// prefix `[0, N)` is therefore a pure function of the first `N` leaves and
/// stays answerable after the tree grows.
#[derive(Debug, Clone)]
pub struct MerkleIndex {
    levels: Vec<Vec<Digest>>,
}

impl Default for MerkleIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl MerkleIndex {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self {
            levels: vec![Vec::new()],
        }
    }

    /// Build a tree by appending `leaves` in order.
    pub fn from_leaves(leaves: impl IntoIterator<Item = Digest>) -> Self {
        let mut index = Self::new();
        for leaf in leaves {
            index.push(leaf);
        }
        index
    }

    /// Number of leaves appended so far.
    pub fn size(&self) -> u64 {
        self.levels[0].len() as u64
    }

    /// Whether no leaf has been appended yet.
    pub fn is_empty(&self) -> bool {
        self.levels[0].is_empty()
    }

    /// Leaf hash at `index`, if appended.
    pub fn leaf(&self, index: u64) -> Option<Digest> {
        self.levels[0].get(usize::try_from(index).ok()?).copied()
    }

    /// Append a leaf hash and return its index.
    ///
    /// Completes one subtree per trailing one-bit of the new index, so the
    /// work is O(log N).
    pub fn push(&mut self, leaf: Digest) -> u64 {
        let index = self.size();
        self.levels[0].push(leaf);

        let mut level = 0;
        let mut pos = index;

        while pos & 1 == 1 {
            let right = self.levels[level][pos as usize];
            let left = self.levels[level][pos as usize - 1];

            if self.levels.len() == level + 1 {
                self.levels.push(Vec::new());
            }
            self.levels[level + 1].push(hash_node(&left, &right));

            level += 1;
            pos >>= 1;
        }

        trace!(index, completed = level, "merkle leaf appended");
        index
    }

    /// Hashes of the maximal complete subtrees covering `[0, size)`, left to
    /// right. Folding them from the right yields the current root.
    pub fn frontier(&self) -> Vec<Digest> {
        self.peaks(0, self.size())
    }

    /// Root over all leaves appended so far.
    pub fn root(&self) -> Root {
        Root {
            size: self.size(),
            hash: fold_peaks(&self.frontier()),
        }
    }

    /// Root over the first `size` leaves.
    ///
    /// Fails with [`MerkleError::InvalidSize`] if `size` exceeds the current
    /// size. Every smaller size was published as a checkpoint when it was
    /// current, so all of them are valid.
    pub fn root_at(&self, size: u64) -> Result<Root> {
        self.check_size(size)?;
        Ok(Root {
            size,
            hash: self.subtree(0, size),
        })
    }

    /// Build a proof that leaf `index` is included in the tree of `size`
    /// leaves.
    pub fn inclusion_proof(&self, index: u64, size: u64) -> Result<InclusionProof> {
        self.check_size(size)?;
        if index >= size {
            return Err(MerkleError::IndexOutOfRange { index, size });
        }

        // Walk top-down, recording the sibling of the half that holds the
        // leaf; reversed at the end into leaf-to-root order.
        let mut path = Vec::new();
        let (mut start, mut n, mut m) = (0u64, size, index);

        while n > 1 {
            let k = split_point(n);
            if m < k {
                path.push(self.subtree(start + k, n - k));
                n = k;
            } else {
                path.push(self.subtree(start, k));
                start += k;
                m -= k;
                n -= k;
            }
        }
        path.reverse();

        Ok(InclusionProof {
            leaf_index: index,
            tree_size: size,
            path,
        })
    }

    /// Build a proof that the tree of `size1` leaves is a prefix of the tree
    /// of `size2` leaves.
    pub fn consistency_proof(&self, size1: u64, size2: u64) -> Result<ConsistencyProof> {
        self.check_size(size2)?;
        if size1 > size2 {
            return Err(MerkleError::SizesOutOfOrder { size1, size2 });
        }

        let mut path = Vec::new();

        if size1 > 0 && size1 < size2 {
            let (mut start, mut m, mut n) = (0u64, size1, size2);
            // Whether the old tree is still the left edge of the current
            // range, in which case the verifier already knows its hash.
            let mut left_edge = true;

            while m != n {
                let k = split_point(n);
                if m <= k {
                    path.push(self.subtree(start + k, n - k));
                    n = k;
                } else {
                    path.push(self.subtree(start, k));
                    start += k;
                    m -= k;
                    n -= k;
                    left_edge = false;
                }
            }

            if !left_edge {
                path.push(self.subtree(start, m));
            }
            path.reverse();
        }

        Ok(ConsistencyProof {
            old_size: size1,
            new_size: size2,
            path,
        })
    }

    // ----- Internal -----

    fn check_size(&self, size: u64) -> Result<()> {
        let current = self.size();
        if size > current {
            return Err(MerkleError::InvalidSize { size, current });
        }
        Ok(())
    }

    /// Hash of the leaf range `[start, start + len)`.
    ///
    /// `start` must be a multiple of the largest power of two not exceeding
    /// `len`, which holds for every range the proof walks produce.
    fn subtree(&self, start: u64, len: u64) -> Digest {
        if len == 0 {
            return empty_root();
        }
        fold_peaks(&self.peaks(start, len))
    }

    /// Complete subtrees covering `[start, start + len)`, largest first.
    fn peaks(&self, start: u64, len: u64) -> Vec<Digest> {
        let mut peaks = Vec::with_capacity(len.count_ones() as usize);
        let mut pos = start;

        for level in (0..u64::BITS as usize).rev() {
            let width = 1u64 << level;
            if len & width == 0 {
                continue;
            }
            debug_assert_eq!(pos % width, 0, "unaligned subtree range");
            peaks.push(self.levels[level][(pos >> level) as usize]);
            pos += width;
        }

        peaks
    }
}

/// Largest power of two strictly less than `n` (`n >= 2`).
fn split_point(n: u64) -> u64 {
    debug_assert!(n >= 2);
    1 << (u64::BITS - 1 - (n - 1).leading_zeros())
}

/// Combine complete subtrees (largest first) into one root, carrying the
/// rightmost unmatched subtree up unchanged.
fn fold_peaks(peaks: &[Digest]) -> Digest {
    match peaks.split_last() {
        None => empty_root(),
        Some((last, rest)) => rest
            .iter()
            .rev()
            .fold(*last, |acc, peak| hash_node(peak, &acc)),
    }
}
