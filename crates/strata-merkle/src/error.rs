//! Error types for the Merkle crate.

/// Errors that can occur building or verifying Merkle proofs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MerkleError {
    /// A tree size beyond the current size was requested.
    #[error("invalid tree size {size}: current size is {current}")]
    InvalidSize {
        /// Requested size.
        size: u64,
        /// Current tree size.
        current: u64,
    },

    /// A leaf index at or beyond the tree size was requested.
    #[error("invalid tree size: leaf index {index} is not below tree size {size}")]
    IndexOutOfRange {
        /// Requested leaf index.
        index: u64,
        /// Tree size the proof was requested against.
        size: u64,
    },

    /// A consistency proof was requested with `size1 > size2`.
    #[error("invalid tree size: {size1} is larger than {size2}")]
    SizesOutOfOrder {
        /// Older size.
        size1: u64,
        /// Newer size.
        size2: u64,
    },

    /// A proof did not reproduce the expected root.
    #[error("proof verification failed: {reason}")]
    ProofVerification {
        /// What did not match.
        reason: String,
    },
}

impl MerkleError {
    pub(crate) fn verification(reason: impl Into<String>) -> Self {
        Self::ProofVerification {
            reason: reason.into(),
        }
    }
}
