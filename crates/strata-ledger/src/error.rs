//! Error types for ledger operations.

use strata_log::LogError;
use strata_merkle::MerkleError;
use strata_types::EncodingError;
use tracing::error;

/// Errors returned by [`Ledger`](crate::Ledger) and
/// [`Verifier`](crate::Verifier) operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// A field could not be decoded from its transport encoding.
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    /// A required SafeSet field was missing or empty.
    #[error("invalid {field}")]
    InvalidPayload {
        /// Offending field.
        field: &'static str,
    },

    /// A required key field was missing or empty.
    #[error("invalid {field}")]
    InvalidKey {
        /// Offending field.
        field: &'static str,
    },

    /// The key has never been written (as of the requested size).
    #[error("Key not found")]
    KeyNotFound {
        /// The missing key.
        key: Vec<u8>,
    },

    /// A reference points at a key with no prior entry.
    #[error("reference target not found")]
    TargetNotFound {
        /// The missing target key.
        target: Vec<u8>,
    },

    /// A tree size or leaf index out of range.
    #[error(transparent)]
    InvalidSize(MerkleError),

    /// A proof or root did not check out. Treat as tampering.
    #[error("proof verification failed: {reason}")]
    ProofVerification {
        /// What did not match.
        reason: String,
    },

    /// A reference chain was cyclic or longer than allowed.
    #[error("reference chain exceeds {limit} hops")]
    ReferenceDepthExceeded {
        /// Configured hop limit.
        limit: usize,
    },

    /// The underlying log failed.
    ///
    /// Entries that no longer match their leaf hash are not storage faults:
    /// converting [`LogError::Corrupt`] yields
    /// [`ProofVerification`](Self::ProofVerification).
    #[error("storage fault: {0}")]
    StorageFault(LogError),

    /// An earlier append failed; the ledger no longer accepts writes.
    #[error("ledger unavailable: append of index {index} failed")]
    Unavailable {
        /// Index whose append failed.
        index: u64,
    },
}

impl LedgerError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Encoding(_) => ErrorKind::Encoding,
            Self::InvalidPayload { .. } => ErrorKind::InvalidPayload,
            Self::InvalidKey { .. } => ErrorKind::InvalidKey,
            Self::KeyNotFound { .. } => ErrorKind::KeyNotFound,
            Self::TargetNotFound { .. } => ErrorKind::TargetNotFound,
            Self::InvalidSize(_) => ErrorKind::InvalidSize,
            Self::ProofVerification { .. } => ErrorKind::ProofVerification,
            Self::ReferenceDepthExceeded { .. } => ErrorKind::ReferenceDepthExceeded,
            Self::StorageFault(_) | Self::Unavailable { .. } => ErrorKind::StorageFault,
        }
    }

    pub(crate) fn verification(reason: impl Into<String>) -> Self {
        Self::ProofVerification {
            reason: reason.into(),
        }
    }
}

impl From<LogError> for LedgerError {
    fn from(e: LogError) -> Self {
        match e {
            LogError::Corrupt { index } => {
                let reason = format!("stored entry {index} does not match its leaf hash");
                error!(tamper = true, index, "corrupt log entry");
                Self::ProofVerification { reason }
            }
            other => Self::StorageFault(other),
        }
    }
}

impl From<MerkleError> for LedgerError {
    fn from(e: MerkleError) -> Self {
        match e {
            MerkleError::ProofVerification { reason } => Self::ProofVerification { reason },
            other => Self::InvalidSize(other),
        }
    }
}

/// Error classes callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed transport encoding.
    Encoding,
    /// Missing or empty SafeSet field.
    InvalidPayload,
    /// Missing or empty key field.
    InvalidKey,
    /// Key absent.
    KeyNotFound,
    /// Reference target absent.
    TargetNotFound,
    /// Tree size or index out of range.
    InvalidSize,
    /// Hash mismatch.
    ProofVerification,
    /// Cyclic or over-long reference chain.
    ReferenceDepthExceeded,
    /// Log failure.
    StorageFault,
}

impl ErrorKind {
    /// Stable name, used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Encoding => "EncodingError",
            Self::InvalidPayload => "InvalidPayloadError",
            Self::InvalidKey => "InvalidKeyError",
            Self::KeyNotFound => "KeyNotFoundError",
            Self::TargetNotFound => "TargetNotFoundError",
            Self::InvalidSize => "InvalidSizeError",
            Self::ProofVerification => "ProofVerificationError",
            Self::ReferenceDepthExceeded => "ReferenceDepthExceededError",
            Self::StorageFault => "StorageFaultError",
        }
    }

    /// Whether the error means the history may have been tampered with.
    ///
    /// Such errors must be surfaced loudly and never retried as if they were
    /// transient.
    pub fn is_tamper_signal(&self) -> bool {
        matches!(self, Self::ProofVerification)
    }

    /// Whether the request itself was at fault (as opposed to the server).
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::ProofVerification | Self::StorageFault)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
