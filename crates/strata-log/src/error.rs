//! Error types for log storage operations.

/// Errors that can occur during log storage operations.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// Fjall database error.
    #[error("fjall error: {0}")]
    Fjall(#[from] fjall::Error),

    /// An I/O error occurred.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serde(#[from] postcard::Error),

    /// An append did not carry the next index.
    #[error("out-of-order append: expected index {expected}, got {got}")]
    OutOfOrder {
        /// The next free index.
        expected: u64,
        /// The index the entry carried.
        got: u64,
    },

    /// A stored entry no longer matches its leaf hash.
    #[error("corrupt entry at index {index}: stored data does not match its leaf hash")]
    Corrupt {
        /// Index of the damaged entry.
        index: u64,
    },

    /// Keys are length-prefixed with a `u32`.
    #[error("key too long: {len} bytes")]
    KeyTooLong {
        /// Key length in bytes.
        len: usize,
    },

    /// Injected failure (see [`FaultyLog`](crate::FaultyLog)).
    #[error("injected fault: {0}")]
    Injected(String),
}
