//! Core trait for append-only entry storage.

use strata_types::{Entry, Payload};

use crate::error::LogError;

/// Durable, ordered storage for log entries.
///
/// Implementations must be safe for concurrent readers alongside one writer.
/// Callers serialize appends; `append` itself only checks that the entry
/// carries the next index.
pub trait AppendLog: Send + Sync {
    /// Persist `entry` at `entry.index`, which must equal [`len`](Self::len).
    ///
    /// The entry is durable when this returns `Ok`.
    fn append(&self, entry: &Entry) -> Result<(), LogError>;

    /// Read the entry at `index`. Returns `None` past the end.
    ///
    /// Fails with [`LogError::Corrupt`] if the stored bytes no longer match
    /// the entry's leaf hash.
    fn entry(&self, index: u64) -> Result<Option<Entry>, LogError>;

    /// Index of the latest entry for `key` whose index is below `below`.
    fn latest_index(&self, key: &[u8], below: u64) -> Result<Option<u64>, LogError>;

    /// Number of entries appended.
    fn len(&self) -> Result<u64, LogError>;

    /// Whether the log holds no entries.
    fn is_empty(&self) -> Result<bool, LogError> {
        Ok(self.len()? == 0)
    }

    /// Latest entry for `key`, regardless of size.
    fn latest(&self, key: &[u8]) -> Result<Option<Entry>, LogError> {
        match self.latest_index(key, u64::MAX)? {
            Some(index) => self.entry(index),
            None => Ok(None),
        }
    }

    /// Append a value entry for `key` at the next index and return the index.
    ///
    /// Not safe against concurrent writers; the ledger serializes writes
    /// before calling [`append`](Self::append) directly.
    fn put(&self, key: &[u8], value: &[u8]) -> Result<u64, LogError> {
        let index = self.len()?;
        let entry = Entry::new(index, key.to_vec(), Payload::Value(value.to_vec()));
        self.append(&entry)?;
        Ok(index)
    }
}

/// Decode a stored entry and check it still matches its leaf hash.
pub(crate) fn decode_entry(index: u64, bytes: &[u8]) -> Result<Entry, LogError> {
    let entry: Entry = postcard::from_bytes(bytes)?;
    if entry.index != index || !entry.verify_leaf_hash() {
        return Err(LogError::Corrupt { index });
    }
    Ok(entry)
}
