//! In-memory log backend.

use std::collections::BTreeSet;
use std::sync::RwLock;

use strata_types::Entry;
use tracing::debug;

use crate::error::LogError;
use crate::traits::{AppendLog, decode_entry};

/// Entries and key index, guarded together so readers never see one without
/// the other.
#[derive(Default)]
struct Inner {
    /// index → serialized Entry.
    entries: Vec<Vec<u8>>,
    /// (key, index) for every entry.
    keys: BTreeSet<(Vec<u8>, u64)>,
}

/// In-memory log backed by a `RwLock`.
///
/// Useful for testing and for nodes configured to run in memory-only mode.
#[derive(Default)]
pub struct MemoryLog {
    inner: RwLock<Inner>,
}

impl MemoryLog {
    /// Create an empty in-memory log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a stored entry in place, bypassing append-only checks.
    ///
    /// Simulates a compromised storage layer rewriting history.
    #[doc(hidden)]
    pub fn rewrite(&self, entry: &Entry) -> Result<(), LogError> {
        let bytes = postcard::to_allocvec(entry)?;
        let mut inner = self.inner.write().expect("lock poisoned");
        let len = inner.entries.len() as u64;

        match inner.entries.get_mut(entry.index as usize) {
            Some(slot) => {
                *slot = bytes;
                Ok(())
            }
            None => Err(LogError::OutOfOrder {
                expected: len,
                got: entry.index,
            }),
        }
    }
}

impl AppendLog for MemoryLog {
    fn append(&self, entry: &Entry) -> Result<(), LogError> {
        let bytes = postcard::to_allocvec(entry)?;
        let mut inner = self.inner.write().expect("lock poisoned");

        let expected = inner.entries.len() as u64;
        if entry.index != expected {
            return Err(LogError::OutOfOrder {
                expected,
                got: entry.index,
            });
        }

        inner.entries.push(bytes);
        inner.keys.insert((entry.key.clone(), entry.index));

        debug!(index = entry.index, "appended entry in memory");
        Ok(())
    }

    fn entry(&self, index: u64) -> Result<Option<Entry>, LogError> {
        let inner = self.inner.read().expect("lock poisoned");
        match usize::try_from(index).ok().and_then(|i| inner.entries.get(i)) {
            Some(bytes) => Ok(Some(decode_entry(index, bytes)?)),
            None => Ok(None),
        }
    }

    fn latest_index(&self, key: &[u8], below: u64) -> Result<Option<u64>, LogError> {
        let inner = self.inner.read().expect("lock poisoned");
        let lo = (key.to_vec(), 0);
        let hi = (key.to_vec(), below);
        Ok(inner.keys.range(lo..hi).next_back().map(|(_, index)| *index))
    }

    fn len(&self) -> Result<u64, LogError> {
        Ok(self.inner.read().expect("lock poisoned").entries.len() as u64)
    }
}
