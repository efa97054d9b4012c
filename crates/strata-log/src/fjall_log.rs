//! Persistent log backend on Fjall.
//!
//! Two keyspaces:
//!
//! - `entries`: u64 BE index → postcard `Entry`
//! - `keys`: u32 BE key length ‖ key ‖ u64 BE index → empty
//!
//! The length prefix keeps one key's records from interleaving with a key it
//! is a prefix of, so "latest entry for key below N" is a single reverse
//! range scan.

use std::path::Path;
use std::sync::Mutex;

use fjall::{Database, Keyspace, KeyspaceCreateOptions, PersistMode};
use strata_types::Entry;
use tracing::{debug, info};

use crate::error::LogError;
use crate::traits::{AppendLog, decode_entry};

type Result<T> = std::result::Result<T, LogError>;

/// Log backed by a Fjall database.
pub struct FjallLog {
    db: Database,
    entries: Keyspace,
    keys: Keyspace,
    /// Next index to append; also serializes appends.
    next_index: Mutex<u64>,
    /// Fsync before `append` returns.
    sync_writes: bool,
    /// Keeps a temporary directory alive for the lifetime of the log.
    _tmp: Option<tempfile::TempDir>,
}

impl FjallLog {
    /// Open a persistent log at the given path.
    pub fn open(path: impl AsRef<Path>, sync_writes: bool) -> Result<Self> {
        let db = Database::builder(path.as_ref()).open()?;
        let log = Self::init(db, sync_writes, None)?;
        info!(
            path = %path.as_ref().display(),
            entries = log.len()?,
            "opened fjall log"
        );
        Ok(log)
    }

    /// Open a temporary log that is cleaned up on drop.
    ///
    /// Useful for tests.
    pub fn open_temporary() -> Result<Self> {
        let tmp = tempfile::tempdir()?;
        let db = Database::builder(tmp.path()).temporary(true).open()?;
        Self::init(db, false, Some(tmp))
    }

    fn init(db: Database, sync_writes: bool, tmp: Option<tempfile::TempDir>) -> Result<Self> {
        let entries = db.keyspace("entries", KeyspaceCreateOptions::default)?;
        let keys = db.keyspace("keys", KeyspaceCreateOptions::default)?;

        let next_index = match entries.iter().next_back() {
            Some(guard) => index_from_bytes(&guard.key()?) + 1,
            None => 0,
        };

        let log = Self {
            db,
            entries,
            keys,
            next_index: Mutex::new(next_index),
            sync_writes,
            _tmp: tmp,
        };

        // Only the last append can have been interrupted between its two
        // writes; re-insert its key record.
        if next_index > 0
            && let Some(last) = log.entry(next_index - 1)?
        {
            log.keys.insert(key_record(&last.key, last.index)?, [])?;
        }

        Ok(log)
    }
}

impl AppendLog for FjallLog {
    fn append(&self, entry: &Entry) -> Result<()> {
        let mut next = self.next_index.lock().expect("lock poisoned");
        if entry.index != *next {
            return Err(LogError::OutOfOrder {
                expected: *next,
                got: entry.index,
            });
        }

        let bytes = postcard::to_allocvec(entry)?;
        let record = key_record(&entry.key, entry.index)?;

        self.entries.insert(entry.index.to_be_bytes(), bytes)?;
        self.keys.insert(record, [])?;

        if self.sync_writes {
            self.db.persist(PersistMode::SyncAll)?;
        }

        *next += 1;
        debug!(index = entry.index, "appended entry to fjall");
        Ok(())
    }

    fn entry(&self, index: u64) -> Result<Option<Entry>> {
        match self.entries.get(index.to_be_bytes())? {
            Some(bytes) => Ok(Some(decode_entry(index, &bytes)?)),
            None => Ok(None),
        }
    }

    fn latest_index(&self, key: &[u8], below: u64) -> Result<Option<u64>> {
        if below == 0 {
            return Ok(None);
        }

        let lo = key_record(key, 0)?;
        let hi = key_record(key, below - 1)?;

        match self.keys.range(lo..=hi).next_back() {
            Some(guard) => {
                let k = guard.key()?;
                Ok(Some(index_from_bytes(&k[k.len() - 8..])))
            }
            None => Ok(None),
        }
    }

    fn len(&self) -> Result<u64> {
        Ok(*self.next_index.lock().expect("lock poisoned"))
    }
}

/// `u32 BE len(key) ‖ key ‖ u64 BE index`.
fn key_record(key: &[u8], index: u64) -> Result<Vec<u8>> {
    let len = u32::try_from(key.len()).map_err(|_| LogError::KeyTooLong { len: key.len() })?;
    let mut record = Vec::with_capacity(4 + key.len() + 8);
    record.extend_from_slice(&len.to_be_bytes());
    record.extend_from_slice(key);
    record.extend_from_slice(&index.to_be_bytes());
    Ok(record)
}

fn index_from_bytes(bytes: &[u8]) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&bytes[..8]);
    u64::from_be_bytes(raw)
}

#[cfg(test)]
mod tests {
    use strata_types::Payload;

    use super::*;

    #[test]
    fn test_append_and_lookup() {
        let log = FjallLog::open_temporary().unwrap();

        assert_eq!(log.put(b"Pablo", b"Picasso").unwrap(), 0);
        assert_eq!(log.put(b"Pablo", b"Neruda").unwrap(), 1);

        assert_eq!(log.len().unwrap(), 2);
        assert_eq!(log.latest_index(b"Pablo", 2).unwrap(), Some(1));
        assert_eq!(log.latest_index(b"Pablo", 1).unwrap(), Some(0));
        assert_eq!(
            log.latest(b"Pablo").unwrap().unwrap().value(),
            Some(&b"Neruda"[..])
        );
    }

    #[test]
    fn test_out_of_order_append_rejected() {
        let log = FjallLog::open_temporary().unwrap();
        let entry = Entry::new(3, b"k".to_vec(), Payload::Value(b"v".to_vec()));
        assert!(matches!(
            log.append(&entry),
            Err(LogError::OutOfOrder {
                expected: 0,
                got: 3
            })
        ));
    }

    #[test]
    fn test_prefix_keys_do_not_collide() {
        let log = FjallLog::open_temporary().unwrap();
        log.put(b"a", b"1").unwrap();
        log.put(b"ab", b"2").unwrap();
        log.put(b"a\0", b"3").unwrap();

        assert_eq!(log.latest_index(b"a", u64::MAX).unwrap(), Some(0));
        assert_eq!(log.latest_index(b"ab", u64::MAX).unwrap(), Some(1));
        assert_eq!(log.latest_index(b"a\0", u64::MAX).unwrap(), Some(2));
    }

    #[test]
    fn test_reopen_preserves_entries() {
        let dir = tempfile::tempdir().unwrap();

        {
            let log = FjallLog::open(dir.path(), true).unwrap();
            log.put(b"k", b"v1").unwrap();
            log.put(b"k", b"v2").unwrap();
        }

        let log = FjallLog::open(dir.path(), true).unwrap();
        assert_eq!(log.len().unwrap(), 2);
        assert_eq!(log.latest_index(b"k", u64::MAX).unwrap(), Some(1));
        assert_eq!(log.put(b"k", b"v3").unwrap(), 2);
    }

    #[test]
    fn test_reference_entries_round_trip() {
        let log = FjallLog::open_temporary().unwrap();
        log.put(b"k", b"v").unwrap();
        let alias = Entry::new(
            1,
            b"r".to_vec(),
            Payload::Reference {
                target: b"k".to_vec(),
            },
        );
        log.append(&alias).unwrap();

        let read = log.entry(1).unwrap().unwrap();
        assert_eq!(read, alias);
        assert_eq!(read.target(), Some(&b"k"[..]));
    }
}
