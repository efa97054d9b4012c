//! An [`AppendLog`] wrapper that fails appends on demand.
//!
//! `FaultyLog` wraps any `Arc<dyn AppendLog>` and passes every call through
//! until told to fail. Used to exercise storage-fault handling in the layers
//! above without a real disk failure.
//!
//! # Example
//!
//! ```ignore
//! let faulty = FaultyLog::new(Arc::new(MemoryLog::new()));
//! faulty.fail_appends(true);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use strata_types::Entry;

use crate::error::LogError;
use crate::traits::AppendLog;

/// A [`AppendLog`] wrapper that injects append failures.
pub struct FaultyLog {
    inner: Arc<dyn AppendLog>,
    fail_appends: AtomicBool,
    failed: AtomicU64,
}

impl FaultyLog {
    /// Wrap an existing log, passing everything through by default.
    pub fn new(inner: Arc<dyn AppendLog>) -> Self {
        Self {
            inner,
            fail_appends: AtomicBool::new(false),
            failed: AtomicU64::new(0),
        }
    }

    /// Make every subsequent append fail (or stop failing).
    pub fn fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }

    /// Number of appends that were rejected.
    pub fn failed_appends(&self) -> u64 {
        self.failed.load(Ordering::SeqCst)
    }
}

impl AppendLog for FaultyLog {
    fn append(&self, entry: &Entry) -> Result<(), LogError> {
        if self.fail_appends.load(Ordering::SeqCst) {
            self.failed.fetch_add(1, Ordering::SeqCst);
            return Err(LogError::Injected(format!(
                "append of index {} refused",
                entry.index
            )));
        }
        self.inner.append(entry)
    }

    fn entry(&self, index: u64) -> Result<Option<Entry>, LogError> {
        self.inner.entry(index)
    }

    fn latest_index(&self, key: &[u8], below: u64) -> Result<Option<u64>, LogError> {
        self.inner.latest_index(key, below)
    }

    fn len(&self) -> Result<u64, LogError> {
        self.inner.len()
    }
}
