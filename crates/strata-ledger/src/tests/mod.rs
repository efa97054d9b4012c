//! Tests for the ledger crate.


use std::sync::Arc;

use strata_log::{AppendLog, MemoryLog};

use crate::{Ledger, LedgerConfig};

/// Ledger over a fresh in-memory log.
fn memory_ledger() -> Ledger {
    Ledger::open(Arc::new(MemoryLog::new()), LedgerConfig::default()).unwrap()
}

/// Ledger over `log`, keeping a handle to the log for inspection.
fn ledger_over(log: Arc<dyn AppendLog>) -> Ledger {
    Ledger::open(log, LedgerConfig::default()).unwrap()
}
