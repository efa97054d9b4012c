//! Reference resolution.
//!
//! A key's de-facto value is found by following reference entries until a
//! value entry is reached. Every lookup is bounded by a tree size so that a
//! read anchored at an older root sees exactly the history that root covers.

use strata_log::AppendLog;
use strata_types::{Entry, Payload};
use tracing::trace;

use crate::error::LedgerError;

/// Default limit on reference hops per lookup.
pub const DEFAULT_MAX_REFERENCE_DEPTH: usize = 8;

/// The chain of entries a lookup walked, from the key's own entry to the
/// value entry it resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    hops: Vec<Entry>,
}

impl Resolution {
    /// Entry of the requested key itself.
    pub fn first(&self) -> &Entry {
        &self.hops[0]
    }

    /// The value entry the chain ended on.
    pub fn last(&self) -> &Entry {
        &self.hops[self.hops.len() - 1]
    }

    /// All entries walked, in order.
    pub fn hops(&self) -> &[Entry] {
        &self.hops
    }

    /// Resolved value bytes.
    pub fn value(&self) -> &[u8] {
        self.last().value().unwrap_or_default()
    }

    pub(crate) fn into_hops(self) -> Vec<Entry> {
        self.hops
    }
}

/// Walks reference chains over a log.
pub(crate) struct Resolver<'a> {
    log: &'a dyn AppendLog,
    max_depth: usize,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(log: &'a dyn AppendLog, max_depth: usize) -> Self {
        Self { log, max_depth }
    }

    /// Resolve `key` using only entries with index below `size`.
    ///
    /// A reference whose target is its own key resolves against entries
    /// strictly before the reference, so `r -> r` reads the previous value of
    /// `r` instead of looping.
    pub(crate) fn resolve(&self, key: &[u8], size: u64) -> Result<Resolution, LedgerError> {
        let first = self
            .latest(key, size)?
            .ok_or_else(|| LedgerError::KeyNotFound { key: key.to_vec() })?;
        let mut hops = vec![first];

        loop {
            let current = &hops[hops.len() - 1];
            let Payload::Reference { target } = &current.payload else {
                break;
            };
            let target = target.clone();
            if hops.len() > self.max_depth {
                return Err(LedgerError::ReferenceDepthExceeded {
                    limit: self.max_depth,
                });
            }
            let bound = if target == current.key {
                current.index
            } else {
                size
            };
            trace!(from = current.index, bound, "following reference");
            let next = self
                .latest(&target, bound)?
                .ok_or(LedgerError::TargetNotFound { target })?;
            hops.push(next);
        }

        Ok(Resolution { hops })
    }

    /// Latest entry for `key` below `size`.
    pub(crate) fn latest(&self, key: &[u8], size: u64) -> Result<Option<Entry>, LedgerError> {
        match self.log.latest_index(key, size)? {
            Some(index) => {
                let entry = self.log.entry(index)?;
                Ok(entry)
            }
            None => Ok(None),
        }
    }
}
