//! Tamper-evident key-value ledger.
//!
//! A [`Ledger`] owns one [`AppendLog`](strata_log::AppendLog) and the
//! [`MerkleIndex`](strata_merkle::MerkleIndex) built over it. Every write
//! appends an [`Entry`](strata_types::Entry); every safe operation returns
//! the proofs a client needs to check, without trusting the server, that the
//! entry is in the tree and that the tree only grew since the client's
//! trusted root.
//!
//! # Lifecycle
//!
//! - [`Ledger::open`] replays the log and rebuilds the tree.
//! - Writes go through a single writer lock; each publishes a new root only
//!   after the entry is durable.
//! - Reads snapshot a tree size and build proofs against it, in parallel with
//!   each other and with the writer.
//! - A failed durable append leaves the ledger read-only.
//!
//! The client side lives in [`Verifier`], which holds a trusted root and
//! checks receipts against it.

mod error;
mod ledger;
mod receipt;
mod resolver;
mod verifier;

#[cfg(test)]
mod tests;

pub use error::{ErrorKind, LedgerError};
pub use ledger::{Ledger, LedgerConfig};
pub use receipt::{GetReceipt, ProvenEntry, SetReceipt};
pub use resolver::{DEFAULT_MAX_REFERENCE_DEPTH, Resolution};
pub use verifier::Verifier;
