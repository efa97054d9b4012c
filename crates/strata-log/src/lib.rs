//! Append-only entry log and its storage backends.
//!
//! The [`AppendLog`] trait is the durable, ordered home of every [`Entry`]:
//! append is the only mutation, indices are dense from 0, and history
//! lookups are shadow-aware (the latest entry for a key below a given size).
//! Backends:
//!
//! - [`FjallLog`]: persistent storage in two Fjall keyspaces.
//! - [`MemoryLog`]: in-memory storage behind a `RwLock`.
//! - [`FaultyLog`]: wrapper that injects write failures, for tests.
//!
//! [`Entry`]: strata_types::Entry

mod error;
mod faulty_log;
mod fjall_log;
mod memory_log;
mod traits;

pub use error::LogError;
pub use faulty_log::FaultyLog;
pub use fjall_log::FjallLog;
pub use memory_log::MemoryLog;
pub use traits::AppendLog;
