//! Client-side verification of ledger receipts.
//!
//! A [`Verifier`] holds the one piece of state a client keeps between calls:
//! its trusted root. Every check recomputes leaf hashes from data the client
//! already knows and replays the proofs; the trusted root only advances when
//! a check passes.

use strata_merkle::ConsistencyProof;
use strata_types::{Digest, Entry, Payload, Root};
use tracing::{debug, error};

use crate::error::LedgerError;
use crate::receipt::{GetReceipt, ProvenEntry, SetReceipt};

type Result<T> = std::result::Result<T, LedgerError>;

/// Holds a trusted root and checks receipts against it.
#[derive(Debug, Clone, Default)]
pub struct Verifier {
    trusted: Option<Root>,
}

impl Verifier {
    /// A verifier with no trusted root yet; the first receipt is trusted on
    /// first use.
    pub fn new() -> Self {
        Self::default()
    }

    /// A verifier starting from a root obtained out of band.
    pub fn with_trusted(root: Root) -> Self {
        Self {
            trusted: Some(root),
        }
    }

    /// The current trusted root.
    pub fn trusted_root(&self) -> Option<Root> {
        self.trusted
    }

    /// Check a SafeSet receipt for `key = value` and advance the trusted root.
    pub fn verify_set(&mut self, key: &[u8], value: &[u8], receipt: &SetReceipt) -> Result<Root> {
        let leaf = Entry::compute_leaf_hash(receipt.index, key, &Payload::Value(value.to_vec()));
        self.verify_append(leaf, receipt)
    }

    /// Check a SafeReference receipt for `key -> target` and advance the
    /// trusted root.
    pub fn verify_reference(
        &mut self,
        key: &[u8],
        target: &[u8],
        receipt: &SetReceipt,
    ) -> Result<Root> {
        let payload = Payload::Reference {
            target: target.to_vec(),
        };
        let leaf = Entry::compute_leaf_hash(receipt.index, key, &payload);
        self.verify_append(leaf, receipt)
    }

    /// Check a SafeGet receipt for `key`.
    ///
    /// The receipt's root must be the trusted root (or become it on first
    /// use). Reads at a newer root need [`verify_consistency`] first.
    ///
    /// [`verify_consistency`]: Self::verify_consistency
    pub fn verify_get(&mut self, key: &[u8], receipt: &GetReceipt) -> Result<()> {
        let root = receipt.root;
        match self.trusted {
            Some(trusted) if !trusted.matches(&root) => {
                return Err(fail(format!(
                    "read at {root} is not anchored at trusted root {trusted}"
                )));
            }
            _ => {}
        }

        if receipt.entry.entry.key != key {
            return Err(fail("receipt is for a different key"));
        }
        if receipt.index != receipt.entry.entry.index {
            return Err(fail("receipt index does not match its entry"));
        }
        check_proven(&receipt.entry, &root)?;

        let mut current = &receipt.entry.entry;
        for hop in &receipt.chain {
            let Some(target) = current.target() else {
                return Err(fail(format!("entry {} is not a reference", current.index)));
            };
            if hop.entry.key != target {
                return Err(fail(format!(
                    "entry {} does not belong to the referenced key",
                    hop.entry.index
                )));
            }
            if hop.entry.index >= current.index && hop.entry.key == current.key {
                return Err(fail(format!(
                    "self-reference at {} resolved forward",
                    current.index
                )));
            }
            check_proven(hop, &root)?;
            current = &hop.entry;
        }

        match current.value() {
            Some(value) if value == receipt.value.as_slice() => {}
            _ => return Err(fail("resolved value does not match the receipt")),
        }

        self.trusted = Some(root);
        debug!(index = receipt.index, size = root.size, "get verified");
        Ok(())
    }

    /// Advance the trusted root to `new` after checking `proof`.
    ///
    /// With no trusted root yet, `new` is accepted on first use.
    pub fn verify_consistency(&mut self, new: &Root, proof: &ConsistencyProof) -> Result<Root> {
        if let Some(trusted) = self.trusted {
            if new.size < trusted.size {
                return Err(fail(format!("root {new} is older than trusted root {trusted}")));
            }
            proof.verify(&trusted, new).map_err(|e| fail(e.to_string()))?;
        }
        self.trusted = Some(*new);
        Ok(*new)
    }

    fn verify_append(&mut self, leaf: Digest, receipt: &SetReceipt) -> Result<Root> {
        let root = receipt.root;
        if !receipt.leaf_hash.ct_eq(&leaf) {
            return Err(fail("receipt leaf hash does not match the written data"));
        }
        if root.size != receipt.index + 1 || receipt.inclusion.leaf_index != receipt.index {
            return Err(fail(format!(
                "receipt for index {} carries root {root}",
                receipt.index
            )));
        }
        receipt
            .inclusion
            .verify(&leaf, &root)
            .map_err(|e| fail(e.to_string()))?;

        if let Some(trusted) = self.trusted {
            match &receipt.consistency {
                Some(proof) => proof
                    .verify(&trusted, &root)
                    .map_err(|e| fail(e.to_string()))?,
                None => {
                    return Err(fail(format!(
                        "no consistency proof from trusted root {trusted}"
                    )));
                }
            }
        }

        self.trusted = Some(root);
        debug!(index = receipt.index, size = root.size, "write verified");
        Ok(root)
    }
}

fn check_proven(hop: &ProvenEntry, root: &Root) -> Result<()> {
    let entry = &hop.entry;
    let leaf = Entry::compute_leaf_hash(entry.index, &entry.key, &entry.payload);
    if !leaf.ct_eq(&entry.leaf_hash) || hop.proof.leaf_index != entry.index {
        return Err(fail(format!("entry {} does not match its leaf hash", entry.index)));
    }
    hop.proof
        .verify(&leaf, root)
        .map_err(|e| fail(format!("entry {}: {e}", entry.index)))
}

fn fail(reason: impl Into<String>) -> LedgerError {
    let reason = reason.into();
    error!(tamper = true, %reason, "receipt rejected");
    LedgerError::verification(reason)
}
