//! The ledger: one append log, one Merkle index, verified operations.

use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use strata_log::AppendLog;
use strata_merkle::{ConsistencyProof, InclusionProof, MerkleIndex};
use strata_types::{Entry, Payload, Root};
use tracing::{debug, error, info};

use crate::error::LedgerError;
use crate::receipt::{GetReceipt, ProvenEntry, SetReceipt};
use crate::resolver::{DEFAULT_MAX_REFERENCE_DEPTH, Resolution, Resolver};

type Result<T> = std::result::Result<T, LedgerError>;

/// Tunables for a [`Ledger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Maximum reference hops a lookup follows before giving up.
    pub max_reference_depth: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_reference_depth: DEFAULT_MAX_REFERENCE_DEPTH,
        }
    }
}

/// Writer-side state, guarded by the single writer lock.
#[derive(Default)]
struct WriterState {
    /// Index whose append failed. Once set, the ledger refuses writes.
    failed_at: Option<u64>,
}

/// A tamper-evident key-value ledger.
///
/// Thread-safe: share it behind an `Arc`. Writes are serialized; reads run
/// concurrently and never observe a root whose entries are not yet durable.
pub struct Ledger {
    log: Arc<dyn AppendLog>,
    tree: RwLock<MerkleIndex>,
    writer: Mutex<WriterState>,
    config: LedgerConfig,
}

impl Ledger {
    /// Open a ledger over `log`, rebuilding the Merkle index from its entries.
    ///
    /// Every stored entry is re-read and checked against its leaf hash, so a
    /// log edited behind the ledger's back fails here with
    /// [`LedgerError::ProofVerification`].
    pub fn open(log: Arc<dyn AppendLog>, config: LedgerConfig) -> Result<Self> {
        let len = log.len()?;
        let mut tree = MerkleIndex::new();
        for index in 0..len {
            let entry = log
                .entry(index)?
                .ok_or(strata_log::LogError::Corrupt { index })?;
            tree.push(entry.leaf_hash);
        }

        let root = tree.root();
        info!(size = root.size, root = %root.hash, "ledger opened");

        Ok(Self {
            log,
            tree: RwLock::new(tree),
            writer: Mutex::new(WriterState::default()),
            config,
        })
    }

    /// The configuration this ledger was opened with.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Number of entries in the ledger.
    pub fn size(&self) -> u64 {
        self.tree.read().expect("lock poisoned").size()
    }

    /// Root over every entry appended so far.
    pub fn current_root(&self) -> Root {
        self.tree.read().expect("lock poisoned").root()
    }

    /// Root over the first `size` entries.
    pub fn root_at(&self, size: u64) -> Result<Root> {
        Ok(self.tree.read().expect("lock poisoned").root_at(size)?)
    }

    /// Whether an earlier append failed and writes are refused.
    pub fn is_read_only(&self) -> bool {
        self.lock_writer().failed_at.is_some()
    }

    /// Read the entry at `index`.
    pub fn entry(&self, index: u64) -> Result<Entry> {
        let size = self.size();
        if index >= size {
            return Err(LedgerError::InvalidSize(
                strata_merkle::MerkleError::IndexOutOfRange { index, size },
            ));
        }
        self.read_entry(index)
    }

    /// Proof that entry `index` is included in the tree of `size` entries.
    pub fn inclusion_proof(&self, index: u64, size: u64) -> Result<InclusionProof> {
        Ok(self
            .tree
            .read()
            .expect("lock poisoned")
            .inclusion_proof(index, size)?)
    }

    /// Proof that the tree of `size1` entries is a prefix of the tree of
    /// `size2` entries.
    pub fn consistency_proof(&self, size1: u64, size2: u64) -> Result<ConsistencyProof> {
        Ok(self
            .tree
            .read()
            .expect("lock poisoned")
            .consistency_proof(size1, size2)?)
    }

    // ----- Unverified operations -----

    /// Append a value for `key` and return its index.
    pub fn set(&self, key: &[u8], value: &[u8]) -> Result<u64> {
        validate_set(key, value)?;
        let mut writer = self.lock_writer();
        let entry = self.append_locked(&mut writer, key, Payload::Value(value.to_vec()))?;
        Ok(entry.index)
    }

    /// Resolve `key` at the current size. Returns the value and the index of
    /// the key's own entry.
    pub fn get(&self, key: &[u8]) -> Result<(Vec<u8>, u64)> {
        if key.is_empty() {
            return Err(LedgerError::InvalidKey { field: "key" });
        }
        let resolution = self.resolver().resolve(key, self.size())?;
        Ok((resolution.value().to_vec(), resolution.first().index))
    }

    /// Resolve `key` using only entries below `size`.
    pub fn resolve(&self, key: &[u8], size: u64) -> Result<Resolution> {
        let current = self.size();
        if size > current {
            return Err(strata_merkle::MerkleError::InvalidSize { size, current }.into());
        }
        self.resolver().resolve(key, size)
    }

    // ----- Verified operations -----

    /// Append a value for `key` and prove it.
    ///
    /// If `trusted` is given it must be a root this ledger actually produced;
    /// otherwise nothing is appended and the call fails with
    /// [`LedgerError::ProofVerification`]. The receipt then also proves that
    /// the new root extends `trusted`.
    pub fn safe_set(&self, key: &[u8], value: &[u8], trusted: Option<&Root>) -> Result<SetReceipt> {
        validate_set(key, value)?;
        self.safe_append(key, Payload::Value(value.to_vec()), trusted)
    }

    /// Append an alias `key -> target` and prove it.
    ///
    /// `target` must already have an entry. Aliasing a key to itself is
    /// allowed: the alias then reads the value the key had before it.
    pub fn safe_reference(
        &self,
        key: &[u8],
        target: &[u8],
        trusted: Option<&Root>,
    ) -> Result<SetReceipt> {
        if key.is_empty() {
            return Err(LedgerError::InvalidKey { field: "key" });
        }
        if target.is_empty() {
            return Err(LedgerError::InvalidKey { field: "reference" });
        }
        self.safe_append(
            key,
            Payload::Reference {
                target: target.to_vec(),
            },
            trusted,
        )
    }

    /// Resolve `key` and prove every entry on the way.
    ///
    /// With `as_of`, the lookup sees only the history that root covers and
    /// every proof is against it; `as_of` must be a root this ledger
    /// produced. Without it, the current root is used.
    pub fn safe_get(&self, key: &[u8], as_of: Option<&Root>) -> Result<GetReceipt> {
        if key.is_empty() {
            return Err(LedgerError::InvalidKey { field: "key" });
        }

        let root = match as_of {
            Some(root) => {
                self.check_trusted(root)?;
                *root
            }
            None => self.current_root(),
        };

        let resolution = self.resolver().resolve(key, root.size)?;
        let value = resolution.value().to_vec();

        let mut proven = Vec::with_capacity(resolution.hops().len());
        {
            let tree = self.tree.read().expect("lock poisoned");
            for entry in resolution.into_hops() {
                let proof = tree.inclusion_proof(entry.index, root.size)?;
                proven.push(ProvenEntry { entry, proof });
            }
        }

        for hop in &proven {
            hop.proof
                .verify(&hop.entry.leaf_hash, &root)
                .map_err(|e| self.tamper(format!("entry {}: {e}", hop.entry.index)))?;
        }

        let mut chain = proven.into_iter();
        let entry = chain
            .next()
            .ok_or_else(|| LedgerError::KeyNotFound { key: key.to_vec() })?;
        let chain: Vec<ProvenEntry> = chain.collect();

        debug!(
            index = entry.entry.index,
            hops = chain.len(),
            size = root.size,
            "safe get"
        );

        Ok(GetReceipt {
            verified: true,
            value,
            index: entry.entry.index,
            root,
            entry,
            chain,
        })
    }

    /// Re-read every entry and recompute the root from scratch.
    ///
    /// Fails with [`LedgerError::ProofVerification`] if the log no longer
    /// matches the index built when it was appended, which means the storage
    /// was rewritten underneath the ledger.
    pub fn audit(&self) -> Result<Root> {
        let expected = self.current_root();
        let mut rebuilt = MerkleIndex::new();
        for index in 0..expected.size {
            let entry = self.read_entry(index)?;
            rebuilt.push(entry.leaf_hash);
        }

        let actual = rebuilt.root();
        if !actual.matches(&expected) {
            return Err(self.tamper(format!(
                "log recomputes to {actual}, index holds {expected}"
            )));
        }

        info!(size = expected.size, root = %expected.hash, "audit passed");
        Ok(expected)
    }

    // ----- Internal -----

    fn safe_append(
        &self,
        key: &[u8],
        payload: Payload,
        trusted: Option<&Root>,
    ) -> Result<SetReceipt> {
        let entry = {
            let mut writer = self.lock_writer();
            if let Some(trusted) = trusted {
                self.check_trusted(trusted)?;
            }
            if let Payload::Reference { target } = &payload {
                // A self-alias needs a previous value; any other target just
                // needs to exist.
                if self.resolver().latest(target, self.size())?.is_none() {
                    return Err(LedgerError::TargetNotFound {
                        target: target.clone(),
                    });
                }
            }
            self.append_locked(&mut writer, key, payload)?
        };

        let size = entry.index + 1;
        let (root, inclusion, consistency) = {
            let tree = self.tree.read().expect("lock poisoned");
            let root = tree.root_at(size)?;
            let inclusion = tree.inclusion_proof(entry.index, size)?;
            let consistency = trusted
                .map(|t| tree.consistency_proof(t.size, size))
                .transpose()?;
            (root, inclusion, consistency)
        };

        inclusion
            .verify(&entry.leaf_hash, &root)
            .map_err(|e| self.tamper(format!("new entry {}: {e}", entry.index)))?;
        if let (Some(trusted), Some(proof)) = (trusted, &consistency) {
            proof
                .verify(trusted, &root)
                .map_err(|e| self.tamper(format!("consistency from {trusted}: {e}")))?;
        }

        Ok(SetReceipt {
            verified: true,
            index: entry.index,
            leaf_hash: entry.leaf_hash,
            root,
            inclusion,
            consistency,
        })
    }

    /// Append under the writer lock and publish the new leaf.
    fn append_locked(
        &self,
        writer: &mut WriterState,
        key: &[u8],
        payload: Payload,
    ) -> Result<Entry> {
        if let Some(index) = writer.failed_at {
            return Err(LedgerError::Unavailable { index });
        }

        let index = self.size();
        let entry = Entry::new(index, key.to_vec(), payload);

        if let Err(e) = self.log.append(&entry) {
            writer.failed_at = Some(index);
            error!(index, error = %e, "append failed, ledger is now read-only");
            return Err(e.into());
        }

        self.tree
            .write()
            .expect("lock poisoned")
            .push(entry.leaf_hash);
        debug!(index, reference = entry.payload.is_reference(), "appended");
        Ok(entry)
    }

    /// Check that `trusted` is a root this ledger produced.
    fn check_trusted(&self, trusted: &Root) -> Result<()> {
        let ours = self.root_at(trusted.size)?;
        if !ours.matches(trusted) {
            return Err(self.tamper(format!(
                "trusted root {trusted} does not match ledger root {ours}"
            )));
        }
        Ok(())
    }

    fn read_entry(&self, index: u64) -> Result<Entry> {
        let entry = self
            .log
            .entry(index)?
            .ok_or(strata_log::LogError::Corrupt { index })?;
        let indexed = self.tree.read().expect("lock poisoned").leaf(index);
        match indexed {
            Some(leaf) if leaf.ct_eq(&entry.leaf_hash) => Ok(entry),
            _ => Err(self.tamper(format!("entry {index} differs from its indexed leaf"))),
        }
    }

    fn resolver(&self) -> Resolver<'_> {
        Resolver::new(self.log.as_ref(), self.config.max_reference_depth)
    }

    fn lock_writer(&self) -> MutexGuard<'_, WriterState> {
        self.writer.lock().expect("lock poisoned")
    }

    fn tamper(&self, reason: String) -> LedgerError {
        error!(tamper = true, %reason, "verification failed");
        LedgerError::verification(reason)
    }
}

fn validate_set(key: &[u8], value: &[u8]) -> Result<()> {
    if key.is_empty() {
        return Err(LedgerError::InvalidPayload { field: "key" });
    }
    if value.is_empty() {
        return Err(LedgerError::InvalidPayload { field: "value" });
    }
    Ok(())
}
