//! Request and response bodies.
//!
//! Requests keep every field optional so that a missing field is reported
//! by the handler with the right error, not by serde.

use serde::{Deserialize, Serialize};
use strata_ledger::{GetReceipt, ProvenEntry, SetReceipt};
use strata_merkle::{ConsistencyProof, InclusionProof};
use strata_types::encoding::{decode_base64, encode_base64};
use strata_types::{Digest, Payload, Root};

use crate::error::GatewayError;

/// Parse a JSON body, mapping any failure to "incorrect JSON payload".
pub(crate) fn parse<'a, T: Deserialize<'a>>(body: &'a [u8]) -> Result<T, GatewayError> {
    serde_json::from_slice(body).map_err(|_| GatewayError::IncorrectJson)
}

/// Decode a required base64 field; `None` if it is absent or empty.
pub(crate) fn decode_field(
    field: &'static str,
    value: Option<&str>,
) -> Result<Option<Vec<u8>>, GatewayError> {
    match value {
        Some(v) if !v.is_empty() => Ok(Some(decode_base64(field, v)?)),
        _ => Ok(None),
    }
}

/// A root as it travels on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootIndex {
    pub size: u64,
    pub hash: String,
}

impl RootIndex {
    pub(crate) fn decode(&self) -> Result<Root, GatewayError> {
        Ok(Root {
            size: self.size,
            hash: Digest::from_hex("rootIndex.hash", &self.hash)?,
        })
    }
}

impl From<Root> for RootIndex {
    fn from(root: Root) -> Self {
        Self {
            size: root.size,
            hash: root.hash.to_hex(),
        }
    }
}

// ----- Requests -----

#[derive(Debug, Deserialize)]
pub(crate) struct KeyValue {
    pub key: Option<String>,
    pub value: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SafeSetRequest {
    pub kv: Option<KeyValue>,
    pub root_index: Option<RootIndex>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SafeGetRequest {
    pub key: Option<String>,
    pub root_index: Option<RootIndex>,
}

/// `reference` names the target, `key` names the alias.
#[derive(Debug, Deserialize)]
pub(crate) struct ReferenceOptions {
    pub reference: Option<String>,
    pub key: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SafeReferenceRequest {
    pub ro: Option<ReferenceOptions>,
    pub root_index: Option<RootIndex>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProofQuery {
    pub size: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConsistencyQuery {
    pub from: u64,
    pub to: Option<u64>,
}

// ----- Responses -----

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireInclusionProof {
    pub leaf_index: u64,
    pub tree_size: u64,
    pub path: Vec<String>,
}

impl From<&InclusionProof> for WireInclusionProof {
    fn from(proof: &InclusionProof) -> Self {
        Self {
            leaf_index: proof.leaf_index,
            tree_size: proof.tree_size,
            path: proof.path.iter().map(Digest::to_hex).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireConsistencyProof {
    pub old_size: u64,
    pub new_size: u64,
    pub path: Vec<String>,
}

impl From<&ConsistencyProof> for WireConsistencyProof {
    fn from(proof: &ConsistencyProof) -> Self {
        Self {
            old_size: proof.old_size,
            new_size: proof.new_size,
            path: proof.path.iter().map(Digest::to_hex).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetResponse {
    pub verified: bool,
    pub index: u64,
    pub leaf_hash: String,
    pub root: RootIndex,
    pub inclusion: WireInclusionProof,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consistency: Option<WireConsistencyProof>,
}

impl From<&SetReceipt> for SetResponse {
    fn from(receipt: &SetReceipt) -> Self {
        Self {
            verified: receipt.verified,
            index: receipt.index,
            leaf_hash: receipt.leaf_hash.to_hex(),
            root: receipt.root.into(),
            inclusion: (&receipt.inclusion).into(),
            consistency: receipt.consistency.as_ref().map(Into::into),
        }
    }
}

/// One entry of a SafeGet chain, with everything needed to recompute its
/// leaf hash.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireEntry {
    pub index: u64,
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub leaf_hash: String,
    pub inclusion: WireInclusionProof,
}

impl From<&ProvenEntry> for WireEntry {
    fn from(proven: &ProvenEntry) -> Self {
        let entry = &proven.entry;
        let (value, reference) = match &entry.payload {
            Payload::Value(v) => (Some(encode_base64(v)), None),
            Payload::Reference { target } => (None, Some(encode_base64(target))),
        };
        Self {
            index: entry.index,
            key: encode_base64(&entry.key),
            value,
            reference,
            leaf_hash: entry.leaf_hash.to_hex(),
            inclusion: (&proven.proof).into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetResponse {
    pub verified: bool,
    pub key: String,
    pub value: String,
    pub index: u64,
    pub resolved_index: u64,
    pub root: RootIndex,
    /// The key's own entry first, then each entry reached by a reference.
    pub entries: Vec<WireEntry>,
}

impl From<&GetReceipt> for GetResponse {
    fn from(receipt: &GetReceipt) -> Self {
        let entries = std::iter::once(&receipt.entry)
            .chain(&receipt.chain)
            .map(WireEntry::from)
            .collect();
        Self {
            verified: receipt.verified,
            key: encode_base64(&receipt.entry.entry.key),
            value: encode_base64(&receipt.value),
            index: receipt.index,
            resolved_index: receipt.resolved_index(),
            root: receipt.root.into(),
            entries,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SetItemResponse {
    pub index: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ItemResponse {
    pub key: String,
    pub value: String,
    pub index: u64,
}
