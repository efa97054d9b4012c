//! Request handlers.
//!
//! Handlers parse and decode the request, then run the ledger call on the
//! blocking pool: appends wait on durable storage.

use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use strata_ledger::{Ledger, LedgerError};
use strata_types::encoding::{decode_base64_url, encode_base64};
use tracing::info;

use crate::AppState;
use crate::error::GatewayError;
use crate::wire::{
    self, ConsistencyQuery, GetResponse, ItemResponse, KeyValue, ProofQuery, RootIndex,
    SafeGetRequest, SafeReferenceRequest, SafeSetRequest, SetItemResponse, SetResponse,
    WireConsistencyProof, WireInclusionProof,
};

/// Run `f` against the ledger on the blocking pool.
async fn with_ledger<T, F>(state: &AppState, f: F) -> Result<T, GatewayError>
where
    F: FnOnce(&Ledger) -> Result<T, LedgerError> + Send + 'static,
    T: Send + 'static,
{
    let ledger = state.ledger.clone();
    tokio::task::spawn_blocking(move || f(&ledger))
        .await
        .map_err(|e| GatewayError::Internal {
            message: format!("ledger task failed: {e}"),
        })?
        .map_err(GatewayError::from)
}

/// Decode `key` and `value`, reporting absence as an invalid payload.
fn decode_key_value(kv: &KeyValue) -> Result<(Vec<u8>, Vec<u8>), GatewayError> {
    let key = wire::decode_field("key", kv.key.as_deref())?
        .ok_or(LedgerError::InvalidPayload { field: "key" })?;
    let value = wire::decode_field("value", kv.value.as_deref())?
        .ok_or(LedgerError::InvalidPayload { field: "value" })?;
    Ok((key, value))
}

// -----------------------------------------------------------------------
// POST /v1/strata/item/safe: SafeSet
// -----------------------------------------------------------------------

#[tracing::instrument(skip_all)]
pub(crate) async fn safe_set(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SetResponse>, GatewayError> {
    let request: SafeSetRequest = wire::parse(&body)?;
    let kv = request.kv.ok_or(GatewayError::IncorrectJson)?;
    let (key, value) = decode_key_value(&kv)?;
    let trusted = request.root_index.as_ref().map(RootIndex::decode).transpose()?;

    let receipt = with_ledger(&state, move |ledger| {
        ledger.safe_set(&key, &value, trusted.as_ref())
    })
    .await?;

    info!(index = receipt.index, size = receipt.root.size, "safe_set");
    Ok(Json(SetResponse::from(&receipt)))
}

// -----------------------------------------------------------------------
// POST /v1/strata/item/safe/get: SafeGet
// -----------------------------------------------------------------------

#[tracing::instrument(skip_all)]
pub(crate) async fn safe_get(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<GetResponse>, GatewayError> {
    let request: SafeGetRequest = wire::parse(&body)?;
    let key = wire::decode_field("key", request.key.as_deref())?
        .ok_or(LedgerError::InvalidKey { field: "key" })?;
    let as_of = request.root_index.as_ref().map(RootIndex::decode).transpose()?;

    let receipt = with_ledger(&state, move |ledger| ledger.safe_get(&key, as_of.as_ref())).await?;

    tracing::debug!(
        index = receipt.index,
        resolved = receipt.resolved_index(),
        "safe_get"
    );
    Ok(Json(GetResponse::from(&receipt)))
}

// -----------------------------------------------------------------------
// POST /v1/strata/safe/reference: SafeReference
// -----------------------------------------------------------------------

#[tracing::instrument(skip_all)]
pub(crate) async fn safe_reference(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SetResponse>, GatewayError> {
    let request: SafeReferenceRequest = wire::parse(&body)?;
    let ro = request.ro.ok_or(GatewayError::IncorrectJson)?;

    let target = wire::decode_field("reference", ro.reference.as_deref())?
        .ok_or(LedgerError::InvalidKey { field: "reference" })?;
    let alias = wire::decode_field("key", ro.key.as_deref())?
        .ok_or(LedgerError::InvalidKey { field: "key" })?;
    let trusted = request.root_index.as_ref().map(RootIndex::decode).transpose()?;

    let receipt = with_ledger(&state, move |ledger| {
        ledger.safe_reference(&alias, &target, trusted.as_ref())
    })
    .await?;

    info!(index = receipt.index, size = receipt.root.size, "safe_reference");
    Ok(Json(SetResponse::from(&receipt)))
}

// -----------------------------------------------------------------------
// POST /v1/strata/item, GET /v1/strata/item/{key}: plain Set / Get
// -----------------------------------------------------------------------

#[tracing::instrument(skip_all)]
pub(crate) async fn set(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SetItemResponse>, GatewayError> {
    let kv: KeyValue = wire::parse(&body)?;
    let (key, value) = decode_key_value(&kv)?;

    let index = with_ledger(&state, move |ledger| ledger.set(&key, &value)).await?;

    info!(index, "set");
    Ok(Json(SetItemResponse { index }))
}

#[tracing::instrument(skip_all)]
pub(crate) async fn get(
    State(state): State<AppState>,
    key: Result<Path<String>, PathRejection>,
) -> Result<Json<ItemResponse>, GatewayError> {
    let Path(key) = key?;
    let key = decode_base64_url("key", &key)?;
    let encoded_key = encode_base64(&key);

    let (value, index) = with_ledger(&state, move |ledger| ledger.get(&key)).await?;

    Ok(Json(ItemResponse {
        key: encoded_key,
        value: encode_base64(&value),
        index,
    }))
}

// -----------------------------------------------------------------------
// Roots and proofs
// -----------------------------------------------------------------------

pub(crate) async fn current_root(State(state): State<AppState>) -> Json<RootIndex> {
    Json(state.ledger.current_root().into())
}

// Extractor rejections are taken as values so they answer with the JSON
// error body instead of axum's plain-text one.
#[tracing::instrument(skip_all)]
pub(crate) async fn inclusion_proof(
    State(state): State<AppState>,
    index: Result<Path<u64>, PathRejection>,
    query: Result<Query<ProofQuery>, QueryRejection>,
) -> Result<Json<WireInclusionProof>, GatewayError> {
    let Path(index) = index?;
    let Query(query) = query?;
    let size = query.size.unwrap_or_else(|| state.ledger.size());
    let proof = state.ledger.inclusion_proof(index, size)?;
    Ok(Json((&proof).into()))
}

#[tracing::instrument(skip_all)]
pub(crate) async fn consistency_proof(
    State(state): State<AppState>,
    query: Result<Query<ConsistencyQuery>, QueryRejection>,
) -> Result<Json<WireConsistencyProof>, GatewayError> {
    let Query(query) = query?;
    let to = query.to.unwrap_or_else(|| state.ledger.size());
    let proof = state.ledger.consistency_proof(query.from, to)?;
    Ok(Json((&proof).into()))
}
