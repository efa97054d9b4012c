//! Storage failures and rewritten history, seen through the gateway.

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::json;
use strata_ledger::Verifier;
use strata_log::{AppendLog, FaultyLog, MemoryLog};
use strata_integration_tests::TestNode;
use strata_types::encoding::encode_base64;
use strata_types::{Entry, Payload};

#[tokio::test]
async fn test_failed_append_stops_writes_but_not_reads() {
    let faulty = Arc::new(FaultyLog::new(Arc::new(MemoryLog::new())));
    let node = TestNode::over(faulty.clone());
    let mut verifier = Verifier::new();

    let receipt = node.safe_set(b"a", b"1", None).await;
    verifier.verify_set(b"a", b"1", &receipt).unwrap();

    faulty.fail_appends(true);
    let body = json!({ "kv": { "key": encode_base64(b"b"), "value": encode_base64(b"2") } });
    let (status, reply) = node.post("/v1/strata/item/safe", &body).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(reply["tamper"], false);

    faulty.fail_appends(false);
    let (status, _) = node.post("/v1/strata/item/safe", &body).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    // the published root never moved
    assert_eq!(node.root().await, verifier.trusted_root().unwrap());
    let got = node.safe_get(b"a", verifier.trusted_root()).await;
    verifier.verify_get(b"a", &got).unwrap();
}

#[tokio::test]
async fn test_rewritten_entry_is_reported_as_tamper() {
    let log = Arc::new(MemoryLog::new());
    let node = TestNode::over(log.clone());
    node.safe_set(b"a", b"1", None).await;
    node.safe_set(b"b", b"2", None).await;

    let forged = Entry::new(0, b"a".to_vec(), Payload::Value(b"evil".to_vec()));
    log.rewrite(&forged).unwrap();
    assert_eq!(log.entry(0).unwrap().unwrap().value(), Some(b"evil".as_slice()));

    let body = json!({ "key": encode_base64(b"a") });
    let (status, reply) = node.post("/v1/strata/item/safe/get", &body).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(reply["code"], "ProofVerificationError");
    assert_eq!(reply["tamper"], true);
}
