//! A remote client's view: every gateway response is checked with a
//! client-side verifier that only trusts roots it has verified itself.

use axum::http::StatusCode;
use serde_json::json;
use strata_ledger::Verifier;
use strata_integration_tests::{TestNode, root_json};
use strata_types::encoding::encode_base64;

#[tokio::test]
async fn test_client_session() {
    let node = TestNode::memory();
    let mut verifier = Verifier::new();

    let receipt = node.safe_set(b"client", b"John Doe", None).await;
    assert!(receipt.verified);
    verifier.verify_set(b"client", b"John Doe", &receipt).unwrap();

    let receipt = node
        .safe_set(b"Pablo", b"Picasso", verifier.trusted_root())
        .await;
    verifier.verify_set(b"Pablo", b"Picasso", &receipt).unwrap();

    let receipt = node
        .safe_reference(b"Artist", b"Pablo", verifier.trusted_root())
        .await;
    verifier.verify_reference(b"Artist", b"Pablo", &receipt).unwrap();

    let receipt = node
        .safe_reference(b"Pablo", b"Pablo", verifier.trusted_root())
        .await;
    verifier.verify_reference(b"Pablo", b"Pablo", &receipt).unwrap();

    for key in [b"Artist".as_slice(), b"Pablo".as_slice()] {
        let got = node.safe_get(key, verifier.trusted_root()).await;
        verifier.verify_get(key, &got).unwrap();
        assert_eq!(got.value, b"Picasso");
    }

    let trusted = verifier.trusted_root().unwrap();
    assert_eq!(trusted.size, 4);
    assert_eq!(node.root().await, trusted);
}

#[tokio::test]
async fn test_historical_read_at_trusted_root() {
    let node = TestNode::memory();
    let mut verifier = Verifier::new();

    let receipt = node.safe_set(b"k", b"v1", None).await;
    verifier.verify_set(b"k", b"v1", &receipt).unwrap();
    let receipt = node.safe_reference(b"alias", b"k", verifier.trusted_root()).await;
    verifier.verify_reference(b"alias", b"k", &receipt).unwrap();
    let before = verifier.trusted_root().unwrap();

    // another client moves the target on
    node.safe_set(b"k", b"v2", None).await;

    // still anchored at the old root, the alias reads the old value
    let got = node.safe_get(b"alias", Some(before)).await;
    verifier.verify_get(b"alias", &got).unwrap();
    assert_eq!(got.value, b"v1");

    // catching up requires a consistency proof
    let current = node.root().await;
    let proof = node.consistency(before.size, current.size).await;
    verifier.verify_consistency(&current, &proof).unwrap();
    let got = node.safe_get(b"alias", verifier.trusted_root()).await;
    verifier.verify_get(b"alias", &got).unwrap();
    assert_eq!(got.value, b"v2");
}

#[tokio::test]
async fn test_lying_server_is_caught() {
    let honest = TestNode::memory();
    let other = TestNode::memory();
    let mut verifier = Verifier::new();

    let receipt = honest.safe_set(b"a", b"1", None).await;
    verifier.verify_set(b"a", b"1", &receipt).unwrap();

    // a different history that happens to have the same size
    other.safe_set(b"a", b"forged", None).await;
    let forged = other.safe_set(b"b", b"2", None).await;

    // the forged receipt carries no consistency proof from our root
    assert!(verifier.verify_set(b"b", b"2", &forged).is_err());

    // and the other server refuses our trusted root outright
    let body = json!({
        "kv": { "key": encode_base64(b"c"), "value": encode_base64(b"3") },
        "rootIndex": root_json(&verifier.trusted_root().unwrap()),
    });
    let (status, reply) = other.post("/v1/strata/item/safe", &body).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(reply["tamper"], true);
}
