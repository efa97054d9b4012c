//! Shared test harness for Strata end-to-end tests.
//!
//! Provides [`TestNode`] (a ledger plus the gateway router in front of it)
//! and helpers that turn gateway JSON back into ledger receipts, so tests can
//! check every response with a client-side [`Verifier`](strata_ledger::Verifier)
//! exactly as a remote client would.

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use strata_gateway::{GatewayConfig, GatewayServer};
use strata_ledger::{GetReceipt, Ledger, LedgerConfig, ProvenEntry, SetReceipt};
use strata_log::{AppendLog, FjallLog, MemoryLog};
use strata_merkle::{ConsistencyProof, InclusionProof};
use strata_types::encoding::{decode_base64, encode_base64};
use strata_types::{Digest, Entry, Payload, Root};
use tower::ServiceExt;

/// A ledger served through the gateway, driven in-process.
pub struct TestNode {
    /// The ledger behind the gateway.
    pub ledger: Arc<Ledger>,
    router: Router,
}

impl TestNode {
    /// Node over any log.
    pub fn over(log: Arc<dyn AppendLog>) -> Self {
        let ledger = Arc::new(Ledger::open(log, LedgerConfig::default()).unwrap());
        let router = GatewayServer::new(GatewayConfig::new(ledger.clone())).into_router();
        Self { ledger, router }
    }

    /// Node over a fresh in-memory log.
    pub fn memory() -> Self {
        Self::over(Arc::new(MemoryLog::new()))
    }

    /// Node over a Fjall log in `dir`, fsyncing every append.
    pub fn fjall(dir: &Path) -> Self {
        Self::over(Arc::new(FjallLog::open(dir, true).unwrap()))
    }

    /// POST a JSON body and return the status and parsed response.
    pub async fn post(&self, uri: &str, body: &Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// GET `uri` and return the status and parsed response.
    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    /// SafeSet through the gateway. Panics unless the gateway answers 200.
    pub async fn safe_set(&self, key: &[u8], value: &[u8], trusted: Option<Root>) -> SetReceipt {
        let mut body = serde_json::json!({
            "kv": { "key": encode_base64(key), "value": encode_base64(value) }
        });
        if let Some(root) = trusted {
            body["rootIndex"] = root_json(&root);
        }
        let (status, reply) = self.post("/v1/strata/item/safe", &body).await;
        assert_eq!(status, StatusCode::OK, "safe_set failed: {reply}");
        set_receipt(&reply)
    }

    /// SafeReference `alias -> target` through the gateway.
    pub async fn safe_reference(
        &self,
        alias: &[u8],
        target: &[u8],
        trusted: Option<Root>,
    ) -> SetReceipt {
        let mut body = serde_json::json!({
            "ro": { "reference": encode_base64(target), "key": encode_base64(alias) }
        });
        if let Some(root) = trusted {
            body["rootIndex"] = root_json(&root);
        }
        let (status, reply) = self.post("/v1/strata/safe/reference", &body).await;
        assert_eq!(status, StatusCode::OK, "safe_reference failed: {reply}");
        set_receipt(&reply)
    }

    /// SafeGet through the gateway, anchored at `as_of` when given.
    pub async fn safe_get(&self, key: &[u8], as_of: Option<Root>) -> GetReceipt {
        let mut body = serde_json::json!({ "key": encode_base64(key) });
        if let Some(root) = as_of {
            body["rootIndex"] = root_json(&root);
        }
        let (status, reply) = self.post("/v1/strata/item/safe/get", &body).await;
        assert_eq!(status, StatusCode::OK, "safe_get failed: {reply}");
        get_receipt(&reply)
    }

    /// Current root as reported by the gateway.
    pub async fn root(&self) -> Root {
        let (status, reply) = self.get("/v1/strata/root").await;
        assert_eq!(status, StatusCode::OK);
        root_from_json(&reply)
    }

    /// Consistency proof between two sizes, from the gateway.
    pub async fn consistency(&self, from: u64, to: u64) -> ConsistencyProof {
        let uri = format!("/v1/strata/proof/consistency?from={from}&to={to}");
        let (status, reply) = self.get(&uri).await;
        assert_eq!(status, StatusCode::OK, "consistency failed: {reply}");
        ConsistencyProof {
            old_size: reply["oldSize"].as_u64().unwrap(),
            new_size: reply["newSize"].as_u64().unwrap(),
            path: digests(&reply["path"]),
        }
    }
}

// ----- JSON <-> receipts -----

/// Wire form of a root.
pub fn root_json(root: &Root) -> Value {
    serde_json::json!({ "size": root.size, "hash": root.hash.to_hex() })
}

/// Parse a wire root.
pub fn root_from_json(v: &Value) -> Root {
    Root {
        size: v["size"].as_u64().unwrap(),
        hash: digest(&v["hash"]),
    }
}

fn digest(v: &Value) -> Digest {
    Digest::from_hex("hash", v.as_str().unwrap()).unwrap()
}

fn digests(v: &Value) -> Vec<Digest> {
    v.as_array().unwrap().iter().map(digest).collect()
}

fn bytes(field: &'static str, v: &Value) -> Vec<u8> {
    decode_base64(field, v.as_str().unwrap()).unwrap()
}

fn inclusion(v: &Value) -> InclusionProof {
    InclusionProof {
        leaf_index: v["leafIndex"].as_u64().unwrap(),
        tree_size: v["treeSize"].as_u64().unwrap(),
        path: digests(&v["path"]),
    }
}

/// Rebuild a [`SetReceipt`] from a SafeSet / SafeReference response.
pub fn set_receipt(v: &Value) -> SetReceipt {
    let consistency = v.get("consistency").map(|c| ConsistencyProof {
        old_size: c["oldSize"].as_u64().unwrap(),
        new_size: c["newSize"].as_u64().unwrap(),
        path: digests(&c["path"]),
    });
    SetReceipt {
        verified: v["verified"].as_bool().unwrap(),
        index: v["index"].as_u64().unwrap(),
        leaf_hash: digest(&v["leafHash"]),
        root: root_from_json(&v["root"]),
        inclusion: inclusion(&v["inclusion"]),
        consistency,
    }
}

/// Rebuild a [`GetReceipt`] from a SafeGet response.
///
/// Leaf hashes are taken from the wire as-is; the verifier recomputes them.
pub fn get_receipt(v: &Value) -> GetReceipt {
    let mut entries = v["entries"].as_array().unwrap().iter().map(|e| {
        let payload = match e.get("reference") {
            Some(target) => Payload::Reference {
                target: bytes("reference", target),
            },
            None => Payload::Value(bytes("value", &e["value"])),
        };
        ProvenEntry {
            entry: Entry {
                index: e["index"].as_u64().unwrap(),
                key: bytes("key", &e["key"]),
                payload,
                leaf_hash: digest(&e["leafHash"]),
            },
            proof: inclusion(&e["inclusion"]),
        }
    });
    let entry = entries.next().unwrap();
    GetReceipt {
        verified: v["verified"].as_bool().unwrap(),
        value: bytes("value", &v["value"]),
        index: v["index"].as_u64().unwrap(),
        root: root_from_json(&v["root"]),
        entry,
        chain: entries.collect(),
    }
}
