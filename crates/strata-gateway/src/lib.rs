//! JSON/HTTP gateway for Strata.
//!
//! Provides a [`GatewayServer`] that exposes a [`Ledger`] over an axum-based
//! HTTP API. Byte fields travel as standard base64, hashes as lowercase hex.
//!
//! - `POST /v1/strata/item/safe`: SafeSet
//! - `POST /v1/strata/item/safe/get`: SafeGet
//! - `POST /v1/strata/safe/reference`: SafeReference
//! - `POST /v1/strata/item`: Set
//! - `GET /v1/strata/item/{key}`: Get (key is unpadded base64url)
//! - `GET /v1/strata/root`: current root
//! - `GET /v1/strata/proof/inclusion/{index}?size=N`: inclusion proof
//! - `GET /v1/strata/proof/consistency?from=A&to=B`: consistency proof
//!
//! ## Authentication
//!
//! When [`GatewayConfig::auth_token`] is set, every request must carry
//! `Authorization: Bearer <token>`. Without it the gateway is open.

mod error;
mod handlers;
mod wire;


use std::sync::Arc;

use axum::Router;
use axum::extract::{DefaultBodyLimit, Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use strata_ledger::Ledger;
use subtle::ConstantTimeEq;
use tracing::warn;

pub use error::GatewayError;

/// Default request body limit.
pub const DEFAULT_MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Shared application state for all handlers.
#[derive(Clone)]
pub(crate) struct AppState {
    /// The ledger being served.
    pub ledger: Arc<Ledger>,
    /// Expected bearer token, if auth is enabled.
    pub auth_token: Option<Arc<str>>,
}

/// Bearer-token middleware.
///
/// The token comparison is constant-time.
async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    if let Some(expected) = &state.auth_token {
        let authenticated = request
            .headers()
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| token.as_bytes().ct_eq(expected.as_bytes()).into());

        if !authenticated {
            warn!(uri = %request.uri(), "unauthorized request");
            return Err(GatewayError::Unauthorized);
        }
    }

    Ok(next.run(request).await)
}

/// Configuration for creating a [`GatewayServer`].
pub struct GatewayConfig {
    /// The ledger to serve.
    pub ledger: Arc<Ledger>,
    /// Require `Authorization: Bearer <token>` on every request.
    pub auth_token: Option<String>,
    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,
}

impl GatewayConfig {
    /// Open gateway with default limits.
    pub fn new(ledger: Arc<Ledger>) -> Self {
        Self {
            ledger,
            auth_token: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// HTTP server backed by a [`Ledger`].
pub struct GatewayServer {
    router: Router,
}

impl GatewayServer {
    /// Create a new gateway with the given configuration.
    pub fn new(config: GatewayConfig) -> Self {
        let state = AppState {
            ledger: config.ledger,
            auth_token: config.auth_token.map(Arc::from),
        };

        if state.auth_token.is_none() {
            warn!("gateway auth disabled, all requests accepted");
        }

        let router = Self::build_router(state, config.max_body_bytes);
        Self { router }
    }

    fn build_router(state: AppState, max_body_bytes: usize) -> Router {
        Router::new()
            .route("/v1/strata/item/safe", post(handlers::safe_set))
            .route("/v1/strata/item/safe/get", post(handlers::safe_get))
            .route("/v1/strata/safe/reference", post(handlers::safe_reference))
            .route("/v1/strata/item", post(handlers::set))
            .route("/v1/strata/item/{key}", get(handlers::get))
            .route("/v1/strata/root", get(handlers::current_root))
            .route(
                "/v1/strata/proof/inclusion/{index}",
                get(handlers::inclusion_proof),
            )
            .route(
                "/v1/strata/proof/consistency",
                get(handlers::consistency_proof),
            )
            .route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            ))
            .layer(DefaultBodyLimit::max(max_body_bytes))
            .with_state(state)
    }

    /// Return the inner [`Router`] (useful for testing with `tower::ServiceExt`).
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Serve the gateway on the given TCP address.
    pub async fn serve(self, addr: &str) -> Result<(), std::io::Error> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(addr, "gateway listening");
        axum::serve(listener, self.router).await
    }

    /// Serve the gateway with graceful shutdown triggered by the given future.
    ///
    /// When `shutdown` completes, the server stops accepting new connections
    /// and waits for in-flight requests to finish.
    pub async fn serve_with_shutdown(
        self,
        addr: &str,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), std::io::Error> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(addr, "gateway listening");
        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
    }
}
