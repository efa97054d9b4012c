//! Gateway error types and JSON error responses.

use axum::Json;
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use strata_ledger::{ErrorKind, LedgerError};
use tracing::debug;

/// Errors returned by gateway handlers.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The body was not JSON, or lacked the expected wrapper object.
    #[error("incorrect JSON payload")]
    IncorrectJson,

    /// A path or query parameter was missing or not a number.
    #[error("invalid size or index: {message}")]
    InvalidParameter {
        /// What axum reported about the parameter.
        message: String,
    },

    /// Missing or wrong bearer token.
    #[error("unauthorized")]
    Unauthorized,

    /// An error from the ledger.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Internal server error.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the internal failure.
        message: String,
    },
}

impl From<strata_types::EncodingError> for GatewayError {
    fn from(e: strata_types::EncodingError) -> Self {
        Self::Ledger(e.into())
    }
}

impl From<PathRejection> for GatewayError {
    fn from(e: PathRejection) -> Self {
        Self::InvalidParameter {
            message: e.body_text(),
        }
    }
}

impl From<QueryRejection> for GatewayError {
    fn from(e: QueryRejection) -> Self {
        Self::InvalidParameter {
            message: e.body_text(),
        }
    }
}

/// JSON body of every error response.
#[derive(Serialize)]
struct ErrorBody<'a> {
    error: String,
    code: &'a str,
    tamper: bool,
}

impl GatewayError {
    /// Map to an HTTP status code.
    fn status_code(&self) -> StatusCode {
        match self {
            Self::IncorrectJson | Self::InvalidParameter { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Ledger(e) => match e.kind() {
                ErrorKind::ProofVerification => StatusCode::CONFLICT,
                ErrorKind::StorageFault => StatusCode::SERVICE_UNAVAILABLE,
                // absence is reported as a bad request, like every other
                // client-side failure
                _ => StatusCode::BAD_REQUEST,
            },
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable error code string.
    fn code(&self) -> &'static str {
        match self {
            Self::IncorrectJson => ErrorKind::InvalidPayload.as_str(),
            Self::InvalidParameter { .. } => ErrorKind::InvalidSize.as_str(),
            Self::Unauthorized => "Unauthorized",
            Self::Ledger(e) => e.kind().as_str(),
            Self::Internal { .. } => "InternalError",
        }
    }

    /// Human-readable message.
    fn message(&self) -> String {
        match self {
            Self::Ledger(LedgerError::TargetNotFound { .. }) => "Key not found".to_string(),
            other => other.to_string(),
        }
    }

    fn is_tamper(&self) -> bool {
        matches!(self, Self::Ledger(e) if e.kind().is_tamper_signal())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            error: self.message(),
            code: self.code(),
            tamper: self.is_tamper(),
        };
        debug!(status = status.as_u16(), code = body.code, error = %body.error, "request failed");
        (status, Json(body)).into_response()
    }
}
