//! Decoding of byte fields from their transport form.
//!
//! Keys and values travel as standard base64 in JSON bindings. A decoding
//! failure is an [`EncodingError`], kept distinct from domain errors such as
//! a missing key so callers can tell a malformed request from a legitimate
//! absence.

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};

/// Malformed transport encoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    /// A base64 field could not be decoded.
    #[error("illegal base64 data at input byte {offset}")]
    InvalidBase64 {
        /// Request field that failed.
        field: &'static str,
        /// Byte offset of the first offending input character.
        offset: usize,
    },

    /// A hex-encoded digest was malformed or not 32 bytes long.
    #[error("invalid hex digest in {field}")]
    InvalidDigest {
        /// Request field that failed.
        field: &'static str,
    },
}

impl EncodingError {
    /// The request field the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidBase64 { field, .. } | Self::InvalidDigest { field } => field,
        }
    }
}

/// Decode a standard (padded) base64 field.
pub fn decode_base64(field: &'static str, encoded: &str) -> Result<Vec<u8>, EncodingError> {
    STANDARD
        .decode(encoded)
        .map_err(|e| base64_error(field, encoded, e))
}

/// Decode a URL-safe, unpadded base64 field (used in URL path segments).
pub fn decode_base64_url(field: &'static str, encoded: &str) -> Result<Vec<u8>, EncodingError> {
    URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|e| base64_error(field, encoded, e))
}

/// Encode bytes as standard base64.
pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Encode bytes as URL-safe, unpadded base64.
pub fn encode_base64_url(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

fn base64_error(field: &'static str, encoded: &str, e: base64::DecodeError) -> EncodingError {
    let offset = match e {
        base64::DecodeError::InvalidByte(offset, _)
        | base64::DecodeError::InvalidLastSymbol(offset, _) => offset,
        base64::DecodeError::InvalidLength(len) => len,
        base64::DecodeError::InvalidPadding => encoded.find('=').unwrap_or(encoded.len()),
    };
    EncodingError::InvalidBase64 { field, offset }
}
