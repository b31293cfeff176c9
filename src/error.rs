//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use std::io;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type shared by every backend.
///
/// A missing key and an expired key are both reported as `NotFound`.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key absent, or present but no longer live
    #[error("Key not found: {0}")]
    NotFound(String),

    /// The backend connection or session is unusable
    #[error("Connection closed: {0}")]
    ConnectionClosed(String),

    /// Stored blob could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Arithmetic requested on a value that is not a base-10 integer
    #[error("Value of key '{key}' is not an integer: {value:?}")]
    NotAnInteger { key: String, value: String },

    /// Arithmetic result does not fit in a signed 64-bit integer
    #[error("Arithmetic overflow on key: {0}")]
    Overflow(String),

    /// Any other transport or driver failure
    #[error("Backend error: {0}")]
    Backend(String),

    /// Unknown backend kind or unusable connection string
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl CacheError {
    /// Returns true for `NotFound`, the only error `has` folds into `false`.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CacheError::NotFound(_))
    }

    /// Returns true for errors raised by integer arithmetic on a stored value.
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            CacheError::NotAnInteger { .. } | CacheError::Overflow(_)
        )
    }

    /// Classifies an I/O error coming out of a network driver.
    pub(crate) fn from_io(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
            | io::ErrorKind::UnexpectedEof => CacheError::ConnectionClosed(err.to_string()),
            _ => CacheError::Backend(err.to_string()),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::NotAnInteger { .. } | CacheError::Overflow(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::ConnectionClosed(_) => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::Serialization(_) | CacheError::Backend(_) | CacheError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
