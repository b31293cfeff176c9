//! Response DTOs for the cache server API
//!
//! Defines the structure of outgoing HTTP response bodies.

use std::time::Duration;

use serde::Serialize;

/// Response body for GET /get/:key and GET /hits
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// The requested key
    pub key: String,
    /// The stored value
    pub value: String,
}

impl GetResponse {
    /// Creates a new GetResponse
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Response body for GET /has/:key
#[derive(Debug, Clone, Serialize)]
pub struct HasResponse {
    pub key: String,
    /// Whether a live entry exists
    pub exists: bool,
}

impl HasResponse {
    pub fn new(key: impl Into<String>, exists: bool) -> Self {
        Self {
            key: key.into(),
            exists,
        }
    }
}

/// Response body for GET /ttl/:key
#[derive(Debug, Clone, Serialize)]
pub struct TtlResponse {
    pub key: String,
    /// Remaining seconds, null = never expires
    pub ttl: Option<u64>,
}

impl TtlResponse {
    pub fn new(key: impl Into<String>, remaining: Option<Duration>) -> Self {
        Self {
            key: key.into(),
            ttl: remaining.map(|ttl| ttl.as_secs()),
        }
    }
}

/// Acknowledgement for mutating operations
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    /// Success message
    pub message: String,
    /// The key acted on, absent for whole-cache operations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl MessageResponse {
    /// Key was stored (PUT /set)
    pub fn set(key: impl Into<String>) -> Self {
        Self::for_key(key, "set")
    }

    /// Key was removed (DELETE /del/:key)
    pub fn deleted(key: impl Into<String>) -> Self {
        Self::for_key(key, "deleted")
    }

    /// Key was incremented (POST /incr/:key)
    pub fn increased(key: impl Into<String>) -> Self {
        Self::for_key(key, "increased")
    }

    /// Key was decremented (POST /decr/:key)
    pub fn decreased(key: impl Into<String>) -> Self {
        Self::for_key(key, "decreased")
    }

    /// Every key was removed (DELETE /flush)
    pub fn flushed() -> Self {
        Self {
            message: "All keys deleted successfully".to_string(),
            key: None,
        }
    }

    fn for_key(key: impl Into<String>, action: &str) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' {} successfully", key, action),
            key: Some(key),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Name of the configured backend
    pub backend: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy(backend: impl Into<String>) -> Self {
        Self {
            status: "healthy".to_string(),
            backend: backend.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
