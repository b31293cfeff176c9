//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;

use crate::cache::{BackendKind, CacheOptions};
use crate::error::{CacheError, Result};

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Storage engine to open at startup
    pub backend: BackendKind,
    /// Backend connection string (DSN, file path or endpoint list)
    pub source: String,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_BACKEND` - memory, mysql, sqlite or memcache (default: memory)
    /// - `CACHE_SOURCE` - Backend connection string (default: empty)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a Config from any variable lookup.
    ///
    /// An unknown backend name or a malformed port is rejected rather than
    /// silently replaced by the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let backend = match lookup("CACHE_BACKEND") {
            Some(name) if !name.trim().is_empty() => name.parse()?,
            _ => defaults.backend,
        };

        let server_port = match lookup("SERVER_PORT") {
            Some(port) => port
                .trim()
                .parse()
                .map_err(|_| CacheError::Config(format!("Invalid SERVER_PORT: {}", port)))?,
            None => defaults.server_port,
        };

        Ok(Self {
            backend,
            source: lookup("CACHE_SOURCE").unwrap_or(defaults.source),
            server_port,
        })
    }

    /// The backend portion of the configuration.
    pub fn cache_options(&self) -> CacheOptions {
        CacheOptions::new(self.backend, self.source.clone())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendKind::Memory,
            source: String::new(),
            server_port: 3000,
        }
    }
}
