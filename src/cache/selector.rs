//! Backend Selector
//!
//! Builds exactly one store from a backend kind and a connection string.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::info;

use crate::cache::distributed::{DistributedStore, MemcacheClient};
use crate::cache::memory::MemoryStore;
use crate::cache::relational::{MySqlDriver, RelationalStore, SqliteDriver, MYSQL, SQLITE};
use crate::cache::store::Store;
use crate::error::{CacheError, Result};

// == Backend Kind ==
/// The closed set of storage engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    #[default]
    Memory,
    MySql,
    Sqlite,
    Memcache,
}

impl FromStr for BackendKind {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(BackendKind::Memory),
            "mysql" => Ok(BackendKind::MySql),
            "sqlite" => Ok(BackendKind::Sqlite),
            "memcache" | "memcached" => Ok(BackendKind::Memcache),
            other => Err(CacheError::Config(format!("Unknown cache backend: {other}"))),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendKind::Memory => "memory",
            BackendKind::MySql => "mysql",
            BackendKind::Sqlite => "sqlite",
            BackendKind::Memcache => "memcache",
        };
        f.write_str(name)
    }
}

// == Cache Options ==
/// Which backend to build and how to reach it.
#[derive(Debug, Clone, Default)]
pub struct CacheOptions {
    /// Storage engine
    pub backend: BackendKind,
    /// Backend-specific connection string: a DSN for MySQL, a path for
    /// SQLite, `;`-separated endpoints for memcache. Ignored for memory.
    pub source: String,
}

impl CacheOptions {
    pub fn new(backend: BackendKind, source: impl Into<String>) -> Self {
        Self {
            backend,
            source: source.into(),
        }
    }
}

// == Factory ==
/// Constructs the configured store.
///
/// Connection and bootstrap failures surface here rather than on first use.
pub fn open(options: &CacheOptions) -> Result<Arc<dyn Store>> {
    let store: Arc<dyn Store> = match options.backend {
        BackendKind::Memory => Arc::new(MemoryStore::new()),
        BackendKind::Sqlite => {
            let path = if options.source.is_empty() {
                ":memory:"
            } else {
                options.source.as_str()
            };
            Arc::new(RelationalStore::new(SqliteDriver::open(path)?, &SQLITE)?)
        }
        BackendKind::MySql => {
            if options.source.is_empty() {
                return Err(CacheError::Config("mysql backend needs a DSN".to_string()));
            }
            Arc::new(RelationalStore::new(
                MySqlDriver::connect(&options.source)?,
                &MYSQL,
            )?)
        }
        BackendKind::Memcache => {
            Arc::new(DistributedStore::new(MemcacheClient::connect(&options.source)?))
        }
    };

    info!(backend = store.name(), "Cache store initialized");
    Ok(store)
}
