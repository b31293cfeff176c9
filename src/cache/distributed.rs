//! Distributed Object Store
//!
//! Network cache backend storing each [`CacheEntry`] as a JSON blob. The
//! service's own expiry is never used (always written as `0`); liveness is
//! decided locally after deserializing, exactly as the memory store does.
//!
//! Arithmetic is read-modify-write with a conditional `replace`, so a key
//! deleted mid-update is not resurrected. Two clients incrementing the same
//! key concurrently can still lose an update: nothing coordinates the read
//! with the write.

use std::time::Duration;

use memcache::{CommandError, MemcacheError};
use tracing::{debug, info};

use crate::cache::entry::CacheEntry;
use crate::cache::store::{apply_delta, purge_outcome, Store};
use crate::error::{CacheError, Result};

// == Blob Client Trait ==
/// Opaque key/blob operations the remote service must offer.
pub trait BlobClient: Send + Sync {
    /// Fetches a blob; `None` on a cache miss.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores a blob unconditionally.
    fn set(&self, key: &str, blob: &str) -> Result<()>;

    /// Stores a blob only if the key exists. Returns false if it did not.
    fn replace(&self, key: &str, blob: &str) -> Result<bool>;

    /// Removes a key. Returns false if it did not exist.
    fn delete(&self, key: &str) -> Result<bool>;

    /// Removes every key.
    fn flush(&self) -> Result<()>;
}

// == Memcache Client ==
impl From<MemcacheError> for CacheError {
    fn from(err: MemcacheError) -> Self {
        match &err {
            MemcacheError::IOError(io) => CacheError::from_io(io),
            // Every connection checkout goes through the pool
            MemcacheError::PoolError(_) => CacheError::ConnectionClosed(err.to_string()),
            MemcacheError::BadURL(_) => CacheError::Config(err.to_string()),
            _ => CacheError::Backend(err.to_string()),
        }
    }
}

/// Splits a `;`-separated endpoint list into memcache URLs.
///
/// The ASCII protocol is refused: its `replace` reports `NOT_STORED` as
/// success, which would hide a key deleted during arithmetic.
pub fn parse_endpoints(source: &str) -> Result<Vec<String>> {
    let endpoints: Vec<String> = source
        .split(';')
        .map(str::trim)
        .filter(|endpoint| !endpoint.is_empty())
        .map(|endpoint| {
            if endpoint.contains("://") {
                endpoint.to_string()
            } else {
                format!("memcache://{endpoint}")
            }
        })
        .collect();

    if endpoints.is_empty() {
        return Err(CacheError::Config(
            "memcache backend needs at least one endpoint".to_string(),
        ));
    }
    if let Some(ascii) = endpoints
        .iter()
        .find(|endpoint| endpoint.contains("protocol=ascii"))
    {
        return Err(CacheError::Config(format!(
            "memcache endpoint {ascii} uses the ascii protocol; only binary is supported"
        )));
    }
    Ok(endpoints)
}

/// memcached client over one or more servers.
pub struct MemcacheClient {
    client: memcache::Client,
}

impl MemcacheClient {
    /// Connects to every endpoint in a `;`-separated list.
    pub fn connect(source: &str) -> Result<Self> {
        let endpoints = parse_endpoints(source)?;
        let count = endpoints.len();
        let client = memcache::Client::connect(endpoints)?;
        info!(servers = count, "Connected to memcached");
        Ok(Self { client })
    }
}

impl BlobClient for MemcacheClient {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.client.get::<String>(key)?)
    }

    fn set(&self, key: &str, blob: &str) -> Result<()> {
        Ok(self.client.set(key, blob, 0)?)
    }

    fn replace(&self, key: &str, blob: &str) -> Result<bool> {
        replace_outcome(self.client.replace(key, blob, 0))
    }

    fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.client.delete(key)?)
    }

    fn flush(&self) -> Result<()> {
        Ok(self.client.flush()?)
    }
}

/// Only a missing key is a refused replace; other command errors propagate.
fn replace_outcome(result: std::result::Result<(), MemcacheError>) -> Result<bool> {
    match result {
        Ok(()) => Ok(true),
        Err(MemcacheError::CommandError(CommandError::KeyNotFound)) => Ok(false),
        Err(err) => Err(err.into()),
    }
}

// == Distributed Store ==
/// Store over a remote blob service.
pub struct DistributedStore<C> {
    client: C,
}

impl<C: BlobClient> DistributedStore<C> {
    // == Constructor ==
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Fetches, decodes and liveness-checks an entry.
    fn load(&self, key: &str) -> Result<CacheEntry> {
        let blob = self
            .client
            .get(key)?
            .ok_or_else(|| CacheError::NotFound(key.to_string()))?;
        let entry: CacheEntry = serde_json::from_str(&blob)?;

        if !entry.is_live() {
            let outcome = self.client.delete(key).map(|_| ());
            debug!(key, "Purged expired blob");
            purge_outcome(self.name(), key, outcome);
            return Err(CacheError::NotFound(key.to_string()));
        }
        Ok(entry)
    }
}

impl<C: BlobClient> Store for DistributedStore<C> {
    fn name(&self) -> &'static str {
        "memcache"
    }

    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let entry = CacheEntry::new(value.to_string(), ttl);
        let blob = serde_json::to_string(&entry)?;
        self.client.set(key, &blob)
    }

    fn get(&self, key: &str) -> Result<String> {
        self.load(key).map(|entry| entry.value)
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.load(key)?;
        if self.client.delete(key)? {
            Ok(())
        } else {
            Err(CacheError::NotFound(key.to_string()))
        }
    }

    fn delete_all(&self) -> Result<()> {
        self.client.flush()
    }

    fn adjust(&self, key: &str, delta: i64) -> Result<()> {
        let mut entry = self.load(key)?;
        entry.value = apply_delta(key, &entry.value, delta)?;
        let blob = serde_json::to_string(&entry)?;

        if self.client.replace(key, &blob)? {
            Ok(())
        } else {
            Err(CacheError::NotFound(key.to_string()))
        }
    }

    fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        self.load(key).map(|entry| entry.ttl_remaining())
    }
}
