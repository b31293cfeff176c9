//! Cache Module
//!
//! One key-value contract with lazy TTL expiration, backed by process
//! memory, SQLite, MySQL or memcached.

mod distributed;
mod entry;
mod memory;
mod relational;
mod selector;
mod store;


// Re-export public types
pub use distributed::{parse_endpoints, BlobClient, DistributedStore, MemcacheClient};
pub use entry::{is_live, now_secs, remaining, CacheEntry};
pub use memory::MemoryStore;
pub use relational::{
    Dialect, MySqlDriver, RelationalStore, SqlDriver, SqlValue, SqliteDriver, StoredRow,
    LIVE_PREDICATE, MYSQL, SQLITE,
};
pub use selector::{open, BackendKind, CacheOptions};
pub use store::{apply_delta, parse_integer, Store};
