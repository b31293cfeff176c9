//! Multicache - A key-value cache over interchangeable storage engines
//!
//! One contract (set, get, has, delete, delete_all, increase, decrease, ttl)
//! with lazy TTL expiration, served by memory, SQLite, MySQL or memcached.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;

pub use api::AppState;
pub use cache::Store;
pub use config::Config;
pub use error::CacheError;
