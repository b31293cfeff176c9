//! Cache Entry Module
//!
//! Defines the record stored by every backend and the expiration policy
//! that decides whether a record is still live.

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

// == Cache Entry ==
/// A stored value plus the metadata needed to evaluate liveness.
///
/// The distributed backend serializes this struct as the blob itself, so
/// field names are part of the stored format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The stored value
    pub value: String,
    /// Creation timestamp (Unix seconds), fixed at write time
    pub created_at: i64,
    /// Time to live in seconds, None = never expires
    pub ttl: Option<u64>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry stamped with the current time.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `ttl` - Optional time to live, truncated to whole seconds
    pub fn new(value: String, ttl: Option<Duration>) -> Self {
        Self::with_created_at(value, ttl, now_secs())
    }

    /// Creates an entry with an explicit creation timestamp.
    pub fn with_created_at(value: String, ttl: Option<Duration>, created_at: i64) -> Self {
        Self {
            value,
            created_at,
            ttl: ttl_secs(ttl),
        }
    }

    // == Liveness ==
    /// Checks whether the entry is still live right now.
    pub fn is_live(&self) -> bool {
        self.is_live_at(now_secs())
    }

    /// Checks whether the entry is live at the given Unix second.
    pub fn is_live_at(&self, now: i64) -> bool {
        is_live(self.created_at, self.ttl, now)
    }

    // == Time To Live ==
    /// Returns the remaining lifetime, or None if the entry never expires.
    pub fn ttl_remaining(&self) -> Option<Duration> {
        remaining(self.created_at, self.ttl, now_secs())
    }
}

// == Expiration Policy ==
/// Decides liveness from a creation timestamp and TTL.
///
/// An entry is live iff it never expires, or `now - created_at <= ttl`.
/// Every backend funnels through this function; the relational backends
/// additionally express it as [`crate::cache::LIVE_PREDICATE`].
pub fn is_live(created_at: i64, ttl: Option<u64>, now: i64) -> bool {
    match ttl {
        None => true,
        Some(ttl) => {
            let elapsed = now.saturating_sub(created_at);
            elapsed <= 0 || elapsed.unsigned_abs() <= ttl
        }
    }
}

/// Remaining lifetime at `now`, saturating at zero. None = never expires.
pub fn remaining(created_at: i64, ttl: Option<u64>, now: i64) -> Option<Duration> {
    ttl.map(|ttl| {
        let elapsed = now.saturating_sub(created_at).max(0).unsigned_abs();
        Duration::from_secs(ttl.saturating_sub(elapsed))
    })
}

// == Utility Functions ==
/// Returns the current Unix timestamp in seconds.
pub fn now_secs() -> i64 {
    Utc::now().timestamp()
}

/// Converts an optional TTL into whole seconds.
pub fn ttl_secs(ttl: Option<Duration>) -> Option<u64> {
    ttl.map(|ttl| ttl.as_secs())
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creation_no_ttl() {
        let entry = CacheEntry::new("test_value".to_string(), None);

        assert_eq!(entry.value, "test_value");
        assert!(entry.ttl.is_none());
        assert!(entry.is_live());
        assert!(entry.ttl_remaining().is_none());
    }

    #[test]
    fn test_entry_creation_with_ttl() {
        let entry = CacheEntry::new("test_value".to_string(), Some(Duration::from_secs(60)));

        assert_eq!(entry.ttl, Some(60));
        assert!(entry.is_live());
    }

    #[test]
    fn test_ttl_truncated_to_seconds() {
        let entry = CacheEntry::with_created_at("v".to_string(), Some(Duration::from_millis(1999)), 0);
        assert_eq!(entry.ttl, Some(1));
    }

    #[test]
    fn test_liveness_boundary() {
        // Live while elapsed <= ttl, dead one second later
        assert!(is_live(100, Some(10), 110));
        assert!(!is_live(100, Some(10), 111));
    }

    #[test]
    fn test_zero_ttl_is_real_expiry() {
        assert!(is_live(100, Some(0), 100));
        assert!(!is_live(100, Some(0), 101));
    }

    #[test]
    fn test_never_expires() {
        assert!(is_live(0, None, i64::MAX));
    }

    #[test]
    fn test_clock_behind_creation_is_live() {
        assert!(is_live(200, Some(5), 150));
    }

    #[test]
    fn test_remaining() {
        assert_eq!(remaining(100, Some(10), 104), Some(Duration::from_secs(6)));
        assert_eq!(remaining(100, Some(10), 500), Some(Duration::ZERO));
        assert_eq!(remaining(100, None, 500), None);
    }

    #[test]
    fn test_entry_live_at() {
        let entry = CacheEntry::with_created_at("v".to_string(), Some(Duration::from_secs(2)), 1_000);

        assert!(entry.is_live_at(1_002));
        assert!(!entry.is_live_at(1_003));
    }

    #[test]
    fn test_entry_json_shape() {
        let entry = CacheEntry::with_created_at("42".to_string(), None, 7);
        let json = serde_json::to_string(&entry).unwrap();

        assert_eq!(json, r#"{"value":"42","created_at":7,"ttl":null}"#);
        let back: CacheEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }
}
