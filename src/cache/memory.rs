//! Local Memory Store
//!
//! Process-local HashMap backend. A single mutex covers the whole entry
//! lifecycle of each call (lookup, liveness check, lazy delete, write), so
//! arithmetic and expiry purges never race.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::debug;

use crate::cache::entry::{now_secs, CacheEntry};
use crate::cache::store::{apply_delta, Store};
use crate::error::{CacheError, Result};

// == Memory Store ==
/// In-memory backend owning a private map for its whole lifetime.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Key-value storage
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryStore {
    // == Constructor ==
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // == Length ==
    /// Number of entries physically held, expired or not.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    // == Is Empty ==
    /// Returns true if nothing is held.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

/// Looks up a live entry, removing it if it has expired.
fn live_entry<'a>(
    entries: &'a mut HashMap<String, CacheEntry>,
    key: &str,
    now: i64,
) -> Result<&'a mut CacheEntry> {
    let live = match entries.get(key) {
        Some(entry) => entry.is_live_at(now),
        None => return Err(CacheError::NotFound(key.to_string())),
    };

    if !live {
        entries.remove(key);
        debug!(key, "Purged expired entry");
        return Err(CacheError::NotFound(key.to_string()));
    }

    entries
        .get_mut(key)
        .ok_or_else(|| CacheError::NotFound(key.to_string()))
}

impl Store for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let entry = CacheEntry::new(value.to_string(), ttl);
        self.entries.lock().insert(key.to_string(), entry);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<String> {
        let mut entries = self.entries.lock();
        live_entry(&mut entries, key, now_secs()).map(|entry| entry.value.clone())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock();
        live_entry(&mut entries, key, now_secs())?;
        entries.remove(key);
        Ok(())
    }

    fn delete_all(&self) -> Result<()> {
        *self.entries.lock() = HashMap::new();
        Ok(())
    }

    fn adjust(&self, key: &str, delta: i64) -> Result<()> {
        let mut entries = self.entries.lock();
        let entry = live_entry(&mut entries, key, now_secs())?;
        entry.value = apply_delta(key, &entry.value, delta)?;
        Ok(())
    }

    fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        let mut entries = self.entries.lock();
        live_entry(&mut entries, key, now_secs()).map(|entry| entry.ttl_remaining())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread::{self, sleep};

    #[test]
    fn test_store_new() {
        let store = MemoryStore::new();
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_set_and_get() {
        let store = MemoryStore::new();

        store.set("key1", "value1", None).unwrap();

        assert_eq!(store.get("key1").unwrap(), "value1");
        assert_eq!(store.ttl("key1").unwrap(), None);
    }

    #[test]
    fn test_store_get_nonexistent() {
        let store = MemoryStore::new();

        let result = store.get("nonexistent");
        assert!(matches!(result, Err(CacheError::NotFound(_))));
        assert!(!store.has("nonexistent").unwrap());
    }

    #[test]
    fn test_store_overwrite_resets_ttl() {
        let store = MemoryStore::new();

        store.set("key1", "value1", Some(Duration::from_secs(60))).unwrap();
        store.set("key1", "value2", None).unwrap();

        assert_eq!(store.get("key1").unwrap(), "value2");
        assert_eq!(store.ttl("key1").unwrap(), None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_delete_twice() {
        let store = MemoryStore::new();

        store.set("key1", "value1", None).unwrap();
        store.delete("key1").unwrap();

        assert!(matches!(store.delete("key1"), Err(CacheError::NotFound(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_expiry_purges_entry() {
        let store = MemoryStore::new();

        store.set("key1", "value1", Some(Duration::from_secs(1))).unwrap();
        assert_eq!(store.get("key1").unwrap(), "value1");

        sleep(Duration::from_millis(2100));

        assert!(matches!(store.get("key1"), Err(CacheError::NotFound(_))));
        assert!(store.is_empty(), "expired entry should be purged on access");
        assert!(!store.has("key1").unwrap());
    }

    #[test]
    fn test_store_arithmetic_keeps_ttl() {
        let store = MemoryStore::new();

        store.set("counter", "10", Some(Duration::from_secs(300))).unwrap();
        store.increase("counter", 5).unwrap();
        assert_eq!(store.get("counter").unwrap(), "15");

        store.decrease("counter", 20).unwrap();
        assert_eq!(store.get("counter").unwrap(), "-5");

        let ttl = store.ttl("counter").unwrap().unwrap();
        assert!(ttl > Duration::from_secs(290));
    }

    #[test]
    fn test_store_arithmetic_type_error_leaves_value() {
        let store = MemoryStore::new();

        store.set("k", "not-a-number", None).unwrap();
        let result = store.increase("k", 1);

        assert!(matches!(result, Err(CacheError::NotAnInteger { .. })));
        assert_eq!(store.get("k").unwrap(), "not-a-number");
    }

    #[test]
    fn test_store_arithmetic_missing_key() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.increase("missing", 1),
            Err(CacheError::NotFound(_))
        ));
    }

    #[test]
    fn test_store_delete_all() {
        let store = MemoryStore::new();

        for i in 0..10 {
            store.set(&format!("key{i}"), "v", None).unwrap();
        }
        store.delete_all().unwrap();

        for i in 0..10 {
            assert!(!store.has(&format!("key{i}")).unwrap());
        }
    }

    #[test]
    fn test_concurrent_increments_are_not_lost() {
        let store = Arc::new(MemoryStore::new());
        store.set("counter", "0", None).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..250 {
                        store.increase("counter", 1).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.get("counter").unwrap(), "2000");
    }
}
