//! Store Contract Tests
//!
//! Runs the same behavioral checks against every backend that can be
//! exercised without an external server: memory, SQLite (in memory and on
//! disk) and the distributed store over an in-process blob map.

use std::collections::HashMap;
use std::sync::Mutex;
use std::thread::sleep;
use std::time::Duration;

use multicache::cache::{
    BlobClient, DistributedStore, MemoryStore, RelationalStore, SqliteDriver, Store, SQLITE,
};
use multicache::error::Result;
use multicache::CacheError;
use tempfile::TempDir;

// == Helpers ==

/// In-process stand-in for a memcached server
#[derive(Default)]
struct LocalBlobs {
    blobs: Mutex<HashMap<String, String>>,
}

impl BlobClient for LocalBlobs {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.blobs.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, blob: &str) -> Result<()> {
        self.blobs
            .lock()
            .unwrap()
            .insert(key.to_string(), blob.to_string());
        Ok(())
    }

    fn replace(&self, key: &str, blob: &str) -> Result<bool> {
        let mut blobs = self.blobs.lock().unwrap();
        match blobs.get_mut(key) {
            Some(existing) => {
                *existing = blob.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.blobs.lock().unwrap().remove(key).is_some())
    }

    fn flush(&self) -> Result<()> {
        self.blobs.lock().unwrap().clear();
        Ok(())
    }
}

/// Fresh stores for one test. The TempDir keeps the on-disk database alive.
fn backends() -> (TempDir, Vec<Box<dyn Store>>) {
    let dir = TempDir::new().unwrap();
    let file_store = RelationalStore::new(
        SqliteDriver::open(dir.path().join("contract.db")).unwrap(),
        &SQLITE,
    )
    .unwrap();
    let memory_sqlite = RelationalStore::new(SqliteDriver::open_memory().unwrap(), &SQLITE).unwrap();

    let stores: Vec<Box<dyn Store>> = vec![
        Box::new(MemoryStore::new()),
        Box::new(memory_sqlite),
        Box::new(file_store),
        Box::new(DistributedStore::new(LocalBlobs::default())),
    ];
    (dir, stores)
}

// == Contract ==

#[test]
fn test_round_trip_without_ttl() {
    let (_dir, stores) = backends();
    for store in &stores {
        store.set("user:1", "alice", None).unwrap();

        assert_eq!(store.get("user:1").unwrap(), "alice", "{}", store.name());
        assert_eq!(store.ttl("user:1").unwrap(), None, "{}", store.name());
        assert!(store.has("user:1").unwrap());
    }
}

#[test]
fn test_set_replaces_value_and_ttl() {
    let (_dir, stores) = backends();
    for store in &stores {
        store.set("k", "first", Some(Duration::from_secs(30))).unwrap();
        store.set("k", "second", None).unwrap();

        assert_eq!(store.get("k").unwrap(), "second", "{}", store.name());
        assert_eq!(store.ttl("k").unwrap(), None, "{}", store.name());
    }
}

#[test]
fn test_missing_key_behaviour() {
    let (_dir, stores) = backends();
    for store in &stores {
        assert!(store.get("absent").unwrap_err().is_not_found(), "{}", store.name());
        assert!(store.ttl("absent").unwrap_err().is_not_found(), "{}", store.name());
        assert!(store.delete("absent").unwrap_err().is_not_found(), "{}", store.name());
        assert!(store.increase("absent", 1).unwrap_err().is_not_found(), "{}", store.name());
        assert!(!store.has("absent").unwrap(), "{}", store.name());
    }
}

#[test]
fn test_expiry() {
    let (_dir, stores) = backends();
    for store in &stores {
        store.set("brief", "v", Some(Duration::from_secs(1))).unwrap();
        assert_eq!(store.get("brief").unwrap(), "v", "{}", store.name());
    }

    sleep(Duration::from_millis(2100));

    for store in &stores {
        assert!(store.get("brief").unwrap_err().is_not_found(), "{}", store.name());
        assert!(!store.has("brief").unwrap(), "{}", store.name());
        assert!(store.delete("brief").unwrap_err().is_not_found(), "{}", store.name());
        assert!(store.increase("brief", 1).unwrap_err().is_not_found(), "{}", store.name());
    }
}

#[test]
fn test_zero_ttl_is_not_infinite() {
    let (_dir, stores) = backends();
    for store in &stores {
        store.set("zero", "v", Some(Duration::ZERO)).unwrap();
    }

    sleep(Duration::from_millis(1100));

    for store in &stores {
        assert!(!store.has("zero").unwrap(), "{}", store.name());
    }
}

#[test]
fn test_delete_only_once() {
    let (_dir, stores) = backends();
    for store in &stores {
        store.set("k", "v", None).unwrap();

        store.delete("k").unwrap();
        let second = store.delete("k");
        assert!(matches!(second, Err(CacheError::NotFound(_))), "{}", store.name());
    }
}

#[test]
fn test_arithmetic() {
    let (_dir, stores) = backends();
    for store in &stores {
        store.set("counter", "10", None).unwrap();

        store.increase("counter", 5).unwrap();
        assert_eq!(store.get("counter").unwrap(), "15", "{}", store.name());

        store.decrease("counter", 20).unwrap();
        assert_eq!(store.get("counter").unwrap(), "-5", "{}", store.name());
    }
}

#[test]
fn test_arithmetic_keeps_ttl() {
    let (_dir, stores) = backends();
    for store in &stores {
        store.set("counter", "1", Some(Duration::from_secs(120))).unwrap();
        store.increase("counter", 1).unwrap();

        let remaining = store.ttl("counter").unwrap().unwrap();
        assert!(remaining > Duration::from_secs(100), "{}", store.name());
    }
}

#[test]
fn test_type_safety() {
    let (_dir, stores) = backends();
    for store in &stores {
        for value in ["not-a-number", "1.5", "007", " 3", ""] {
            store.set("k", value, None).unwrap();

            let result = store.increase("k", 1);
            assert!(
                matches!(result, Err(CacheError::NotAnInteger { .. })),
                "{} accepted {:?}",
                store.name(),
                value
            );
            assert_eq!(store.get("k").unwrap(), value, "{}", store.name());
        }
    }
}

#[test]
fn test_overflow_leaves_value() {
    let (_dir, stores) = backends();
    let max = i64::MAX.to_string();
    let min = i64::MIN.to_string();
    for store in &stores {
        store.set("hi", &max, None).unwrap();
        store.set("lo", &min, None).unwrap();

        assert!(matches!(store.increase("hi", 1), Err(CacheError::Overflow(_))));
        assert!(matches!(store.decrease("lo", 1), Err(CacheError::Overflow(_))));
        assert_eq!(store.get("hi").unwrap(), max, "{}", store.name());
        assert_eq!(store.get("lo").unwrap(), min, "{}", store.name());
    }
}

#[test]
fn test_bulk_clear() {
    let (_dir, stores) = backends();
    for store in &stores {
        let keys: Vec<String> = (0..25).map(|i| format!("key-{}", i)).collect();
        for key in &keys {
            store.set(key, "v", None).unwrap();
        }

        store.delete_all().unwrap();

        for key in &keys {
            assert!(!store.has(key).unwrap(), "{}", store.name());
        }
    }
}

#[test]
fn test_delete_all_on_empty_store() {
    let (_dir, stores) = backends();
    for store in &stores {
        assert!(store.delete_all().is_ok(), "{}", store.name());
    }
}

#[test]
fn test_sqlite_file_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("reopen.db");

    {
        let store = RelationalStore::new(SqliteDriver::open(&path).unwrap(), &SQLITE).unwrap();
        store.set("persisted", "yes", None).unwrap();
    }

    let store = RelationalStore::new(SqliteDriver::open(&path).unwrap(), &SQLITE).unwrap();
    assert_eq!(store.get("persisted").unwrap(), "yes");
}
