//! Exercises the store only through the `CacheStorage` trait object the
//! orchestrator receives.

use porygo_cache::{CacheEntry, CacheError, CacheManager, CacheStorage};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

fn shared_store(manager: &CacheManager) -> Arc<dyn CacheStorage> {
    manager.get_or_create().unwrap()
}

#[test]
fn round_trip_before_expiry_is_identical() {
    let dir = TempDir::new().unwrap();
    let manager = CacheManager::new(dir.path().join("porygo").join("cache.db"));
    let store = shared_store(&manager);

    let expires_at = SystemTime::now() + Duration::from_secs(24 * 60 * 60);
    let written = CacheEntry::new(b"<html><title>hi</title></html>".to_vec(), expires_at);
    store.set("https://example.com", &written).unwrap();

    let read = store.get("https://example.com").unwrap().unwrap();
    assert_eq!(read.value, written.value);
    assert_eq!(read.expires_at, written.expires_at);
    assert!(read.is_valid_at(SystemTime::now()));
}

#[test]
fn lazy_expiration_is_left_to_the_caller() {
    let dir = TempDir::new().unwrap();
    let manager = CacheManager::new(dir.path().join("cache.db"));
    let store = shared_store(&manager);

    let stale = CacheEntry::new(b"old".to_vec(), SystemTime::now() - Duration::from_secs(1));
    store.set("k", &stale).unwrap();

    // The store returns expired entries as-is
    let read = store.get("k").unwrap().unwrap();
    assert!(read.is_expired());
    store.delete("k").unwrap();
    assert!(store.get("k").unwrap().is_none());
}

#[test]
fn manager_handles_second_process_style_contention() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cache.db");
    let owner = CacheManager::new(&path);
    let _store = owner.get_or_create().unwrap();

    let intruder = CacheManager::new(&path).with_lock_timeout(Duration::from_millis(50));
    let err = intruder.get_or_create().unwrap_err();
    assert!(matches!(err, CacheError::Locked { .. }));
    assert!(err.to_string().contains("in use"));

    owner.close().unwrap();
    assert!(intruder.get_or_create().is_ok());
}

#[test]
fn cache_errors_convert_to_core_errors() {
    let err: porygo_core::Error = CacheError::closed().into();
    assert!(matches!(err, porygo_core::Error::Cache { .. }));
}
