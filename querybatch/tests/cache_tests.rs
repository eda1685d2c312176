//! Tests for the cache store across backends
//!
//! Durable storage uses a temporary sled directory per test.

#[path = "testutils/mod.rs"]
mod testutils;

use querybatch::cache::{
    CacheBackend, CacheStoreOptions, CookieJar, ManualClock, PersistentCache,
};
use querybatch::storage::MemoryTree;
use querybatch::{CacheStore, CacheType, ResolvedCache};
use serde_json::json;
use std::sync::Arc;

fn durable_options(dir: &tempfile::TempDir) -> CacheStoreOptions {
    CacheStoreOptions {
        local_storage_path: Some(dir.path().join("local")),
        ..CacheStoreOptions::default()
    }
}

#[test]
fn test_local_storage_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(1_000));
    let cache = ResolvedCache::new(CacheType::LocalStorage, "nations?{}", 60_000);

    {
        let store = CacheStore::open(&durable_options(&dir), clock.clone());
        store.save(&cache, &json!([{"id": 1}]));
    }

    let store = CacheStore::open(&durable_options(&dir), clock.clone());
    assert_eq!(store.load(&cache), Some(json!([{"id": 1}])));

    clock.advance(60_000);
    assert_eq!(store.load(&cache), None);
    let counts = store.entry_counts();
    assert!(counts.contains(&(CacheType::LocalStorage, 0)));
}

#[test]
fn test_legacy_expires_field_is_read() {
    let clock = Arc::new(ManualClock::new(1_000));
    let backend = PersistentCache::new(
        CacheType::LocalStorage,
        Box::new(MemoryTree::new()),
        clock.clone(),
    );
    backend
        .set_raw("k", br#"{"data": {"ok": true}, "expires": 5000}"#)
        .unwrap();

    assert_eq!(backend.get("k").unwrap(), Some(json!({"ok": true})));
    clock.set(5_000);
    assert_eq!(backend.get("k").unwrap(), None);
}

#[test]
fn test_corrupt_persisted_entry_is_removed() {
    testutils::init_logging();
    let clock = Arc::new(ManualClock::new(0));
    let backend = Arc::new(PersistentCache::new(
        CacheType::SessionStorage,
        Box::new(MemoryTree::new()),
        clock.clone(),
    ));
    backend.set_raw("broken", b"{not json").unwrap();
    backend.set_raw("half", br#"{"data": 1}"#).unwrap();

    let store = CacheStore::from_backends(vec![backend.clone() as Arc<dyn CacheBackend>], clock);
    let broken = ResolvedCache::new(CacheType::SessionStorage, "broken", 1_000);
    assert_eq!(store.load(&broken), None);
    assert_eq!(backend.len().unwrap(), 1);

    // The sweep removes what reads have not reached yet
    assert_eq!(store.purge_expired(), 1);
    assert_eq!(backend.len().unwrap(), 0);
}

#[test]
fn test_oversized_cookie_is_a_miss() {
    let clock = Arc::new(ManualClock::new(0));
    let jar = Arc::new(CookieJar::new(clock.clone(), 64));
    let store = CacheStore::from_backends(vec![jar.clone() as Arc<dyn CacheBackend>], clock);

    let cache = ResolvedCache::new(CacheType::Cookie, "big", 10_000);
    store.save(&cache, &json!("x".repeat(100)));
    assert_eq!(store.load(&cache), None);

    store.save(&cache, &json!("small"));
    assert_eq!(store.load(&cache), Some(json!("small")));
    assert_eq!(jar.raw("big").as_deref(), Some("\"small\""));
}

#[test]
fn test_oversized_cookie_evicts_previous_value() {
    testutils::init_logging();
    let clock = Arc::new(ManualClock::new(0));
    let jar = Arc::new(CookieJar::new(clock.clone(), 64));
    let store = CacheStore::from_backends(vec![jar.clone() as Arc<dyn CacheBackend>], clock);

    let cache = ResolvedCache::new(CacheType::Cookie, "nation", 10_000);
    store.save(&cache, &json!("old"));
    assert_eq!(store.load(&cache), Some(json!("old")));

    store.save(&cache, &json!("x".repeat(100)));
    assert_eq!(store.load(&cache), None);
    assert_eq!(jar.raw("nation"), None);
}

#[test]
fn test_unparsable_cookie_is_removed() {
    let clock = Arc::new(ManualClock::new(0));
    let jar = CookieJar::new(clock, 4096);
    jar.set_raw("c", "{oops".to_string(), 1_000).unwrap();

    assert_eq!(jar.get("c").unwrap(), None);
    assert_eq!(jar.raw("c"), None);
}

#[test]
fn test_same_key_in_two_backends_is_independent() {
    let clock = Arc::new(ManualClock::new(0));
    let store = CacheStore::open(&CacheStoreOptions::default(), clock);

    let memory = ResolvedCache::new(CacheType::Memory, "shared", 1_000);
    let session = ResolvedCache::new(CacheType::SessionStorage, "shared", 1_000);
    store.save(&memory, &json!("memory"));
    store.save(&session, &json!("session"));

    assert_eq!(store.load(&memory), Some(json!("memory")));
    assert_eq!(store.load(&session), Some(json!("session")));

    // Last writer wins within one backend
    store.save(&ResolvedCache::new(CacheType::Memory, "shared", 50), &json!("newer"));
    assert_eq!(store.load(&memory), Some(json!("newer")));
}
