// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tests for the decrypted letter cache
//!
//! Scenarios:
//! - Identity isolation and sign-out
//! - Idempotent writes and read-modify-write across handles
//! - Self-healing on corrupt documents
//! - File and SQLite persistence, including threads sharing one file store
//! - Explicit eviction

use std::sync::Arc;
use std::time::Duration;

use penpal_core::cache::*;
use tempfile::TempDir;

fn letter(content: &str) -> DecryptedLetter {
    DecryptedLetter {
        from: "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798".into(),
        subject: Some("Hello".into()),
        content: content.into(),
        received_at: 1_700_000_000_000,
    }
}

#[test]
fn test_identity_isolation() {
    let store = Arc::new(MemoryStore::new());
    let abc = LetterCache::for_identity(Arc::clone(&store), Some("abc"));
    let def = LetterCache::for_identity(Arc::clone(&store), Some("def"));
    let anonymous = LetterCache::for_identity(Arc::clone(&store), None);

    abc.put("E1", letter("for abc")).unwrap();

    assert!(abc.has("E1"));
    assert!(!def.has("E1"));
    assert!(def.get("E1").is_none());
    assert!(!anonymous.has("E1"));
}

#[test]
fn test_identity_named_anonymous_is_isolated() {
    let store = Arc::new(MemoryStore::new());
    let anonymous = LetterCache::for_identity(Arc::clone(&store), None);
    let named = LetterCache::for_identity(Arc::clone(&store), Some("Anonymous"));

    anonymous.put("E1", letter("signed out")).unwrap();
    named.put("E2", letter("named")).unwrap();

    assert!(!named.has("E1"));
    assert!(!anonymous.has("E2"));

    named.clear().unwrap();
    assert!(anonymous.has("E1"));
    assert_eq!(store.len(), 1);
}

#[test]
fn test_switching_identity_hides_letters() {
    let cache = LetterCache::for_identity(MemoryStore::new(), Some("abc"));
    cache.put("E1", letter("secret")).unwrap();

    let cache = cache.switch_identity(Some("def"));
    assert_eq!(cache.scope(), &CacheScope::Identity("def".into()));
    assert!(!cache.has("E1"));

    let cache = cache.switch_identity(Some("ABC"));
    assert!(cache.has("E1"));
}

#[test]
fn test_clear_only_affects_own_scope() {
    let store = Arc::new(MemoryStore::new());
    let abc = LetterCache::for_identity(Arc::clone(&store), Some("abc"));
    let def = LetterCache::for_identity(Arc::clone(&store), Some("def"));
    abc.put("E1", letter("a")).unwrap();
    def.put("E2", letter("d")).unwrap();

    abc.clear().unwrap();

    assert!(!abc.has("E1"));
    assert!(def.has("E2"));
}

#[test]
fn test_sign_out_clears_and_returns_store() {
    let store = Arc::new(MemoryStore::new());
    let abc = LetterCache::for_identity(Arc::clone(&store), Some("abc"));
    abc.put("E1", letter("a")).unwrap();

    let store = abc.sign_out().unwrap();
    assert!(store.is_empty());
}

#[test]
fn test_put_is_idempotent() {
    let cache = LetterCache::for_identity(MemoryStore::new(), Some("abc"));
    cache.put("E1", letter("v")).unwrap();
    cache.put("E1", letter("v")).unwrap();

    assert_eq!(cache.get("E1").unwrap().decrypted, letter("v"));
    assert_eq!(cache.stats().count, 1);
    assert_eq!(cache.entries().len(), 1);
}

#[test]
fn test_recache_overwrites_content() {
    let cache = LetterCache::for_identity(MemoryStore::new(), Some("abc"));
    cache.put("E1", letter("first")).unwrap();
    cache.put("E1", letter("second")).unwrap();

    let cached = cache.get("E1").unwrap();
    assert_eq!(cached.event_id, "E1");
    assert_eq!(cached.decrypted.content, "second");
}

#[test]
fn test_writes_from_other_handles_are_preserved() {
    // Two handles on the same scope, like two windows of one profile
    let store = Arc::new(MemoryStore::new());
    let first = LetterCache::for_identity(Arc::clone(&store), Some("abc"));
    let second = LetterCache::for_identity(Arc::clone(&store), Some("abc"));

    first.put("E1", letter("one")).unwrap();
    second.put("E2", letter("two")).unwrap();
    first.put("E3", letter("three")).unwrap();

    let ids: Vec<String> = second.entries().into_iter().map(|l| l.event_id).collect();
    assert_eq!(ids, vec!["E1", "E2", "E3"]);
}

#[test]
fn test_corrupt_document_self_heals() {
    let store = Arc::new(MemoryStore::new());
    let key = CacheScope::for_identity(Some("abc")).storage_key();
    store.save(&key, "{not json").unwrap();

    let cache = LetterCache::for_identity(Arc::clone(&store), Some("abc"));
    assert!(!cache.has("E1"));
    assert_eq!(cache.stats().count, 0);

    cache.put("E1", letter("fresh")).unwrap();
    assert_eq!(cache.get("E1").unwrap().decrypted.content, "fresh");
}

#[test]
fn test_stats_reports_range_and_size() {
    let clock = Arc::new(ManualClock::new(1_000));
    let cache = LetterCache::for_identity(MemoryStore::new(), Some("abc"))
        .with_clock(clock.clone());

    cache.put("E1", letter("a")).unwrap();
    clock.advance(500);
    cache.put("E2", letter("b")).unwrap();

    let stats = cache.stats();
    assert_eq!(stats.count, 2);
    assert_eq!(stats.oldest_cached_at, Some(1_000));
    assert_eq!(stats.newest_cached_at, Some(1_500));
    assert!(stats.approximate_byte_size > 0);
}

#[test]
fn test_eviction_by_age() {
    let clock = Arc::new(ManualClock::new(0));
    let cache = LetterCache::for_identity(MemoryStore::new(), Some("abc"))
        .with_clock(clock.clone());

    cache.put("old", letter("a")).unwrap();
    clock.advance(10_000);
    cache.put("new", letter("b")).unwrap();
    clock.advance(1_000);

    let report = cache
        .evict(&EvictionPolicy::ttl(Duration::from_secs(5)))
        .unwrap();
    assert_eq!(report.expired, vec!["old".to_string()]);
    assert!(!cache.has("old"));
    assert!(cache.has("new"));
}

#[test]
fn test_eviction_by_recency() {
    let clock = Arc::new(ManualClock::new(0));
    let cache = LetterCache::for_identity(MemoryStore::new(), Some("abc"))
        .with_clock(clock.clone());

    for id in ["E1", "E2", "E3"] {
        cache.put(id, letter(id)).unwrap();
        clock.advance(10);
    }
    // Reading E1 makes E2 the least recently used
    cache.touch("E1").unwrap();

    let report = cache.evict(&EvictionPolicy::lru(2)).unwrap();
    assert_eq!(report.overflow, vec!["E2".to_string()]);
    assert!(cache.has("E1"));
    assert!(cache.has("E3"));
}

#[test]
fn test_eviction_never_runs_implicitly() {
    let cache = LetterCache::for_identity(MemoryStore::new(), Some("abc"));
    for i in 0..50 {
        cache.put(&format!("E{}", i), letter("x")).unwrap();
    }
    assert_eq!(cache.stats().count, 50);
}

#[test]
fn test_file_store_persists_across_handles() {
    let temp = TempDir::new().unwrap();

    let cache = LetterCache::for_identity(FileStore::new(temp.path()).unwrap(), Some("abc"));
    cache.put("E1", letter("kept")).unwrap();
    drop(cache);

    let reopened = LetterCache::for_identity(FileStore::new(temp.path()).unwrap(), Some("abc"));
    assert_eq!(reopened.get("E1").unwrap().decrypted.content, "kept");

    let other = LetterCache::for_identity(FileStore::new(temp.path()).unwrap(), Some("def"));
    assert!(!other.has("E1"));
}

#[test]
fn test_file_store_shared_across_threads() {
    let temp = TempDir::new().unwrap();
    let store = Arc::new(FileStore::new(temp.path()).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let cache = LetterCache::for_identity(Arc::clone(&store), Some("abc"));
            std::thread::spawn(move || {
                for i in 0..50 {
                    cache
                        .put(&format!("E{}-{}", t, i), letter("threaded"))
                        .expect("put should not fail under concurrent writers");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // Concurrent read-modify-write may drop entries but never tears the document
    let key = CacheScope::for_identity(Some("abc")).storage_key();
    let raw = store.load(&key).unwrap().expect("document written");
    let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert!(doc.as_object().is_some_and(|entries| !entries.is_empty()));
}

#[test]
fn test_sqlite_store_persists_across_handles() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("letters.db");

    let cache = LetterCache::for_identity(SqliteStore::open(&path).unwrap(), Some("abc"));
    cache.put("E1", letter("kept")).unwrap();
    drop(cache);

    let reopened = LetterCache::for_identity(SqliteStore::open(&path).unwrap(), Some("abc"));
    assert!(reopened.has("E1"));
    reopened.clear().unwrap();
    assert!(!reopened.has("E1"));
}
