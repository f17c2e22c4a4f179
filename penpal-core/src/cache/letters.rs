// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Decrypted letter cache
//!
//! A [`LetterCache`] is a handle bound to one identity scope. Every mutation
//! re-reads the scope document from the store, applies the change and writes
//! the whole document back, so entries written by another handle in the
//! meantime are kept. Concurrent updates to the same entry are
//! last-writer-wins.
//!
//! Unreadable documents are treated as empty: the cache can always be
//! rebuilt by decrypting again.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use super::eviction::{select_victims, EvictionPolicy, EvictionReport};
use super::store::{LetterStore, StoreError};
use super::types::{
    CacheDocument, CacheRecord, CacheScope, CacheStats, CachedLetter, Clock, DecryptedLetter,
    SystemClock,
};

/// Errors that can occur when writing to the letter cache
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid event id: {0:?}")]
    InvalidEventId(String),
}

/// Per-identity cache of decrypted letters.
pub struct LetterCache<S: LetterStore> {
    store: S,
    scope: CacheScope,
    key: String,
    clock: Arc<dyn Clock>,
}

impl<S: LetterStore> LetterCache<S> {
    /// Opens the cache for `scope` on `store`.
    pub fn new(store: S, scope: CacheScope) -> Self {
        let key = scope.storage_key();
        LetterCache {
            store,
            scope,
            key,
            clock: Arc::new(SystemClock),
        }
    }

    /// Opens the cache for a signed-in identity, or the anonymous scope.
    pub fn for_identity(store: S, pubkey: Option<&str>) -> Self {
        Self::new(store, CacheScope::for_identity(pubkey))
    }

    /// Replaces the timestamp source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn scope(&self) -> &CacheScope {
        &self.scope
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn has(&self, event_id: &str) -> bool {
        self.load_document().contains_key(event_id)
    }

    pub fn get(&self, event_id: &str) -> Option<CachedLetter> {
        self.load_document()
            .remove(event_id)
            .map(|record| record.into_letter(event_id.to_string()))
    }

    /// Stores or overwrites a letter, stamping both timestamps with now.
    pub fn put(&self, event_id: &str, decrypted: DecryptedLetter) -> Result<(), CacheError> {
        if event_id.trim().is_empty() {
            return Err(CacheError::InvalidEventId(event_id.to_string()));
        }

        let now = self.clock.now_millis();
        let mut document = self.load_document();
        document.insert(
            event_id.to_string(),
            CacheRecord {
                decrypted_content: decrypted,
                cached_at: now,
                last_accessed: now,
            },
        );
        self.save_document(&document)?;
        debug!(scope = %self.key, event_id, "letter cached");
        Ok(())
    }

    /// Marks a letter as read from cache. Returns false if it is not cached.
    pub fn touch(&self, event_id: &str) -> Result<bool, CacheError> {
        let mut document = self.load_document();
        match document.get_mut(event_id) {
            Some(record) => {
                record.last_accessed = self.clock.now_millis();
                self.save_document(&document)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Removes one letter. Returns false if it was not cached.
    pub fn remove(&self, event_id: &str) -> Result<bool, CacheError> {
        let mut document = self.load_document();
        if document.remove(event_id).is_none() {
            return Ok(false);
        }
        self.save_document(&document)?;
        Ok(true)
    }

    /// Empties this scope. Other scopes are untouched.
    pub fn clear(&self) -> Result<(), CacheError> {
        self.store.remove(&self.key)?;
        debug!(scope = %self.key, "letter cache cleared");
        Ok(())
    }

    /// All cached letters in event id order.
    pub fn entries(&self) -> Vec<CachedLetter> {
        self.load_document()
            .into_iter()
            .map(|(event_id, record)| record.into_letter(event_id))
            .collect()
    }

    pub fn stats(&self) -> CacheStats {
        let (document, byte_size) = self.load_document_sized();
        CacheStats {
            count: document.len(),
            oldest_cached_at: document.values().map(|r| r.cached_at).min(),
            newest_cached_at: document.values().map(|r| r.cached_at).max(),
            approximate_byte_size: byte_size,
        }
    }

    /// Applies `policy` once and reports what was removed.
    pub fn evict(&self, policy: &EvictionPolicy) -> Result<EvictionReport, CacheError> {
        let mut document = self.load_document();
        let report = select_victims(&document, policy, self.clock.now_millis());
        if report.is_empty() {
            return Ok(report);
        }

        for event_id in report.expired.iter().chain(report.overflow.iter()) {
            document.remove(event_id);
        }
        self.save_document(&document)?;
        debug!(
            scope = %self.key,
            expired = report.expired.len(),
            overflow = report.overflow.len(),
            "letter cache evicted"
        );
        Ok(report)
    }

    /// Clears this scope and tears the handle down, returning the store.
    pub fn sign_out(self) -> Result<S, CacheError> {
        self.clear()?;
        Ok(self.store)
    }

    /// Rebinds the store to another identity without touching either scope.
    pub fn switch_identity(self, pubkey: Option<&str>) -> LetterCache<S> {
        let clock = Arc::clone(&self.clock);
        LetterCache::for_identity(self.store, pubkey).with_clock(clock)
    }

    fn load_document(&self) -> CacheDocument {
        self.load_document_sized().0
    }

    fn load_document_sized(&self) -> (CacheDocument, usize) {
        let raw = match self.store.load(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return (CacheDocument::new(), 0),
            Err(e) => {
                warn!(scope = %self.key, error = %e, "letter cache unreadable, treating as empty");
                return (CacheDocument::new(), 0);
            }
        };

        match serde_json::from_str::<CacheDocument>(&raw) {
            Ok(document) => (document, raw.len()),
            Err(e) => {
                warn!(scope = %self.key, error = %e, "letter cache corrupt, treating as empty");
                (CacheDocument::new(), 0)
            }
        }
    }

    fn save_document(&self, document: &CacheDocument) -> Result<(), CacheError> {
        if document.is_empty() {
            self.store.remove(&self.key)?;
            return Ok(());
        }
        let raw = serde_json::to_string(document)?;
        self.store.save(&self.key, &raw)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{ManualClock, MemoryStore};

    fn letter(content: &str) -> DecryptedLetter {
        DecryptedLetter {
            from: "abc".into(),
            subject: Some("greetings".into()),
            content: content.into(),
            received_at: 7,
        }
    }

    #[test]
    fn test_put_sets_both_timestamps() {
        let clock = Arc::new(ManualClock::new(1_000));
        let cache = LetterCache::for_identity(MemoryStore::new(), Some("abc"))
            .with_clock(clock.clone());

        cache.put("E1", letter("hi")).unwrap();
        let cached = cache.get("E1").unwrap();
        assert_eq!(cached.cached_at, 1_000);
        assert_eq!(cached.last_accessed, 1_000);
        assert_eq!(cached.decrypted, letter("hi"));
    }

    #[test]
    fn test_touch_updates_last_accessed_only() {
        let clock = Arc::new(ManualClock::new(1_000));
        let cache = LetterCache::for_identity(MemoryStore::new(), Some("abc"))
            .with_clock(clock.clone());
        cache.put("E1", letter("hi")).unwrap();

        clock.advance(250);
        assert!(cache.touch("E1").unwrap());
        assert!(!cache.touch("missing").unwrap());

        let cached = cache.get("E1").unwrap();
        assert_eq!(cached.cached_at, 1_000);
        assert_eq!(cached.last_accessed, 1_250);
    }

    #[test]
    fn test_blank_event_id_rejected() {
        let cache = LetterCache::for_identity(MemoryStore::new(), None);
        assert!(matches!(
            cache.put("  ", letter("x")),
            Err(CacheError::InvalidEventId(_))
        ));
    }

    #[test]
    fn test_removing_last_entry_drops_document() {
        let cache = LetterCache::for_identity(MemoryStore::new(), Some("abc"));
        cache.put("E1", letter("x")).unwrap();
        assert_eq!(cache.store().len(), 1);

        assert!(cache.remove("E1").unwrap());
        assert!(!cache.remove("E1").unwrap());
        assert!(cache.store().is_empty());
    }

    #[test]
    fn test_stats_on_empty_scope() {
        let cache = LetterCache::for_identity(MemoryStore::new(), Some("abc"));
        assert_eq!(cache.stats(), CacheStats::default());
    }
}
