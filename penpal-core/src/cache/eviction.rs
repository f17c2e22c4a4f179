//! Caller-driven eviction policies.
//!
//! The cache never evicts on its own. A policy is applied explicitly with
//! `LetterCache::evict`, using the `cached_at` and `last_accessed` metadata.

use std::time::Duration;

use super::types::CacheDocument;

/// Combined TTL and capacity policy. Unset limits do nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvictionPolicy {
    /// Keep at most this many entries, dropping least recently accessed first.
    pub max_entries: Option<usize>,
    /// Drop entries cached longer ago than this.
    pub max_age: Option<Duration>,
}

impl EvictionPolicy {
    /// Least-recently-used capacity bound.
    pub fn lru(max_entries: usize) -> Self {
        EvictionPolicy {
            max_entries: Some(max_entries),
            max_age: None,
        }
    }

    /// Time-to-live bound on `cached_at`.
    pub fn ttl(max_age: Duration) -> Self {
        EvictionPolicy {
            max_entries: None,
            max_age: Some(max_age),
        }
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries);
        self
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }
}

/// Event ids removed by one eviction pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvictionReport {
    /// Removed for exceeding `max_age`
    pub expired: Vec<String>,
    /// Removed for exceeding `max_entries`
    pub overflow: Vec<String>,
}

impl EvictionReport {
    pub fn removed(&self) -> usize {
        self.expired.len() + self.overflow.len()
    }

    pub fn is_empty(&self) -> bool {
        self.removed() == 0
    }
}

/// Chooses which entries `policy` removes at time `now` (Unix ms).
///
/// TTL runs first; the capacity bound then applies to the survivors, oldest
/// `last_accessed` first with ties broken by event id.
pub(crate) fn select_victims(
    document: &CacheDocument,
    policy: &EvictionPolicy,
    now: u64,
) -> EvictionReport {
    let mut report = EvictionReport::default();

    let mut survivors: Vec<(&String, u64)> = Vec::with_capacity(document.len());
    for (event_id, record) in document {
        let expired = policy.max_age.is_some_and(|max_age| {
            now.saturating_sub(record.cached_at) > max_age.as_millis() as u64
        });
        if expired {
            report.expired.push(event_id.clone());
        } else {
            survivors.push((event_id, record.last_accessed));
        }
    }

    if let Some(max_entries) = policy.max_entries {
        if survivors.len() > max_entries {
            survivors.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
            let excess = survivors.len() - max_entries;
            report.overflow = survivors
                .into_iter()
                .take(excess)
                .map(|(id, _)| id.clone())
                .collect();
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::types::{CacheRecord, DecryptedLetter};

    fn record(cached_at: u64, last_accessed: u64) -> CacheRecord {
        CacheRecord {
            decrypted_content: DecryptedLetter {
                from: "abc".into(),
                subject: None,
                content: "x".into(),
                received_at: 0,
            },
            cached_at,
            last_accessed,
        }
    }

    #[test]
    fn test_empty_policy_removes_nothing() {
        let mut doc = CacheDocument::new();
        doc.insert("a".into(), record(0, 0));
        assert!(select_victims(&doc, &EvictionPolicy::default(), 1_000_000).is_empty());
    }

    #[test]
    fn test_ttl_then_lru() {
        let mut doc = CacheDocument::new();
        doc.insert("old".into(), record(0, 500));
        doc.insert("a".into(), record(900, 950));
        doc.insert("b".into(), record(900, 920));
        doc.insert("c".into(), record(900, 990));

        let policy = EvictionPolicy::ttl(Duration::from_millis(500)).with_max_entries(2);
        let report = select_victims(&doc, &policy, 1000);

        assert_eq!(report.expired, vec!["old".to_string()]);
        assert_eq!(report.overflow, vec!["b".to_string()]);
        assert_eq!(report.removed(), 2);
    }
}
