//! Letter cache data types

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Prefix of every scope key in the backing store.
pub const SCOPE_KEY_PREFIX: &str = "penpal.letters.";

/// Namespace of identity scopes under [`SCOPE_KEY_PREFIX`].
///
/// Keeps identity keys disjoint from the anonymous key whatever text
/// the identity holds.
const IDENTITY_NAMESPACE: &str = "id.";

/// Plaintext of a letter after successful decryption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecryptedLetter {
    /// Sender public key
    pub from: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub content: String,
    /// When the letter event was received (Unix ms)
    pub received_at: u64,
}

/// A cached letter with its freshness metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedLetter {
    pub event_id: String,
    pub decrypted: DecryptedLetter,
    /// When the entry was last written (Unix ms)
    pub cached_at: u64,
    /// When the entry was last read (Unix ms)
    pub last_accessed: u64,
}

/// Persisted form of one entry; the event id is the map key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CacheRecord {
    pub decrypted_content: DecryptedLetter,
    pub cached_at: u64,
    pub last_accessed: u64,
}

impl CacheRecord {
    pub(crate) fn into_letter(self, event_id: String) -> CachedLetter {
        CachedLetter {
            event_id,
            decrypted: self.decrypted_content,
            cached_at: self.cached_at,
            last_accessed: self.last_accessed,
        }
    }
}

/// The whole per-scope document.
pub(crate) type CacheDocument = BTreeMap<String, CacheRecord>;

/// Read-only diagnostic view of one scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub count: usize,
    pub oldest_cached_at: Option<u64>,
    pub newest_cached_at: Option<u64>,
    /// Size of the serialized document in bytes
    pub approximate_byte_size: usize,
}

/// Partition of the cache owned by one identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheScope {
    /// Normalized (trimmed, lowercase) public key
    Identity(String),
    Anonymous,
}

impl CacheScope {
    /// Scope for an optional signed-in identity.
    ///
    /// A missing or blank key selects the anonymous scope.
    pub fn for_identity(pubkey: Option<&str>) -> Self {
        match pubkey.map(str::trim) {
            Some(key) if !key.is_empty() => CacheScope::Identity(key.to_ascii_lowercase()),
            _ => CacheScope::Anonymous,
        }
    }

    /// Key of this scope's document in the backing store.
    pub fn storage_key(&self) -> String {
        match self {
            CacheScope::Identity(pubkey) => {
                format!("{}{}{}", SCOPE_KEY_PREFIX, IDENTITY_NAMESPACE, pubkey)
            }
            CacheScope::Anonymous => format!("{}anonymous", SCOPE_KEY_PREFIX),
        }
    }
}

/// Source of cache timestamps.
pub trait Clock: Send + Sync {
    /// Current time in Unix milliseconds.
    fn now_millis(&self) -> u64;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Manually driven clock for deterministic eviction.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(now_millis: u64) -> Self {
        ManualClock {
            now: AtomicU64::new(now_millis),
        }
    }

    pub fn set(&self, now_millis: u64) {
        self.now.store(now_millis, Ordering::SeqCst);
    }

    pub fn advance(&self, millis: u64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}
