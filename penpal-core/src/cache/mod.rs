// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Decrypted letter cache module
//!
//! Keeps the plaintext of letters that were already decrypted so they can be
//! shown again without repeating the expensive work. The cache is partitioned
//! by identity, persisted through a pluggable [`LetterStore`], and only
//! shrinks when the caller clears it, removes an entry or applies an
//! [`EvictionPolicy`].

mod eviction;
mod letters;
mod sqlite;
mod store;
mod types;

pub use eviction::{EvictionPolicy, EvictionReport};
pub use letters::{CacheError, LetterCache};
pub use sqlite::SqliteStore;
pub use store::{FileStore, LetterStore, MemoryStore, StoreError};
pub use types::{
    CacheScope, CacheStats, CachedLetter, Clock, DecryptedLetter, ManualClock, SystemClock,
    SCOPE_KEY_PREFIX,
};
