// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Letter Composition and Reading
//!
//! Compose path: draft → (optional) seal → [`PowNoteRequest`] for the mining
//! supervisor → mined event + recipient relays for the transport.
//!
//! Receive path: event → proof-of-work and id check → open → cache.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::cache::{CacheError, DecryptedLetter, LetterCache, LetterStore};
use crate::crypto::{open_base64, seal_to_base64, CipherError};
use crate::event::{normalize_pubkey, EventError, NostrEvent};
use crate::pow::PowNoteRequest;

/// Composition error types.
#[derive(Error, Debug)]
pub enum ComposeError {
    #[error("Cipher error: {0}")]
    Cipher(#[from] CipherError),

    #[error("Event error: {0}")]
    Event(#[from] EventError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Id mismatch or not enough proof of work.
    #[error("Event {0} failed proof-of-work verification")]
    InsufficientWork(String),

    #[error("No relays known for {0}")]
    NoRelays(String),
}

/// A relay a recipient reads from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelayListItem {
    pub url: String,
}

impl RelayListItem {
    pub fn new(url: impl Into<String>) -> Self {
        RelayListItem { url: url.into() }
    }
}

/// Resolves where a public key receives letters.
pub trait RelayListProvider {
    fn relays_for(&self, pubkey: &str) -> Vec<RelayListItem>;
}

/// Fixed relay lists with a fallback for unknown keys.
#[derive(Debug, Clone, Default)]
pub struct StaticRelayList {
    by_pubkey: HashMap<String, Vec<RelayListItem>>,
    defaults: Vec<RelayListItem>,
}

impl StaticRelayList {
    pub fn new<I, T>(defaults: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        StaticRelayList {
            by_pubkey: HashMap::new(),
            defaults: defaults.into_iter().map(RelayListItem::new).collect(),
        }
    }

    pub fn with_relays<I, T>(mut self, pubkey: &str, urls: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.by_pubkey.insert(
            pubkey.trim().to_ascii_lowercase(),
            urls.into_iter().map(RelayListItem::new).collect(),
        );
        self
    }
}

impl RelayListProvider for StaticRelayList {
    fn relays_for(&self, pubkey: &str) -> Vec<RelayListItem> {
        self.by_pubkey
            .get(&pubkey.trim().to_ascii_lowercase())
            .filter(|relays| !relays.is_empty())
            .unwrap_or(&self.defaults)
            .clone()
    }
}

/// A letter being written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LetterDraft {
    pub recipient_pubkey: String,
    pub subject: Option<String>,
    pub body: String,
}

/// Payload carried in the event content (sealed or plain).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct LetterBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    subject: Option<String>,
    body: String,
}

/// Builds the mining request for a draft.
///
/// With a `secret`, the content is the base64 sealed blob of the letter
/// body; without one it is the plain JSON body.
pub fn compose_note(
    draft: &LetterDraft,
    sender_pubkey: &str,
    difficulty: u32,
    secret: Option<&str>,
) -> Result<PowNoteRequest, ComposeError> {
    let sender = normalize_pubkey(sender_pubkey)?;
    let recipient = normalize_pubkey(&draft.recipient_pubkey)?;

    let body = serde_json::to_string(&LetterBody {
        subject: draft.subject.clone(),
        body: draft.body.clone(),
    })?;

    let message = match secret {
        Some(secret) => seal_to_base64(body.as_bytes(), secret)?,
        None => body,
    };

    Ok(PowNoteRequest {
        sender_pubkey: sender,
        recipient_public_key: recipient,
        message,
        difficulty,
        created_at: None,
    })
}

/// Decodes a letter event's content.
///
/// Plain content that is not a letter body is taken verbatim as the body.
pub fn read_letter(
    event: &NostrEvent,
    secret: Option<&str>,
    received_at: u64,
) -> Result<DecryptedLetter, ComposeError> {
    let letter = match secret {
        Some(secret) => {
            let plaintext = open_base64(&event.content, secret)?;
            serde_json::from_slice::<LetterBody>(&plaintext)?
        }
        None => serde_json::from_str::<LetterBody>(&event.content).unwrap_or(LetterBody {
            subject: None,
            body: event.content.clone(),
        }),
    };

    Ok(DecryptedLetter {
        from: event.pubkey.clone(),
        subject: letter.subject,
        content: letter.body,
        received_at,
    })
}

/// Returns a received letter, decrypting and caching it on first sight.
///
/// Cached letters are touched and returned without re-verification.
/// Letters that fail verification or decryption are not cached.
pub fn receive_letter<S: LetterStore>(
    cache: &LetterCache<S>,
    event: &NostrEvent,
    secret: Option<&str>,
    min_difficulty: u32,
    received_at: u64,
) -> Result<DecryptedLetter, ComposeError> {
    if let Some(cached) = cache.get(&event.id) {
        cache.touch(&event.id)?;
        debug!(event_id = %event.id, "letter served from cache");
        return Ok(cached.decrypted);
    }

    if !event.verify_pow(min_difficulty)? {
        return Err(ComposeError::InsufficientWork(event.id.clone()));
    }

    let letter = read_letter(event, secret, received_at)?;
    cache.put(&event.id, letter.clone())?;
    Ok(letter)
}

/// Relays a mined letter should be published to: the union of its
/// recipients' relays, first occurrence order.
pub fn relays_for_event<P: RelayListProvider + ?Sized>(
    event: &NostrEvent,
    provider: &P,
) -> Result<Vec<RelayListItem>, ComposeError> {
    let mut relays: Vec<RelayListItem> = Vec::new();
    for recipient in event.to_unsigned().recipients() {
        for relay in provider.relays_for(recipient) {
            if !relays.contains(&relay) {
                relays.push(relay);
            }
        }
    }

    if relays.is_empty() {
        return Err(ComposeError::NoRelays(event.id.clone()));
    }
    Ok(relays)
}
