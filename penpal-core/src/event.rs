// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Nostr Event Model
//!
//! Letters travel as Nostr-shaped events. The event id is the SHA-256 of the
//! canonical serialization `[0, pubkey, created_at, kind, tags, content]`.
//! Proof of work is carried in a `["nonce", "<counter>", "<target>"]` tag and
//! measured as leading zero bits of the id.

use ring::digest::{digest, SHA256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Event kinds used by Penpal.
pub mod kinds {
    /// Encrypted letter addressed to a recipient's public key.
    pub const ENCRYPTED_LETTER: u16 = 4;
}

/// Tag name carrying the proof-of-work nonce.
pub const NONCE_TAG: &str = "nonce";
/// Tag name addressing a recipient public key.
pub const PUBKEY_TAG: &str = "p";

/// Event error types.
#[derive(Error, Debug)]
pub enum EventError {
    #[error("Invalid public key: {0}")]
    InvalidPubkey(String),

    #[error("Invalid event id: {0}")]
    InvalidId(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Validates and normalizes a 32-byte hex public key.
pub fn normalize_pubkey(pubkey: &str) -> Result<String, EventError> {
    let normalized = pubkey.trim().to_ascii_lowercase();
    if normalized.len() != 64 || hex::decode(&normalized).is_err() {
        return Err(EventError::InvalidPubkey(pubkey.to_string()));
    }
    Ok(normalized)
}

/// Counts leading zero bits of a byte string.
pub fn leading_zero_bits(bytes: &[u8]) -> u32 {
    let mut total = 0;
    for byte in bytes {
        if *byte == 0 {
            total += 8;
        } else {
            total += byte.leading_zeros();
            break;
        }
    }
    total
}

/// An event before its id is fixed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedEvent {
    pub pubkey: String,
    pub created_at: u64,
    pub kind: u16,
    pub tags: Vec<Vec<String>>,
    pub content: String,
}

impl UnsignedEvent {
    /// Creates an event stamped with the current time.
    pub fn new(pubkey: impl Into<String>, kind: u16, content: impl Into<String>) -> Self {
        UnsignedEvent {
            pubkey: pubkey.into(),
            created_at: now_secs(),
            kind,
            tags: Vec::new(),
            content: content.into(),
        }
    }

    pub fn with_created_at(mut self, created_at: u64) -> Self {
        self.created_at = created_at;
        self
    }

    /// Appends a tag.
    pub fn with_tag<I, T>(mut self, tag: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags.push(tag.into_iter().map(Into::into).collect());
        self
    }

    /// Canonical serialization used for the event id.
    pub fn canonical_json(&self) -> Result<String, EventError> {
        let canonical = (
            0u8,
            &self.pubkey,
            self.created_at,
            self.kind,
            &self.tags,
            &self.content,
        );
        Ok(serde_json::to_string(&canonical)?)
    }

    /// SHA-256 of the canonical serialization.
    pub fn compute_id(&self) -> Result<[u8; 32], EventError> {
        let json = self.canonical_json()?;
        let hash = digest(&SHA256, json.as_bytes());
        let mut id = [0u8; 32];
        id.copy_from_slice(hash.as_ref());
        Ok(id)
    }

    /// Returns `(counter, committed target)` from the nonce tag, if present.
    pub fn nonce(&self) -> Option<(u64, Option<u32>)> {
        let tag = self
            .tags
            .iter()
            .find(|t| t.first().map(String::as_str) == Some(NONCE_TAG))?;
        let counter = tag.get(1)?.parse().ok()?;
        let target = tag.get(2).and_then(|t| t.parse().ok());
        Some((counter, target))
    }

    /// Ensures exactly one nonce tag exists, reset to counter 0 with the given
    /// target, and returns its index in `tags`.
    pub fn reset_nonce_tag(&mut self, target: u32) -> usize {
        self.tags
            .retain(|t| t.first().map(String::as_str) != Some(NONCE_TAG));
        self.tags.push(vec![
            NONCE_TAG.to_string(),
            "0".to_string(),
            target.to_string(),
        ]);
        self.tags.len() - 1
    }

    /// Recipient public keys from `p` tags.
    pub fn recipients(&self) -> impl Iterator<Item = &str> {
        self.tags
            .iter()
            .filter(|t| t.first().map(String::as_str) == Some(PUBKEY_TAG))
            .filter_map(|t| t.get(1).map(String::as_str))
    }

    /// Fixes the id.
    pub fn into_event(self, id: [u8; 32]) -> NostrEvent {
        NostrEvent {
            id: hex::encode(id),
            pubkey: self.pubkey,
            created_at: self.created_at,
            kind: self.kind,
            tags: self.tags,
            content: self.content,
            sig: None,
        }
    }
}

/// An event with its id. The signature is attached by an external signer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NostrEvent {
    pub id: String,
    pub pubkey: String,
    pub created_at: u64,
    pub kind: u16,
    pub tags: Vec<Vec<String>>,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sig: Option<String>,
}

impl NostrEvent {
    /// Drops the id and signature.
    pub fn to_unsigned(&self) -> UnsignedEvent {
        UnsignedEvent {
            pubkey: self.pubkey.clone(),
            created_at: self.created_at,
            kind: self.kind,
            tags: self.tags.clone(),
            content: self.content.clone(),
        }
    }

    /// Decodes the hex id.
    pub fn id_bytes(&self) -> Result<[u8; 32], EventError> {
        let bytes = hex::decode(&self.id).map_err(|_| EventError::InvalidId(self.id.clone()))?;
        bytes
            .try_into()
            .map_err(|_| EventError::InvalidId(self.id.clone()))
    }

    /// Checks that `id` matches the canonical serialization.
    pub fn verify_id(&self) -> Result<bool, EventError> {
        Ok(self.to_unsigned().compute_id()? == self.id_bytes()?)
    }

    /// Leading zero bits of the id.
    pub fn pow_difficulty(&self) -> Result<u32, EventError> {
        Ok(leading_zero_bits(&self.id_bytes()?))
    }

    /// Verifies the id and that both the achieved work and the committed
    /// target reach `min_difficulty`.
    pub fn verify_pow(&self, min_difficulty: u32) -> Result<bool, EventError> {
        if !self.verify_id()? || self.pow_difficulty()? < min_difficulty {
            return Ok(false);
        }
        if min_difficulty == 0 {
            return Ok(true);
        }
        Ok(matches!(
            self.to_unsigned().nonce(),
            Some((_, Some(target))) if target >= min_difficulty
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PUBKEY: &str = "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";

    #[test]
    fn test_leading_zero_bits() {
        assert_eq!(leading_zero_bits(&[0xff]), 0);
        assert_eq!(leading_zero_bits(&[0x0f]), 4);
        assert_eq!(leading_zero_bits(&[0x00, 0x01]), 15);
        assert_eq!(leading_zero_bits(&[0x00, 0x00]), 16);
        assert_eq!(leading_zero_bits(&[]), 0);
    }

    #[test]
    fn test_canonical_json_shape() {
        let event = UnsignedEvent::new(PUBKEY, 1, "hi \"there\"\n")
            .with_created_at(1_700_000_000)
            .with_tag(["p", "abc"]);
        assert_eq!(
            event.canonical_json().unwrap(),
            format!(
                "[0,\"{}\",1700000000,1,[[\"p\",\"abc\"]],\"hi \\\"there\\\"\\n\"]",
                PUBKEY
            )
        );
    }

    #[test]
    fn test_reset_nonce_tag_replaces_existing() {
        let mut event = UnsignedEvent::new(PUBKEY, 1, "")
            .with_tag(["nonce", "99", "3"])
            .with_tag(["p", "abc"]);
        let idx = event.reset_nonce_tag(8);
        assert_eq!(idx, 1);
        assert_eq!(event.nonce(), Some((0, Some(8))));
        assert_eq!(event.tags.len(), 2);
    }

    #[test]
    fn test_verify_id_detects_mutation() {
        let unsigned = UnsignedEvent::new(PUBKEY, 1, "content").with_created_at(10);
        let id = unsigned.compute_id().unwrap();
        let mut event = unsigned.into_event(id);
        assert!(event.verify_id().unwrap());

        event.content.push('!');
        assert!(!event.verify_id().unwrap());
    }

    #[test]
    fn test_normalize_pubkey() {
        assert_eq!(
            normalize_pubkey(&PUBKEY.to_uppercase()).unwrap(),
            PUBKEY.to_string()
        );
        assert!(normalize_pubkey("abc").is_err());
        assert!(normalize_pubkey(&"zz".repeat(32)).is_err());
    }
}
