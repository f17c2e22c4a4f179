// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Mining Context Messages
//!
//! Everything exchanged between the interactive context and the mining
//! context. Messages serialize to JSON with a `type` discriminator so they
//! can also cross a process or worker boundary unchanged.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{MiningError, MiningOutcome};
use crate::event::{kinds, normalize_pubkey, EventError, NostrEvent, UnsignedEvent, PUBKEY_TAG};

/// Correlates a mining request with its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a fresh random request id.
    pub fn new() -> Self {
        RequestId(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A letter note to be assembled and mined in the mining context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowNoteRequest {
    /// Author public key (hex). Signing happens outside the mining context.
    pub sender_pubkey: String,
    pub recipient_public_key: String,
    /// Letter content, usually a sealed blob in base64.
    pub message: String,
    pub difficulty: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<u64>,
}

impl PowNoteRequest {
    /// Builds the candidate event: an encrypted-letter kind addressed with a
    /// `p` tag.
    pub fn candidate_event(&self) -> Result<UnsignedEvent, EventError> {
        let sender = normalize_pubkey(&self.sender_pubkey)?;
        let recipient = normalize_pubkey(&self.recipient_public_key)?;

        let event = UnsignedEvent::new(sender, kinds::ENCRYPTED_LETTER, self.message.clone())
            .with_tag([PUBKEY_TAG.to_string(), recipient]);

        Ok(match self.created_at {
            Some(created_at) => event.with_created_at(created_at),
            None => event,
        })
    }
}

/// Interactive context → mining context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MiningRequest {
    #[serde(rename_all = "camelCase")]
    CreatePowNote {
        sender_pubkey: String,
        recipient_public_key: String,
        message: String,
        difficulty: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        created_at: Option<u64>,
        request_id: RequestId,
    },

    #[serde(rename_all = "camelCase")]
    MineEvent {
        event: UnsignedEvent,
        difficulty: u32,
        /// Per-job bound in milliseconds, counted from when mining starts
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
        request_id: RequestId,
    },

    #[serde(rename_all = "camelCase")]
    CancelPow { request_id: RequestId },
}

impl MiningRequest {
    pub fn create_pow_note(note: PowNoteRequest, request_id: RequestId) -> Self {
        MiningRequest::CreatePowNote {
            sender_pubkey: note.sender_pubkey,
            recipient_public_key: note.recipient_public_key,
            message: note.message,
            difficulty: note.difficulty,
            created_at: note.created_at,
            request_id,
        }
    }

    pub fn request_id(&self) -> RequestId {
        match self {
            MiningRequest::CreatePowNote { request_id, .. }
            | MiningRequest::MineEvent { request_id, .. }
            | MiningRequest::CancelPow { request_id } => *request_id,
        }
    }
}

/// Mining context → interactive context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MiningResponse {
    #[serde(rename_all = "camelCase")]
    PowComplete {
        result: NostrEvent,
        attempts: u64,
        request_id: RequestId,
    },

    #[serde(rename_all = "camelCase")]
    PowCancelled { request_id: RequestId },

    #[serde(rename_all = "camelCase")]
    Error {
        error: MiningError,
        request_id: RequestId,
    },
}

impl MiningResponse {
    pub fn from_outcome(request_id: RequestId, outcome: MiningOutcome) -> Self {
        match outcome {
            MiningOutcome::Mined { event, attempts } => MiningResponse::PowComplete {
                result: event,
                attempts,
                request_id,
            },
            MiningOutcome::Cancelled => MiningResponse::PowCancelled { request_id },
            MiningOutcome::Failed(error) => MiningResponse::Error { error, request_id },
        }
    }

    pub fn request_id(&self) -> RequestId {
        match self {
            MiningResponse::PowComplete { request_id, .. }
            | MiningResponse::PowCancelled { request_id }
            | MiningResponse::Error { request_id, .. } => *request_id,
        }
    }
}

/// The single result delivered for a request id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiningResult {
    pub request_id: RequestId,
    pub outcome: MiningOutcome,
}

impl From<MiningResponse> for MiningResult {
    fn from(response: MiningResponse) -> Self {
        match response {
            MiningResponse::PowComplete {
                result,
                attempts,
                request_id,
            } => MiningResult {
                request_id,
                outcome: MiningOutcome::Mined {
                    event: result,
                    attempts,
                },
            },
            MiningResponse::PowCancelled { request_id } => MiningResult {
                request_id,
                outcome: MiningOutcome::Cancelled,
            },
            MiningResponse::Error { error, request_id } => MiningResult {
                request_id,
                outcome: MiningOutcome::Failed(error),
            },
        }
    }
}
