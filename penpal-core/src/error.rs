// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Error Types
//!
//! Unified error type over the per-module errors.

use thiserror::Error;

use crate::cache::{CacheError, StoreError};
use crate::compose::ComposeError;
use crate::crypto::CipherError;
use crate::event::EventError;
use crate::pow::MiningError;

/// Unified error type for Penpal operations.
#[derive(Error, Debug)]
pub enum PenpalError {
    /// Sealing or opening failed.
    #[error("cipher error: {0}")]
    Cipher(#[from] CipherError),

    /// Proof-of-work mining failed.
    #[error("mining error: {0}")]
    Mining(#[from] MiningError),

    /// Letter cache write failed.
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    /// Cache backend failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Event encoding or validation failed.
    #[error("event error: {0}")]
    Event(#[from] EventError),

    /// Letter composition or reading failed.
    #[error("compose error: {0}")]
    Compose(#[from] ComposeError),
}

/// Result type for Penpal operations.
pub type PenpalResult<T> = Result<T, PenpalError>;
