// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Password-Based Key Derivation
//!
//! Turns a user secret and a 16-byte salt into an AES-256 key with
//! PBKDF2-HMAC-SHA256 at a fixed iteration count.

use ring::pbkdf2;
use std::num::NonZeroU32;
use zeroize::Zeroize;

use super::{CipherError, SymmetricKey};

/// Salt size in bytes.
pub const SALT_SIZE: usize = 16;

/// PBKDF2 iterations. Fixed; sealed blobs do not record it.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Derives a 32-byte symmetric key from a secret using PBKDF2-HMAC-SHA256.
pub fn derive_key(secret: &str, salt: &[u8; SALT_SIZE]) -> Result<SymmetricKey, CipherError> {
    let iterations = NonZeroU32::new(PBKDF2_ITERATIONS).ok_or_else(|| {
        CipherError::EnvironmentUnavailable("PBKDF2 iteration count is zero".into())
    })?;

    let mut key_bytes = [0u8; 32];
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        iterations,
        salt,
        secret.as_bytes(),
        &mut key_bytes,
    );

    let key = SymmetricKey::from_bytes(key_bytes);
    key_bytes.zeroize();
    Ok(key)
}

/// Generates a fresh random salt.
pub fn generate_salt() -> Result<[u8; SALT_SIZE], CipherError> {
    let mut salt = [0u8; SALT_SIZE];
    super::encryption::fill_random(&mut salt)?;
    Ok(salt)
}
