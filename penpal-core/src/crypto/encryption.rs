// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Symmetric Encryption (AES-256-GCM)
//!
//! Provides authenticated encryption for sealed letters. Nonces are
//! supplied by the caller; [`super::blob`] stores them next to the salt.
//!
//! Ciphertext format: `ciphertext || tag (16 bytes)`

use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM};
use ring::rand::{SecureRandom, SystemRandom};
use zeroize::Zeroize;

use super::CipherError;

/// Nonce size for AES-256-GCM (96 bits = 12 bytes).
pub const NONCE_SIZE: usize = 12;
/// Authentication tag size (128 bits = 16 bytes).
pub const TAG_SIZE: usize = 16;
/// Key size (256 bits = 32 bytes).
pub const KEY_SIZE: usize = 32;

/// 256-bit symmetric encryption key.
#[derive(Clone)]
pub struct SymmetricKey {
    bytes: [u8; KEY_SIZE],
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Don't expose key bytes in debug output
        f.debug_struct("SymmetricKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

impl Drop for SymmetricKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl SymmetricKey {
    /// Creates a key from raw bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        SymmetricKey { bytes }
    }

    /// Returns a reference to the key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

/// Fills `buf` from the system CSPRNG.
///
/// A failing random source means the platform cannot provide secure
/// primitives; the error is reported rather than papered over.
pub fn fill_random(buf: &mut [u8]) -> Result<(), CipherError> {
    SystemRandom::new()
        .fill(buf)
        .map_err(|_| CipherError::EnvironmentUnavailable("system random source failed".into()))
}

/// Encrypts data with a caller-supplied nonce.
///
/// Returns `ciphertext || tag`. The caller owns nonce freshness.
pub(crate) fn encrypt_with_nonce(
    key: &SymmetricKey,
    nonce_bytes: [u8; NONCE_SIZE],
    plaintext: &[u8],
) -> Result<Vec<u8>, CipherError> {
    let unbound_key = UnboundKey::new(&AES_256_GCM, key.as_bytes())
        .map_err(|_| CipherError::EnvironmentUnavailable("AES-256-GCM unavailable".into()))?;
    let sealing_key = LessSafeKey::new(unbound_key);

    let mut in_out = plaintext.to_vec();
    let nonce = Nonce::assume_unique_for_key(nonce_bytes);
    sealing_key
        .seal_in_place_append_tag(nonce, Aad::empty(), &mut in_out)
        .map_err(|_| CipherError::EnvironmentUnavailable("AES-256-GCM seal failed".into()))?;

    Ok(in_out)
}

/// Decrypts `ciphertext || tag` with the given nonce.
pub(crate) fn decrypt_with_nonce(
    key: &SymmetricKey,
    nonce_bytes: [u8; NONCE_SIZE],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CipherError> {
    if ciphertext.len() < TAG_SIZE {
        return Err(CipherError::AuthenticationFailed);
    }

    let unbound_key = UnboundKey::new(&AES_256_GCM, key.as_bytes())
        .map_err(|_| CipherError::EnvironmentUnavailable("AES-256-GCM unavailable".into()))?;
    let opening_key = LessSafeKey::new(unbound_key);

    let mut buffer = ciphertext.to_vec();
    let nonce = Nonce::assume_unique_for_key(nonce_bytes);
    let plaintext = opening_key
        .open_in_place(nonce, Aad::empty(), &mut buffer)
        .map_err(|_| CipherError::AuthenticationFailed)?;

    Ok(plaintext.to_vec())
}
