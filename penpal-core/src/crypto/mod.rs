// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

pub mod blob;
pub mod encryption;
pub mod password_kdf;

pub use blob::{open, open_base64, seal, seal_to_base64, SealedBlob, MIN_BLOB_SIZE};
pub use encryption::{SymmetricKey, NONCE_SIZE, TAG_SIZE};
pub use password_kdf::{derive_key, generate_salt, PBKDF2_ITERATIONS, SALT_SIZE};

/// Cipher error types.
#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    /// Secure primitives (RNG, AEAD) are not available on this platform.
    #[error("Cryptographic environment unavailable: {0}")]
    EnvironmentUnavailable(String),
    #[error("Authentication failed: wrong secret, corrupted or tampered data")]
    AuthenticationFailed,
    #[error("Malformed blob: {0}")]
    MalformedBlob(String),
}
