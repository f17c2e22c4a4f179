// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Sealed Blobs
//!
//! Secret-sealed payloads that carry their own salt and nonce.
//!
//! Wire format: `salt (16) || nonce (12) || ciphertext || tag (16)`,
//! represented as standard base64 in text contexts.

use base64::{engine::general_purpose::STANDARD, Engine};

use super::encryption::{decrypt_with_nonce, encrypt_with_nonce, fill_random, NONCE_SIZE};
use super::password_kdf::{derive_key, generate_salt, SALT_SIZE};
use super::CipherError;

/// Minimum blob length: salt plus nonce.
pub const MIN_BLOB_SIZE: usize = SALT_SIZE + NONCE_SIZE;

/// A payload sealed under a user secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedBlob {
    salt: [u8; SALT_SIZE],
    nonce: [u8; NONCE_SIZE],
    ciphertext: Vec<u8>,
}

impl SealedBlob {
    /// Salt used for key derivation.
    pub fn salt(&self) -> &[u8; SALT_SIZE] {
        &self.salt
    }

    /// AEAD nonce.
    pub fn nonce(&self) -> &[u8; NONCE_SIZE] {
        &self.nonce
    }

    /// Ciphertext with the authentication tag appended.
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// Serializes to `salt || nonce || ciphertext || tag`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(MIN_BLOB_SIZE + self.ciphertext.len());
        out.extend_from_slice(&self.salt);
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Parses the binary wire form.
    pub fn from_bytes(data: &[u8]) -> Result<Self, CipherError> {
        if data.len() < MIN_BLOB_SIZE {
            return Err(CipherError::MalformedBlob(format!(
                "blob is {} bytes, need at least {}",
                data.len(),
                MIN_BLOB_SIZE
            )));
        }

        let mut salt = [0u8; SALT_SIZE];
        salt.copy_from_slice(&data[..SALT_SIZE]);
        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(&data[SALT_SIZE..MIN_BLOB_SIZE]);

        Ok(SealedBlob {
            salt,
            nonce,
            ciphertext: data[MIN_BLOB_SIZE..].to_vec(),
        })
    }

    /// Encodes the blob as base64 text.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.to_bytes())
    }

    /// Decodes a blob from base64 text.
    pub fn from_base64(text: &str) -> Result<Self, CipherError> {
        let bytes = STANDARD
            .decode(text.trim())
            .map_err(|e| CipherError::MalformedBlob(format!("invalid base64: {}", e)))?;
        Self::from_bytes(&bytes)
    }
}

/// Seals `plaintext` under `secret` with a fresh salt and nonce.
pub fn seal(plaintext: &[u8], secret: &str) -> Result<SealedBlob, CipherError> {
    let salt = generate_salt()?;
    let mut nonce = [0u8; NONCE_SIZE];
    fill_random(&mut nonce)?;

    let key = derive_key(secret, &salt)?;
    let ciphertext = encrypt_with_nonce(&key, nonce, plaintext)?;

    Ok(SealedBlob {
        salt,
        nonce,
        ciphertext,
    })
}

/// Opens a blob produced by [`seal`].
pub fn open(blob: &SealedBlob, secret: &str) -> Result<Vec<u8>, CipherError> {
    let key = derive_key(secret, &blob.salt)?;
    decrypt_with_nonce(&key, blob.nonce, &blob.ciphertext)
}

/// Seals and encodes to base64 in one step.
pub fn seal_to_base64(plaintext: &[u8], secret: &str) -> Result<String, CipherError> {
    seal(plaintext, secret).map(|blob| blob.to_base64())
}

/// Decodes base64 and opens in one step.
pub fn open_base64(text: &str, secret: &str) -> Result<Vec<u8>, CipherError> {
    open(&SealedBlob::from_base64(text)?, secret)
}
