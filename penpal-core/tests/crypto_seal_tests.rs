// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tests for crypto::blob
//!
//! Sealing under a user secret: round trip, tamper detection, wrong secret
//! and malformed input.

use penpal_core::crypto::*;
use proptest::prelude::*;

#[test]
fn test_seal_open_hello() {
    let blob = seal(b"hello", "pw1").unwrap();
    assert_eq!(open(&blob, "pw1").unwrap(), b"hello".to_vec());
}

#[test]
fn test_wrong_secret_fails_authentication() {
    let blob = seal(b"hello", "pw1").unwrap();
    assert!(matches!(
        open(&blob, "pw2"),
        Err(CipherError::AuthenticationFailed)
    ));
}

#[test]
fn test_empty_plaintext_roundtrip() {
    let text = seal_to_base64(b"", "pw").unwrap();
    assert_eq!(open_base64(&text, "pw").unwrap(), Vec::<u8>::new());
}

#[test]
fn test_same_input_seals_differently() {
    let a = seal(b"same", "pw").unwrap();
    let b = seal(b"same", "pw").unwrap();
    assert_ne!(a.salt(), b.salt());
    assert_ne!(a.nonce(), b.nonce());
    assert_ne!(a.to_bytes(), b.to_bytes());
}

#[test]
fn test_tampering_is_detected() {
    let blob = seal(b"attack at dawn", "pw").unwrap();
    let bytes = blob.to_bytes();

    // Salt, nonce, first/last ciphertext byte and last tag byte
    let positions = [
        0,
        SALT_SIZE,
        MIN_BLOB_SIZE,
        MIN_BLOB_SIZE + 13,
        bytes.len() - 1,
    ];
    for pos in positions {
        let mut tampered = bytes.clone();
        tampered[pos] ^= 0x01;
        let tampered = SealedBlob::from_bytes(&tampered).unwrap();
        assert!(
            matches!(open(&tampered, "pw"), Err(CipherError::AuthenticationFailed)),
            "flip at byte {} was not detected",
            pos
        );
    }
}

#[test]
fn test_truncated_tag_fails_authentication() {
    let bytes = seal(b"hi", "pw").unwrap().to_bytes();
    let truncated = SealedBlob::from_bytes(&bytes[..bytes.len() - 1]).unwrap();
    assert!(matches!(
        open(&truncated, "pw"),
        Err(CipherError::AuthenticationFailed)
    ));
}

#[test]
fn test_short_blob_is_malformed() {
    for len in [0, 1, MIN_BLOB_SIZE - 1] {
        assert!(matches!(
            SealedBlob::from_bytes(&vec![0u8; len]),
            Err(CipherError::MalformedBlob(_))
        ));
    }
}

#[test]
fn test_short_base64_is_malformed() {
    assert!(matches!(
        open_base64("AAAA", "pw"),
        Err(CipherError::MalformedBlob(_))
    ));
}

#[test]
fn test_base64_wire_form() {
    let blob = seal(b"hello", "pw").unwrap();
    let text = blob.to_base64();
    let parsed = SealedBlob::from_base64(&text).unwrap();
    assert_eq!(parsed, blob);
    // salt(16) + nonce(12) + plaintext(5) + tag(16)
    assert_eq!(parsed.to_bytes().len(), 49);
}

#[test]
fn test_unicode_secret() {
    let blob = seal("grüße".as_bytes(), "pässwörd🔑").unwrap();
    assert_eq!(open(&blob, "pässwörd🔑").unwrap(), "grüße".as_bytes());
    assert!(open(&blob, "passwort").is_err());
}

proptest! {
    // Each case runs two 100k-iteration key derivations.
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn prop_seal_open_roundtrip(
        plaintext in proptest::collection::vec(any::<u8>(), 0..512),
        secret in ".{0,32}",
    ) {
        let blob = seal(&plaintext, &secret).unwrap();
        prop_assert_eq!(open(&blob, &secret).unwrap(), plaintext);
    }
}
