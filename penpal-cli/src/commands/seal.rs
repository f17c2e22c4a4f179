//! Seal / Open Commands
//!
//! Encrypts text under a secret into a portable base64 blob and back.

use anyhow::{Context, Result};
use penpal_core::crypto::{open_base64, seal_to_base64};

use super::{read_input, resolve_secret};

/// Seals text and prints the base64 blob.
pub fn seal(text: Option<String>, secret: Option<String>) -> Result<()> {
    let text = read_input(text)?;
    let secret = resolve_secret(secret, true)?;

    let blob = seal_to_base64(text.as_bytes(), &secret)?;
    println!("{}", blob);
    Ok(())
}

/// Opens a base64 blob and prints the plaintext.
pub fn open(blob: Option<String>, secret: Option<String>) -> Result<()> {
    let blob = read_input(blob)?;
    let secret = resolve_secret(secret, false)?;

    let plaintext = open_base64(&blob, &secret).context("Could not open blob")?;
    let text = String::from_utf8(plaintext).context("Plaintext is not UTF-8")?;
    println!("{}", text);
    Ok(())
}
