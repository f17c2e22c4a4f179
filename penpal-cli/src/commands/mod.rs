//! CLI Commands

pub mod cache;
pub mod mine;
pub mod receive;
pub mod seal;

use std::io::{self, Read};

use anyhow::{bail, Result};
use dialoguer::Password;

/// Returns the positional argument, or stdin when it is absent.
pub fn read_input(arg: Option<String>) -> Result<String> {
    match arg {
        Some(text) => Ok(text),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf.trim_end_matches(['\r', '\n']).to_string())
        }
    }
}

/// Returns the secret from the flag or environment, prompting otherwise.
pub fn resolve_secret(secret: Option<String>, confirm: bool) -> Result<String> {
    if let Some(secret) = secret {
        return Ok(secret);
    }

    let mut prompt = Password::new().with_prompt("Secret");
    if confirm {
        prompt = prompt.with_confirmation("Confirm secret", "Secrets don't match");
    }
    let secret = prompt.interact()?;
    if secret.is_empty() {
        bail!("Secret must not be empty");
    }
    Ok(secret)
}
