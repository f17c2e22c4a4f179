//! Receive Command
//!
//! Verifies, decrypts and caches a letter event.

use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use penpal_core::{receive_letter, NostrEvent};

use crate::config::CliConfig;
use crate::display;

/// Reads an event file and shows the letter.
pub fn run(
    config: &CliConfig,
    event_path: &Path,
    secret: Option<String>,
    min_difficulty: u32,
) -> Result<()> {
    let raw = fs::read_to_string(event_path)
        .with_context(|| format!("Failed to read {:?}", event_path))?;
    let event: NostrEvent = serde_json::from_str(&raw).context("Not a valid event")?;

    let cache = config.open_cache()?;
    let cached = cache.has(&event.id);

    let received_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    let letter = receive_letter(
        &cache,
        &event,
        secret.as_deref(),
        min_difficulty,
        received_at,
    )?;

    display::display_letter(&event.id, &letter);
    if cached {
        display::info("Served from cache.");
    } else {
        display::success(&format!("Letter cached for {}", config.scope_label()));
    }
    Ok(())
}
