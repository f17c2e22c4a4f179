//! Cache Commands
//!
//! Inspect and prune the decrypted letter cache.

use std::time::Duration;

use anyhow::{bail, Result};
use penpal_core::EvictionPolicy;

use crate::config::CliConfig;
use crate::display;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Shows cache statistics.
pub fn stats(config: &CliConfig) -> Result<()> {
    let cache = config.open_cache()?;
    display::display_stats(config.scope_label(), &cache.stats());
    Ok(())
}

/// Lists cached letters.
pub fn list(config: &CliConfig) -> Result<()> {
    let cache = config.open_cache()?;
    let letters = cache.entries();

    if letters.is_empty() {
        display::info(&format!("No cached letters for {}", config.scope_label()));
        return Ok(());
    }

    println!();
    println!("Cached letters ({}):", letters.len());
    println!();
    display::display_letters_table(&letters);
    println!();

    Ok(())
}

/// Shows a cached letter and marks it as read.
pub fn show(config: &CliConfig, event_id: &str) -> Result<()> {
    let cache = config.open_cache()?;

    match cache.get(event_id) {
        Some(letter) => {
            cache.touch(event_id)?;
            display::display_letter(event_id, &letter.decrypted);
        }
        None => {
            display::warning(&format!("Letter '{}' not in cache", event_id));
        }
    }
    Ok(())
}

/// Removes one cached letter.
pub fn remove(config: &CliConfig, event_id: &str) -> Result<()> {
    let cache = config.open_cache()?;
    if cache.remove(event_id)? {
        display::success(&format!("Removed {}", event_id));
    } else {
        display::warning(&format!("Letter '{}' not in cache", event_id));
    }
    Ok(())
}

/// Clears the current identity's cache.
pub fn clear(config: &CliConfig) -> Result<()> {
    let cache = config.open_cache()?;
    let count = cache.stats().count;
    cache.clear()?;
    display::success(&format!(
        "Cleared {} letter(s) for {}",
        count,
        config.scope_label()
    ));
    Ok(())
}

/// Applies an eviction policy once.
pub fn evict(
    config: &CliConfig,
    max_entries: Option<usize>,
    max_age_days: Option<u64>,
) -> Result<()> {
    if max_entries.is_none() && max_age_days.is_none() {
        bail!("Specify --max-entries and/or --max-age-days");
    }

    let mut policy = EvictionPolicy::default();
    if let Some(max_entries) = max_entries {
        policy = policy.with_max_entries(max_entries);
    }
    if let Some(days) = max_age_days {
        policy = policy.with_max_age(Duration::from_secs(days.saturating_mul(SECONDS_PER_DAY)));
    }

    let cache = config.open_cache()?;
    let report = cache.evict(&policy)?;
    display::display_eviction(&report);
    Ok(())
}
