//! Display Helpers
//!
//! Terminal output formatting and styling.

use console::style;
use penpal_core::{CacheStats, CachedLetter, DecryptedLetter, EvictionReport};
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Prints a success message.
pub fn success(msg: &str) {
    eprintln!("{} {}", style("✓").green().bold(), msg);
}

/// Prints a warning message.
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("⚠").yellow().bold(), msg);
}

/// Prints an info message.
pub fn info(msg: &str) {
    eprintln!("{} {}", style("ℹ").blue().bold(), msg);
}

/// Shortens a hex id for tables.
fn short_id(id: &str) -> String {
    let chars: Vec<char> = id.chars().collect();
    if chars.len() <= 16 {
        return id.to_string();
    }
    let head: String = chars[..8].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}…{}", head, tail)
}

/// Displays a decrypted letter.
pub fn display_letter(event_id: &str, letter: &DecryptedLetter) {
    let width = 60;

    println!("{}", "─".repeat(width));
    match &letter.subject {
        Some(subject) => println!("  {}", style(subject).bold().cyan()),
        None => println!("  {}", style("(no subject)").dim()),
    }
    println!("  From: {}", style(&letter.from).dim());
    println!("  Id:   {}", style(event_id).dim());
    println!("{}", "─".repeat(width));
    for line in letter.content.lines() {
        println!("  {}", line);
    }
    println!("{}", "─".repeat(width));
}

#[derive(Tabled)]
struct LetterRow {
    #[tabled(rename = "Event")]
    event_id: String,
    #[tabled(rename = "From")]
    from: String,
    #[tabled(rename = "Subject")]
    subject: String,
    #[tabled(rename = "Cached at")]
    cached_at: u64,
    #[tabled(rename = "Last read")]
    last_accessed: u64,
}

/// Displays cached letters as a table.
pub fn display_letters_table(letters: &[CachedLetter]) {
    let rows = letters.iter().map(|letter| LetterRow {
        event_id: short_id(&letter.event_id),
        from: short_id(&letter.decrypted.from),
        subject: letter.decrypted.subject.clone().unwrap_or_default(),
        cached_at: letter.cached_at,
        last_accessed: letter.last_accessed,
    });

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);
}

/// Displays cache statistics.
pub fn display_stats(scope: &str, stats: &CacheStats) {
    println!();
    println!("  Scope:   {}", style(scope).bold());
    println!("  Letters: {}", stats.count);
    println!("  Size:    ~{} bytes", stats.approximate_byte_size);
    if let (Some(oldest), Some(newest)) = (stats.oldest_cached_at, stats.newest_cached_at) {
        println!("  Oldest:  {}", oldest);
        println!("  Newest:  {}", newest);
    }
    println!();
}

/// Summarizes an eviction pass.
pub fn display_eviction(report: &EvictionReport) {
    if report.is_empty() {
        info("Nothing to evict.");
        return;
    }
    success(&format!(
        "Evicted {} letter(s): {} expired, {} over the limit",
        report.removed(),
        report.expired.len(),
        report.overflow.len()
    ));
}
