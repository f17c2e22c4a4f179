//! Mine Command
//!
//! Composes a letter and mines its proof-of-work stamp on the mining thread,
//! keeping the terminal responsive. Ctrl-C cancels the job.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use penpal_core::{compose_note, LetterDraft, MiningConfig, MiningOutcome, MiningSupervisor};

use super::read_input;
use crate::config::CliConfig;
use crate::display;

/// Arguments of `penpal mine`.
pub struct MineArgs {
    pub to: String,
    pub body: Option<String>,
    pub subject: Option<String>,
    pub from: Option<String>,
    pub difficulty: u32,
    pub timeout: Duration,
    pub secret: Option<String>,
    pub output: Option<PathBuf>,
}

/// Spinner text for the work that will actually be mined.
fn mining_message(config: &MiningConfig, requested: u32) -> String {
    format!("Mining {} bits of work", config.clamp_difficulty(requested))
}

/// Mines a letter and writes the event JSON.
pub async fn run(config: &CliConfig, args: MineArgs) -> Result<()> {
    let sender = args
        .from
        .as_deref()
        .or(config.identity.as_deref())
        .ok_or_else(|| anyhow!("No sender. Pass --from or set --identity."))?;

    let draft = LetterDraft {
        recipient_pubkey: args.to,
        subject: args.subject,
        body: read_input(args.body)?,
    };
    let note = compose_note(&draft, sender, args.difficulty, args.secret.as_deref())?;

    let mining_config = MiningConfig::default().with_timeout(args.timeout);
    let mut supervisor = MiningSupervisor::spawn(mining_config)?;
    let request_id = supervisor.submit_note(note)?;
    let difficulty = supervisor.config().clamp_difficulty(args.difficulty);
    tracing::debug!(%request_id, difficulty, "submitted letter for mining");

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg} [{elapsed}]")?);
    spinner.set_message(mining_message(supervisor.config(), args.difficulty));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let finished = tokio::select! {
        result = supervisor.next_result() => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };
    let result = match finished {
        Some(result) => result,
        None => {
            spinner.set_message("Cancelling");
            supervisor.cancel(request_id)?;
            supervisor.next_result().await
        }
    };
    spinner.finish_and_clear();

    let result = result.ok_or_else(|| anyhow!("Mining job was lost"))?;
    let (event, attempts) = match result.outcome {
        MiningOutcome::Mined { event, attempts } => (event, attempts),
        MiningOutcome::Cancelled => {
            display::warning("Mining cancelled.");
            return Ok(());
        }
        MiningOutcome::Failed(e) => bail!("Mining failed: {}", e),
    };

    let json = serde_json::to_string_pretty(&event)?;
    match args.output {
        Some(path) => {
            fs::write(&path, json).with_context(|| format!("Failed to write {:?}", path))?;
            display::success(&format!("Mined after {} attempts: {:?}", attempts, path));
        }
        None => {
            println!("{}", json);
            display::success(&format!("Mined after {} attempts", attempts));
        }
    }
    display::info("Sign the event before publishing it.");

    Ok(())
}
