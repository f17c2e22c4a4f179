//! Penpal CLI
//!
//! Command-line interface for Penpal - sealed letters with proof-of-work stamps.

mod commands;
mod config;
mod display;

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_subscriber::EnvFilter;

use config::CliConfig;

#[derive(Parser)]
#[command(name = "penpal")]
#[command(version, about = "Sealed letters with proof-of-work stamps")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Data directory (default: platform data dir + /penpal)
    #[arg(long, global = true, env = "PENPAL_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Public key of the signed-in identity (selects the cache scope)
    #[arg(long, global = true, env = "PENPAL_IDENTITY")]
    identity: Option<String>,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Seal text under a secret and print the base64 blob
    Seal {
        /// Text to seal (read from stdin when omitted)
        text: Option<String>,

        /// Secret to seal under (prompted when omitted)
        #[arg(long, env = "PENPAL_SECRET", hide_env_values = true)]
        secret: Option<String>,
    },

    /// Open a base64 sealed blob and print the plaintext
    Open {
        /// Base64 blob (read from stdin when omitted)
        blob: Option<String>,

        /// Secret the blob was sealed under (prompted when omitted)
        #[arg(long, env = "PENPAL_SECRET", hide_env_values = true)]
        secret: Option<String>,
    },

    /// Compose a letter and mine its proof-of-work stamp
    Mine {
        /// Recipient public key (hex)
        #[arg(long)]
        to: String,

        /// Letter body (read from stdin when omitted)
        body: Option<String>,

        /// Letter subject
        #[arg(long)]
        subject: Option<String>,

        /// Sender public key (defaults to --identity)
        #[arg(long)]
        from: Option<String>,

        /// Required leading zero bits
        #[arg(short, long, default_value = "16")]
        difficulty: u32,

        /// Give up after this many seconds
        #[arg(long, default_value = "60")]
        timeout: u64,

        /// Seal the body under this secret before mining
        #[arg(long, env = "PENPAL_SECRET", hide_env_values = true)]
        secret: Option<String>,

        /// Write the mined event to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Verify, decrypt and cache a received letter event
    Receive {
        /// Path to the event JSON
        event: PathBuf,

        /// Secret the letter was sealed under
        #[arg(long, env = "PENPAL_SECRET", hide_env_values = true)]
        secret: Option<String>,

        /// Minimum proof-of-work to accept
        #[arg(long, default_value = "1")]
        min_difficulty: u32,
    },

    /// Manage the decrypted letter cache
    #[command(subcommand)]
    Cache(CacheCommands),

    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum CacheCommands {
    /// Show cache statistics for the current identity
    Stats,

    /// List cached letters
    List,

    /// Show a cached letter
    Show {
        /// Event id
        event_id: String,
    },

    /// Remove a cached letter
    Remove {
        /// Event id
        event_id: String,
    },

    /// Clear the cache for the current identity
    Clear,

    /// Evict old or least recently read letters
    Evict {
        /// Keep at most this many letters
        #[arg(long)]
        max_entries: Option<usize>,

        /// Drop letters cached longer ago than this many days
        #[arg(long)]
        max_age_days: Option<u64>,
    },
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "penpal=debug" } else { "penpal=info" };
    let filter = EnvFilter::try_from_env("PENPAL_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = CliConfig::new(cli.data_dir, cli.identity);

    match cli.command {
        Commands::Seal { text, secret } => {
            commands::seal::seal(text, secret)?;
        }
        Commands::Open { blob, secret } => {
            commands::seal::open(blob, secret)?;
        }
        Commands::Mine {
            to,
            body,
            subject,
            from,
            difficulty,
            timeout,
            secret,
            output,
        } => {
            let args = commands::mine::MineArgs {
                to,
                body,
                subject,
                from,
                difficulty,
                timeout: Duration::from_secs(timeout),
                secret,
                output,
            };
            commands::mine::run(&config, args).await?;
        }
        Commands::Receive {
            event,
            secret,
            min_difficulty,
        } => {
            commands::receive::run(&config, &event, secret, min_difficulty)?;
        }
        Commands::Cache(cmd) => match cmd {
            CacheCommands::Stats => commands::cache::stats(&config)?,
            CacheCommands::List => commands::cache::list(&config)?,
            CacheCommands::Show { event_id } => commands::cache::show(&config, &event_id)?,
            CacheCommands::Remove { event_id } => commands::cache::remove(&config, &event_id)?,
            CacheCommands::Clear => commands::cache::clear(&config)?,
            CacheCommands::Evict {
                max_entries,
                max_age_days,
            } => {
                commands::cache::evict(&config, max_entries, max_age_days)?;
            }
        },
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "penpal", &mut io::stdout());
        }
    }

    Ok(())
}
