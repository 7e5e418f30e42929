//! # EO Digest CLI (`eod`)
//!
//! The `eod` binary ingests U.S. executive orders, summarizes them with a
//! text-generation service, and serves the stored summaries over HTTP.
//!
//! ## Usage
//!
//! ```bash
//! eod --config ./config/eod.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `eod init` | Create the SQLite database and schema |
//! | `eod ingest` | Fetch new orders, summarize and store them |
//! | `eod get <eo_id>` | Print one stored record as JSON |
//! | `eod serve` | Start the read API |
//!
//! ## Examples
//!
//! ```bash
//! # Initialize the database
//! eod init
//!
//! # See what would be processed
//! eod ingest --dry-run
//!
//! # Process the ten newest orders with two workers
//! eod ingest --limit 10 --workers 2
//!
//! # Serve the read API
//! eod serve
//! ```
//!
//! Logging goes to stderr and is controlled by `RUST_LOG`
//! (default `eo_digest=info`).

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use eo_digest::{config, get, ingest, migrate, server};

/// EO Digest: plain-English summaries of U.S. executive orders.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/eod.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "eod",
    about = "Ingest, summarize and serve U.S. executive orders",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// A missing file is an error; an empty file uses every default.
    #[arg(long, global = true, default_value = "./config/eod.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Idempotent; running it multiple times is safe.
    Init,

    /// Fetch executive orders and summarize the ones not yet stored.
    ///
    /// Requires `OPENAI_API_KEY` unless `--dry-run` is given. Ctrl-C stops
    /// the run without persisting documents still in flight.
    Ingest {
        /// Only list the descriptors that would be processed.
        #[arg(long)]
        dry_run: bool,

        /// Process at most this many of the newest descriptors.
        #[arg(long)]
        limit: Option<usize>,

        /// Override `[pipeline].workers`.
        #[arg(long)]
        workers: Option<usize>,
    },

    /// Print a stored record by identifier.
    Get {
        /// Federal Register document number, e.g. `2025-00001`.
        eo_id: String,
    },

    /// Start the read-side HTTP API on `[server].bind`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("eo_digest=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Ingest {
            dry_run,
            limit,
            workers,
        } => {
            let cancel = CancellationToken::new();
            let on_signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("interrupt received, cancelling");
                    on_signal.cancel();
                }
            });
            ingest::run_ingest(&cfg, dry_run, limit, workers, &cancel).await?;
        }
        Commands::Get { eo_id } => {
            get::run_get(&cfg, &eo_id).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
