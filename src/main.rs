//! # corpus CLI
//!
//! Command-line interface over the content sync pipeline.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `corpus sync` | Refresh all content sources that are due for an update |
//! | `corpus sources` | Show configured sources, file counts, and last sync times |
//! | `corpus docs` | Emit the document stream for downstream indexing |
//! | `corpus interactions <cmd>` | Inspect the sibling interaction log |
//!
//! ```bash
//! corpus --config ./content_sources.yaml sync --force
//! corpus --config ./content_sources.yaml docs --json > documents.jsonl
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use corpus_sync::interaction_log::InteractionLogger;
use corpus_sync::loader;
use corpus_sync::manager::ContentManager;

/// corpus-sync CLI — keeps content checkouts fresh and emits the document
/// stream consumed by the indexing side of the pipeline.
#[derive(Parser)]
#[command(
    name = "corpus",
    about = "Synchronise version-controlled content sources and emit a document stream",
    version
)]
struct Cli {
    /// Path to the content sources configuration file (YAML).
    #[arg(long, global = true, default_value = "./content_sources.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh all content sources that are due for an update.
    ///
    /// Fetches run concurrently with a per-source timeout. A failing source
    /// is reported but never stops the others.
    Sync {
        /// Fetch every source regardless of its refresh cadence.
        #[arg(long)]
        force: bool,
    },

    /// Show a snapshot of configured sources and their file counts.
    Sources,

    /// Emit the document stream for downstream indexing.
    ///
    /// Refreshes stale sources first, then reads whatever is on disk.
    Docs {
        /// Skip the refresh pass and read the current checkouts as-is.
        #[arg(long)]
        skip_sync: bool,

        /// Emit full documents as JSON Lines instead of a summary.
        #[arg(long)]
        json: bool,
    },

    /// Inspect the sibling interaction log.
    Interactions {
        #[command(subcommand)]
        action: InteractionsAction,
    },
}

#[derive(Subcommand)]
enum InteractionsAction {
    /// List recent interactions, most recent first.
    List {
        /// Directory holding the interaction log files.
        #[arg(long, default_value = "interactions")]
        log_dir: PathBuf,

        /// Maximum number of records to show.
        #[arg(long, default_value_t = 20)]
        limit: usize,

        /// Filter by source channel (e.g. local, web, github).
        #[arg(long)]
        channel: Option<String>,
    },

    /// Aggregate statistics over the interaction log.
    Stats {
        #[arg(long, default_value = "interactions")]
        log_dir: PathBuf,
    },

    /// Export a flattened JSONL training dataset.
    Export {
        #[arg(long, default_value = "interactions")]
        log_dir: PathBuf,

        /// Output file name, created inside the log directory.
        #[arg(long, default_value = "training_data.jsonl")]
        output: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Sync { force } => {
            let mut manager = ContentManager::from_config_file(&cli.config)?;
            let summary = manager.refresh(force).await;
            println!("sync");
            println!("  attempted: {}", summary.attempted);
            println!("  succeeded: {}", summary.succeeded);
            println!("  failed:    {}", summary.failed);
            println!("  skipped:   {}", summary.skipped);
            if !summary.all_ok() {
                anyhow::bail!("refresh finished with failures");
            }
            println!("ok");
        }

        Commands::Sources => {
            let manager = ContentManager::from_config_file(&cli.config)?;
            let stats = manager.stats();
            println!(
                "{:<20} {:<12} {:>6}   {:<18} {}",
                "SOURCE", "BRANCH", "FILES", "LAST SYNC", "URL"
            );
            for source in &stats.sources {
                let last_sync = source
                    .last_sync_time
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "never".to_string());
                println!(
                    "{:<20} {:<12} {:>6}   {:<18} {}",
                    source.name, source.branch, source.file_count, last_sync, source.url
                );
            }
            println!();
            println!(
                "{} source(s), {} file(s) total",
                stats.source_count, stats.total_file_count
            );
        }

        Commands::Docs { skip_sync, json } => {
            let documents = if skip_sync {
                let manager = ContentManager::from_config_file(&cli.config)?;
                loader::load_documents(&manager.collect_documents())
            } else {
                loader::sync_and_load(&cli.config).await?
            };

            for document in &documents {
                if json {
                    println!("{}", serde_json::to_string(document)?);
                } else {
                    println!(
                        "{:<16} {:>8} B  {}",
                        document.metadata.source,
                        document.text.len(),
                        document.path
                    );
                }
            }
            if !json {
                println!();
                println!("{} document(s)", documents.len());
            }
        }

        Commands::Interactions { action } => match action {
            InteractionsAction::List {
                log_dir,
                limit,
                channel,
            } => {
                let log = InteractionLogger::new(log_dir)?;
                for record in log.interactions(limit, channel.as_deref(), None)? {
                    println!(
                        "{}  [{}]  {:.2}  {}",
                        record.timestamp.format("%Y-%m-%d %H:%M"),
                        record.channel,
                        record.confidence,
                        truncate(&record.question, 60)
                    );
                }
            }
            InteractionsAction::Stats { log_dir } => {
                let log = InteractionLogger::new(log_dir)?;
                println!("{}", serde_json::to_string_pretty(&log.stats()?)?);
            }
            InteractionsAction::Export { log_dir, output } => {
                let log = InteractionLogger::new(log_dir)?;
                let path = log.export_for_training(&output)?;
                println!("exported to {}", path.display());
            }
        },
    }

    Ok(())
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars).collect();
        format!("{head}...")
    }
}
