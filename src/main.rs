use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tagalog_core::config::AppConfig;
use tagalog_core::study::StudyStore;
use tagalog_core::telemetry::init_tracing;
use tracing::info;

#[derive(Parser)]
#[command(name = "tagalog-core", about = "Inspect and maintain stored study data", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print a progress summary for today as JSON
    Summary,
    /// Write an export of all study records to stdout
    Export,
    /// Merge an export file into the stored records
    Import {
        /// Path to a previously exported JSON file
        file: PathBuf,
    },
    /// Delete every stored study record
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = AppConfig::from_env()?;
    info!(target: "tagalog_core", storage = ?config.storage, "configuration loaded");
    let store = StudyStore::new(config.storage.open()?);

    tokio::task::spawn_blocking(move || run(&store, cli.command))
        .await
        .context("study store task panicked")?
}

fn run(store: &StudyStore, command: Command) -> Result<()> {
    match command {
        Command::Summary => {
            let summary = store.summary(Utc::now().date_naive());
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Export => {
            println!("{}", store.export_data()?);
        }
        Command::Import { file } => {
            let payload = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {file:?}"))?;
            if !store.import_data(&payload) {
                bail!("{file:?} is not a valid study data export");
            }
            info!(target: "tagalog_core", file = ?file, "import applied");
        }
        Command::Reset => {
            store.clear_all_data()?;
            info!(target: "tagalog_core", "study data cleared");
        }
    }
    Ok(())
}
