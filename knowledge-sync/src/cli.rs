///
/// This module implements the CLI interface for knowledge-sync: command parsing,
/// wiring the concrete clients together, and printing the run report.
///
/// All sync logic (stages, retry policy, aggregation) lives in the [`knowledge-sync-core`] crate.
/// This module is strictly CLI glue.
///
/// ## How To Use
/// - From the shell: `knowledge-sync sync --config sync.yaml`
/// - Programmatically / in integration tests: call [`run`] with a constructed [`Cli`].
///
/// ## Output
/// On success the [`RunReport`](knowledge_sync_core::report::RunReport) is printed to stdout
/// as pretty JSON. A fatal run failure prints `{"error", "timestamp"}` instead and
/// `run` returns an error.
///
/// [`knowledge-sync-core`]: ../../knowledge-sync-core/
use crate::load_config::load_config;
use crate::upload::OpenWebUiClient;
use anyhow::Result;
use clap::{Parser, Subcommand};
use knowledge_sync_core::contract::TokioSleeper;
use knowledge_sync_core::download::BlobStoreClient;
use knowledge_sync_core::synchronise::run_sync;
use std::path::PathBuf;

/// CLI for knowledge-sync: push object-storage files into an Open WebUI knowledge collection.
#[derive(Parser)]
#[clap(
    name = "knowledge-sync",
    version,
    about = "Upload object-storage files to Open WebUI and add them to a knowledge collection"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one sync using the given config file
    Sync {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,

        /// Knowledge collection to add processed files to (overrides config and env)
        #[clap(long)]
        collection_id: Option<String>,

        /// Also write the JSON report to this file
        #[clap(long)]
        output: Option<PathBuf>,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Sync {
            config,
            collection_id,
            output,
        } => {
            let mut config = load_config(config)?;
            if let Some(id) = collection_id {
                config.sync.collection_id = Some(id);
            }
            tracing::info!(command = "sync", "Starting synchronisation process");

            let mut store = BlobStoreClient::new(config.storage.api_url.as_str())?;
            if let Some(prefix) = config.storage.prefix.as_deref() {
                store = store.with_prefix(prefix);
            }
            let client = OpenWebUiClient::new(&config.sync.downstream_base_url)?;

            match run_sync(&config.sync, &store, &store, &client, &TokioSleeper).await {
                Ok(report) => {
                    let json = report.to_json_pretty()?;
                    println!("{json}");
                    if let Some(path) = output {
                        std::fs::write(&path, &json)?;
                        tracing::info!(path = %path.display(), "Report written to file");
                    }
                    tracing::info!(
                        command = "sync",
                        total = report.total_files,
                        failed = report.failed,
                        "Synchronisation complete"
                    );
                    Ok(())
                }
                Err(failure) => {
                    println!("{}", serde_json::to_string_pretty(&failure.to_response())?);
                    tracing::error!(command = "sync", error = %failure, "Synchronisation failed");
                    Err(anyhow::Error::new(failure))
                }
            }
        }
    }
}
