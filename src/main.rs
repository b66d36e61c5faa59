//! # docqa CLI
//!
//! The `docqa` binary runs the question-answering service and a couple of
//! operational helpers.
//!
//! ## Usage
//!
//! ```bash
//! docqa --config ./config/docqa.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docqa serve` | Start the HTTP service (upload + ask) |
//! | `docqa check` | Probe the configured Ollama instance and models |
//!
//! The config file is optional; without one the service binds
//! `0.0.0.0:7860` and talks to Ollama on `localhost:11434` with
//! `nomic-embed-text` embeddings and the `tinyllama` model.

mod check;
mod chunk;
mod config;
mod embedding;
mod extract;
mod index;
mod ingest;
mod llm;
mod pipeline;
mod server;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// docqa — upload PDF documents and ask questions about them, answered by
/// a local language model over retrieved context.
#[derive(Parser)]
#[command(
    name = "docqa",
    about = "Ask questions about your PDF documents — a self-hosted RAG service backed by Ollama",
    version
)]
struct Cli {
    /// Path to configuration file (TOML). Optional; built-in defaults are
    /// used when the file does not exist.
    #[arg(long, global = true, default_value = "./config/docqa.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP service.
    ///
    /// Serves the upload page on `/`, the API under `/api/`, and a health
    /// check on `/health`. The in-memory index starts empty and is rebuilt
    /// on every upload.
    Serve,

    /// Probe the configured Ollama instance.
    ///
    /// Checks reachability and whether the embedding and generation models
    /// have been pulled. Useful before the first `serve`.
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_or_default(&cli.config)?;

    match cli.command {
        Commands::Serve => {
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
                )
                .init();
            server::run_server(&cfg).await?;
        }
        Commands::Check => {
            check::run_check(&cfg).await?;
        }
    }

    Ok(())
}
