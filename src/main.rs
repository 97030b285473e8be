// src/main.rs

//! orgminer: resumable GitHub organization crawler CLI.

mod error;
mod models;
mod pipeline;
mod services;
mod storage;
mod utils;

use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::{Parser, Subcommand};

use crate::error::Result;
use crate::models::Config;
use crate::pipeline::run_crawler;
use crate::storage::{CheckpointStore, LocalCheckpointStore};
use crate::utils::log;

#[derive(Parser, Debug)]
#[command(
    name = "orgminer",
    version = "0.1.0",
    about = "Resumable GitHub organization crawler"
)]

/// CLI Arguments
struct Cli {
    #[arg(short, long, default_value = "data/config.toml")]
    config: String,

    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

/// CLI Commands
#[derive(Subcommand, Debug)]
enum Command {
    /// Run or resume the crawl
    Crawl {
        /// Override the configured search query
        #[arg(long)]
        query: Option<String>,
        /// Override the checkpoint file path
        #[arg(long)]
        checkpoint: Option<String>,
    },
    /// Print the checkpoint position without touching the network
    Status,
    /// Validate the configuration file
    Validate,
}

/// Main entry point
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let mut config = Config::load_or_default(&cli.config);

    // Initialize logging system
    log::init(&config.logging.level);

    if cli.quiet {
        config.logging.show_progress = false;
    }

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error(&format!("Fatal: {}", e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, mut config: Config) -> Result<()> {
    match cli.command {
        Command::Crawl { query, checkpoint } => {
            if let Some(query) = query {
                config.crawl.query = query;
            }
            if let Some(path) = checkpoint {
                config.paths.checkpoint_file = path;
            }
            config.validate()?;

            let cancel = Arc::new(AtomicBool::new(false));
            let flag = Arc::clone(&cancel);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    log::warn("Interrupt received; stopping at the next checkpoint");
                    flag.store(true, Ordering::Relaxed);
                }
            });

            run_crawler(&config, cancel).await?;
        }
        Command::Status => {
            let store = LocalCheckpointStore::new(&config.paths.checkpoint_file);
            let checkpoint = store.load_or_default().await;
            log::summary(
                "Checkpoint",
                &[
                    ("File", config.paths.checkpoint_file.clone()),
                    ("Next page", checkpoint.next_page_to_scrape.to_string()),
                    ("Searching date", checkpoint.searching_date.to_string()),
                    (
                        "Organizations recorded",
                        checkpoint.organizations.len().to_string(),
                    ),
                ],
            );
        }
        Command::Validate => {
            config.validate()?;
            log::success("Configuration is valid");
        }
    }

    Ok(())
}
