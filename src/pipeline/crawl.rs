// src/pipeline/crawl.rs

//! Organization crawling pipeline.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use chrono::Utc;

use crate::error::Result;
use crate::models::Config;
use crate::pipeline::controller::{CrawlController, CrawlOutcome};
use crate::services::{GithubClient, Governor};
use crate::storage::LocalCheckpointStore;
use crate::utils::log;

/// Run the organization crawler, resuming from the configured checkpoint.
pub async fn run_crawler(config: &Config, cancel: Arc<AtomicBool>) -> Result<CrawlOutcome> {
    let start_time = Utc::now();
    log::header("orgminer: organization crawl");
    log::info(&format!("Query: {}", config.crawl.query));
    log::info(&format!("Checkpoint: {}", config.paths.checkpoint_file));

    let api = GithubClient::new(config.api.clone())?;
    let store = LocalCheckpointStore::new(&config.paths.checkpoint_file);
    let governor = Governor::new(config.crawl.retries);

    let controller = CrawlController::new(
        api,
        store,
        governor,
        config.crawl.clone(),
        config.logging.show_progress,
        cancel,
    );
    let outcome = controller.run().await?;

    let elapsed = Utc::now() - start_time;
    log::summary(
        "Crawl run",
        &[
            ("Organizations appended", outcome.appended.to_string()),
            ("Total candidates", outcome.total_candidates.to_string()),
            ("Final window date", outcome.final_date.to_string()),
            (
                "Finished",
                if outcome.cancelled {
                    "cancelled".to_string()
                } else {
                    "complete".to_string()
                },
            ),
            ("Elapsed", format!("{}s", elapsed.num_seconds())),
        ],
    );

    Ok(outcome)
}
