//! Pipeline entry points for crawler operations.
//!
//! - `run_crawler`: bootstrap, then drive the windowed crawl to completion
//! - `CrawlController`: the date-windowed pagination state machine
//! - `aggregate`: pure reduction of repository activity into org counters

pub mod aggregate;
pub mod controller;
pub mod crawl;

pub use aggregate::aggregate;
pub use controller::{CrawlController, CrawlOutcome};
pub use crawl::run_crawler;
