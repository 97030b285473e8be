// src/models/mod.rs

//! Domain models for the crawler application.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod checkpoint;
mod config;
mod organization;
mod repository;

// Re-export all public types
pub use checkpoint::Checkpoint;
pub use config::{ApiConfig, Config, CrawlConfig, LoggingConfig, PathsConfig};
pub use organization::{Organization, OrgProfile, OrgStats};
pub use repository::{RepoActivity, Repository};
