//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::utils::log;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Remote API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Crawl behavior settings
    #[serde(default)]
    pub crawl: CrawlConfig,

    /// File locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn(&format!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            ));
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(AppError::config("api.base_url is empty"));
        }
        if self.api.user_agent.trim().is_empty() {
            return Err(AppError::config("api.user_agent is empty"));
        }
        if self.api.timeout_secs == 0 {
            return Err(AppError::config("api.timeout_secs must be > 0"));
        }
        if self.crawl.query.trim().is_empty() {
            return Err(AppError::config("crawl.query is empty"));
        }
        if self.crawl.per_page == 0 || self.crawl.per_page > 100 {
            return Err(AppError::config("crawl.per_page must be in 1..=100"));
        }
        if self.paths.checkpoint_file.trim().is_empty() {
            return Err(AppError::config("paths.checkpoint_file is empty"));
        }
        Ok(())
    }
}

/// Remote API client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the GitHub REST API
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Optional personal access token (raises the search rate limit)
    #[serde(default)]
    pub token: Option<String>,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            token: None,
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Crawl behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Base search query (without the creation-date qualifier)
    #[serde(default = "defaults::query")]
    pub query: String,

    /// Search results per page
    #[serde(default = "defaults::per_page")]
    pub per_page: u32,

    /// Retry budget for transient request failures
    #[serde(default = "defaults::retries")]
    pub retries: u32,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            query: defaults::query(),
            per_page: defaults::per_page(),
            retries: defaults::retries(),
        }
    }
}

/// File location settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Checkpoint document path
    #[serde(default = "defaults::checkpoint_file")]
    pub checkpoint_file: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            checkpoint_file: defaults::checkpoint_file(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum log level (debug/info/warn/error)
    #[serde(default = "defaults::log_level")]
    pub level: String,

    /// Emit per-entity progress lines
    #[serde(default = "defaults::show_progress")]
    pub show_progress: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
            show_progress: defaults::show_progress(),
        }
    }
}

mod defaults {
    // API defaults
    pub fn base_url() -> String {
        "https://api.github.com".into()
    }
    pub fn user_agent() -> String {
        "orgminer/0.1".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Crawl defaults
    pub fn query() -> String {
        "type:org".into()
    }
    pub fn per_page() -> u32 {
        100
    }
    pub fn retries() -> u32 {
        1
    }

    // Path defaults
    pub fn checkpoint_file() -> String {
        "data/checkpoint.json".into()
    }

    // Logging defaults
    pub fn log_level() -> String {
        "info".into()
    }
    pub fn show_progress() -> bool {
        true
    }
}
