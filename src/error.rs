// src/error.rs

//! Unified error handling for the crawler application.

use thiserror::Error;

/// Result type alias for crawler operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// The targeted remote resource is access-blocked for policy reasons.
    /// Never retried.
    #[error("Resource blocked: {reason}")]
    ResourceBlocked { reason: String },

    /// The API quota is exhausted. Carries the reset instant (epoch seconds)
    /// reported by the rate-limit headers.
    #[error("Rate limit exceeded, resets at epoch {reset_at}")]
    RateLimited { reset_at: i64 },

    /// Non-success API response that is neither a block nor a rate limit.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Create a blocked-resource error.
    pub fn blocked(reason: impl Into<String>) -> Self {
        Self::ResourceBlocked {
            reason: reason.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether this error is a permanent access block.
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::ResourceBlocked { .. })
    }
}
