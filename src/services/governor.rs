// src/services/governor.rs

//! Request governor: turns a fallible, rate-limited remote call into a
//! reliable one.
//!
//! Every remote call the crawl issues goes through [`Governor::run`].
//! Outcomes are classified in priority order:
//!
//! 1. Permanent block — fails immediately, never retried.
//! 2. Rate limit exhausted — blocks the calling flow until one second past
//!    the reset instant, then retries without consuming the retry budget.
//! 3. Any other error with budget remaining — immediate retry.
//! 4. Any other error with the budget exhausted — propagated to the caller.
//! 5. Success — payload returned as-is. A successful payload that reports
//!    zero remaining quota is not failed; the next call's error metadata is
//!    what gets classified.

use chrono::Utc;

use crate::error::{AppError, Result};
use crate::utils::{log, time};

/// Margin added to the reported reset instant before retrying.
const RESET_MARGIN_SECS: i64 = 1;

/// Rate-limit and retry discipline around remote calls.
#[derive(Debug, Clone, Copy)]
pub struct Governor {
    retries: u32,
}

impl Governor {
    /// Create a governor with the given transient-retry budget.
    pub fn new(retries: u32) -> Self {
        Self { retries }
    }

    /// Run a remote operation under the governor's policy.
    ///
    /// `context` names the operation in wait/retry notices. The operation
    /// is re-invoked from scratch on every attempt.
    pub async fn run<T, F, Fut>(&self, context: &str, op: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut budget = self.retries;

        loop {
            match op().await {
                Ok(payload) => return Ok(payload),

                // Policy blocks are permanent for this resource.
                Err(err @ AppError::ResourceBlocked { .. }) => return Err(err),

                // Quota waits do not consume the retry budget.
                Err(AppError::RateLimited { reset_at }) => {
                    let resume_at = reset_at + RESET_MARGIN_SECS;
                    log::info(&format!(
                        "Rate limit hit on {}; waiting until {} ({}s)",
                        context,
                        time::clock_time(resume_at),
                        (resume_at - Utc::now().timestamp()).max(0),
                    ));
                    time::sleep_until_epoch(resume_at).await;
                    log::info(&format!("Rate limit reset; resuming {}", context));
                }

                Err(err) if budget > 0 => {
                    budget -= 1;
                    log::warn(&format!("Retrying {} after error: {}", context, err));
                }

                Err(err) => return Err(err),
            }
        }
    }
}

impl Default for Governor {
    fn default() -> Self {
        Self::new(1)
    }
}
