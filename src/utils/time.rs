// src/utils/time.rs

//! Calendar and clock helpers for the windowed crawl.

use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Local, NaiveDate, Utc};

/// Subtract `weeks` calendar weeks from a date.
pub fn weeks_back(date: NaiveDate, weeks: i64) -> NaiveDate {
    date - Duration::weeks(weeks)
}

/// Today's date in UTC.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Format an epoch-seconds instant as a local wall-clock time, for
/// operator-facing wait/resume notices.
pub fn clock_time(epoch_secs: i64) -> String {
    match DateTime::<Utc>::from_timestamp(epoch_secs, 0) {
        Some(instant) => instant
            .with_timezone(&Local)
            .format("%H:%M:%S")
            .to_string(),
        None => format!("epoch {}", epoch_secs),
    }
}

/// Sleep until the given epoch-seconds instant has passed. Returns
/// immediately if the instant is already in the past.
pub async fn sleep_until_epoch(epoch_secs: i64) {
    let now = Utc::now().timestamp();
    if epoch_secs > now {
        let wait = (epoch_secs - now) as u64;
        tokio::time::sleep(StdDuration::from_secs(wait)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weeks_back() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        assert_eq!(
            weeks_back(date, 1),
            NaiveDate::from_ymd_opt(2026, 3, 8).unwrap()
        );
        assert_eq!(
            weeks_back(date, 3),
            NaiveDate::from_ymd_opt(2026, 2, 22).unwrap()
        );
    }

    #[test]
    fn test_weeks_back_crosses_year() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 3).unwrap();
        assert_eq!(
            weeks_back(date, 1),
            NaiveDate::from_ymd_opt(2025, 12, 27).unwrap()
        );
    }

    #[test]
    fn test_clock_time_invalid_epoch() {
        // Far out of range timestamps fall back to the raw value.
        assert!(clock_time(i64::MAX).contains("epoch"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_until_past_instant_returns_immediately() {
        // Must not hang when the reset instant is already behind us.
        sleep_until_epoch(Utc::now().timestamp() - 100).await;
    }
}
