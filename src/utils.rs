//! Utility functions for tweet processing.
//!
//! This module provides the date normalization shared by the pipeline and the CLI.

use chrono::{DateTime, Utc};

/// Output format of normalized dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Normalize a raw tweet timestamp to a `YYYY-MM-DD` date.
///
/// Numeric input (including scientific notation such as `1.7E12`) is read as milliseconds
/// since the UNIX epoch and rendered as the UTC calendar date. Anything else is returned
/// unchanged, so normalizing an already normalized date is a no-op.
///
/// # Examples
///
/// ```
/// use tweet_triage::utils::normalize_date;
///
/// assert_eq!(normalize_date("1700000000000"), "2023-11-14");
/// assert_eq!(normalize_date("2023-11-14"), "2023-11-14");
/// ```
#[must_use]
pub fn normalize_date(raw: &str) -> String {
    match raw.trim().parse::<f64>() {
        Ok(millis) if millis.is_finite() => millis_to_date(millis).unwrap_or_else(|| raw.to_string()),
        _ => raw.to_string(),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn millis_to_date(millis: f64) -> Option<String> {
    // Values beyond i64 saturate and are then rejected by chrono's range check.
    let millis = millis.floor() as i64;
    DateTime::<Utc>::from_timestamp_millis(millis).map(|dt| dt.format(DATE_FORMAT).to_string())
}
