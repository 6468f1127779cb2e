use metrics::{counter, histogram};
use std::time::Duration;

/// Metrics collection and management
///
/// Every event goes to the global `metrics` recorder and is also tallied locally, so the
/// batch report can be built without a recorder installed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MetricsCollector {
    /// Successful classification calls
    pub tweets_classified_total: u64,
    /// Failed classification calls
    pub classification_failures_total: u64,
    /// Rows appended to the result table
    pub rows_appended_total: u64,
    /// Reply fields that fell back to their sentinel value
    pub parse_fallbacks_total: u64,
}

impl MetricsCollector {
    /// Counter of classification calls, labelled by status
    pub const CLASSIFICATIONS: &'static str = "tweet_triage_classifications_total";
    /// Histogram of classification call durations
    pub const CLASSIFICATION_DURATION: &'static str = "tweet_triage_classification_duration_seconds";
    /// Counter of appended result rows
    pub const ROWS_APPENDED: &'static str = "tweet_triage_rows_appended_total";
    /// Counter of reply fields that fell back, labelled by field
    pub const PARSE_FALLBACKS: &'static str = "tweet_triage_parse_fallbacks_total";

    /// Record one classification call
    pub fn record_classification(&mut self, duration: Duration, success: bool) {
        let status = if success { "success" } else { "error" };
        counter!(Self::CLASSIFICATIONS, "status" => status).increment(1);
        histogram!(Self::CLASSIFICATION_DURATION).record(duration.as_secs_f64());

        if success {
            self.tweets_classified_total += 1;
        } else {
            self.classification_failures_total += 1;
        }
    }

    /// Record one appended result row
    pub fn record_append(&mut self) {
        counter!(Self::ROWS_APPENDED).increment(1);
        self.rows_appended_total += 1;
    }

    /// Record a reply field that degraded to its fallback
    pub fn record_parse_fallback(&mut self, field: &'static str) {
        counter!(Self::PARSE_FALLBACKS, "field" => field).increment(1);
        self.parse_fallbacks_total += 1;
    }
}
