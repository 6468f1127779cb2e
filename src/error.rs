//! Error types for the tweet-triage library.
//!
//! This module provides custom error types using `thiserror` for the failure modes of the
//! classification pipeline. Degraded model replies are not errors; see [`crate::reply_parser`].

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in the tweet-triage application.
#[derive(Error, Debug)]
pub enum TriageError {
    /// The tweet export is missing or cannot be read as CSV
    #[error("Cannot read tweet file {path}: {reason}")]
    FileFormat {
        /// Path that was requested
        path: PathBuf,
        /// What went wrong
        reason: String,
    },

    /// A tweet index outside `[1, count]` was requested
    #[error("Invalid tweet number {index}. Please choose a number between 1 and {count}.")]
    IndexOutOfRange {
        /// Requested 1-based index
        index: usize,
        /// Number of tweets in the store
        count: usize,
    },

    /// The external text-generation service failed or timed out
    #[error("Classification service error: {0}")]
    ClassificationService(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reading/writing errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Convenience type alias for Result with `TriageError`
pub type Result<T> = std::result::Result<T, TriageError>;

impl From<reqwest::Error> for TriageError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::ClassificationService(format!("request timed out: {err}"))
        } else {
            Self::ClassificationService(err.to_string())
        }
    }
}

impl TriageError {
    /// True for failures that should skip a single tweet rather than stop a batch
    #[must_use]
    pub const fn is_per_tweet(&self) -> bool {
        matches!(self, Self::ClassificationService(_) | Self::IndexOutOfRange { .. })
    }
}
