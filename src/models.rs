//! Data models for tweets and classification results
//!
//! This module contains the data structures shared by the tweet store, the reply parser,
//! the result table and the batch driver.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A tweet read from the export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TweetRecord {
    /// Free-text tweet content
    pub content: String,
    /// Raw timestamp: epoch milliseconds or an already formatted date
    pub timestamp: String,
}

/// Sentiment label extracted from a model reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sentiment {
    /// `positif`
    Positive,
    /// `neutre`
    Neutral,
    /// `négatif`
    Negative,
    /// `inconnu`, used when no label could be found
    Unknown,
}

impl Sentiment {
    /// The labels the model is asked to answer with, in prompt order
    pub const LABELS: [Self; 3] = [Self::Positive, Self::Neutral, Self::Negative];

    /// Label as written in the result table
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positif",
            Self::Neutral => "neutre",
            Self::Negative => "négatif",
            Self::Unknown => "inconnu",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured fields extracted from one model reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReply {
    /// Severity 0-100, `None` when the reply had no usable score line
    pub score: Option<u8>,
    /// Sentiment label
    pub sentiment: Sentiment,
    /// Category label, fixed or invented by the model
    pub category: String,
    /// True when no fixed label was found and the category is a guess
    pub category_fallback: bool,
}

/// Unparsed text returned by the classification service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawModelReply {
    /// Reply text as received
    pub text: String,
}

/// A classified tweet waiting for an id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewResult {
    /// Normalized `YYYY-MM-DD` date, or the raw timestamp when not numeric
    pub date: String,
    /// Parsed reply fields
    pub parsed: ParsedReply,
}

/// One row of the result table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// Row count at write time plus one
    #[serde(rename = "ID")]
    pub id: u64,
    /// Tweet date
    pub date: String,
    /// Severity score, empty in the file when absent
    pub score: Option<u8>,
    /// Sentiment label
    pub sentiment: String,
    /// Category label
    pub category: String,
}

impl ResultRecord {
    /// Build the row for `result` with the given id
    #[must_use]
    pub fn from_new(id: u64, result: NewResult) -> Self {
        Self {
            id,
            date: result.date,
            score: result.parsed.score,
            sentiment: result.parsed.sentiment.as_str().to_string(),
            category: result.parsed.category,
        }
    }
}

/// Outcome of one tweet in a batch run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TweetOutcome {
    /// The tweet was classified and appended
    Recorded(ResultRecord),
    /// The tweet was skipped
    Failed {
        /// Reason reported to the operator
        reason: String,
    },
}

/// Totals of a batch run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Tweets appended to the result table
    pub recorded: usize,
    /// Tweets skipped, with their index and reason
    pub failed: Vec<(usize, String)>,
}

impl BatchReport {
    /// Number of tweets attempted
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.recorded + self.failed.len()
    }
}
