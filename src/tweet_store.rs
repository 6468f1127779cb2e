//! In-memory store of the tweet export.
//!
//! Tweets are read positionally from a CSV file once at startup and addressed by a 1-based
//! index afterwards.

use csv::{ReaderBuilder, StringRecord};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{Result, TriageError};
use crate::models::TweetRecord;

/// Column layout of the tweet export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TweetLayout {
    /// Whether the first row is a header to skip
    pub has_headers: bool,
    /// Field delimiter
    pub delimiter: u8,
    /// 0-based column holding the tweet text
    pub content_column: usize,
    /// 0-based column holding the timestamp
    pub timestamp_column: usize,
}

impl Default for TweetLayout {
    fn default() -> Self {
        Self {
            has_headers: false,
            delimiter: b',',
            content_column: 3,
            timestamp_column: 4,
        }
    }
}

/// Ordered, immutable sequence of tweets
#[derive(Debug, Clone, Default)]
pub struct TweetStore {
    tweets: Vec<TweetRecord>,
}

impl TweetStore {
    /// Load tweets from `path` with the default layout
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_with_layout(path, TweetLayout::default())
    }

    /// Load tweets from `path`.
    ///
    /// Rows that cannot be decoded or lack the content/timestamp columns are skipped with a
    /// warning. Only a missing or unopenable file fails the load.
    pub fn load_with_layout(path: &Path, layout: TweetLayout) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(layout.has_headers)
            .delimiter(layout.delimiter)
            .flexible(true)
            .from_path(path)
            .map_err(|e| TriageError::FileFormat {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let mut tweets = Vec::new();
        let mut skipped = 0usize;

        for (row, result) in reader.records().enumerate() {
            match result {
                Ok(record) => match Self::parse_row(&record, layout) {
                    Some(tweet) => tweets.push(tweet),
                    None => {
                        skipped += 1;
                        warn!(row = row + 1, fields = record.len(), "Skipping row with missing columns");
                    },
                },
                Err(e) => {
                    skipped += 1;
                    warn!(row = row + 1, error = %e, "Skipping malformed row");
                },
            }
        }

        info!(path = %path.display(), tweets = tweets.len(), skipped, "Loaded tweet store");
        Ok(Self { tweets })
    }

    fn parse_row(record: &StringRecord, layout: TweetLayout) -> Option<TweetRecord> {
        let content = record.get(layout.content_column)?;
        let timestamp = record.get(layout.timestamp_column)?;
        Some(TweetRecord {
            content: content.to_string(),
            timestamp: timestamp.to_string(),
        })
    }

    /// Get the tweet at 1-based `index`
    pub fn get(&self, index: usize) -> Result<&TweetRecord> {
        if index == 0 || index > self.tweets.len() {
            debug!(index, count = self.tweets.len(), "Tweet index out of range");
            return Err(TriageError::IndexOutOfRange {
                index,
                count: self.tweets.len(),
            });
        }
        Ok(&self.tweets[index - 1])
    }

    /// Number of tweets loaded
    #[must_use]
    pub fn len(&self) -> usize {
        self.tweets.len()
    }

    /// True when no tweet was loaded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tweets.is_empty()
    }

    /// Iterate over tweets in file order
    pub fn iter(&self) -> impl Iterator<Item = &TweetRecord> {
        self.tweets.iter()
    }
}

impl From<Vec<TweetRecord>> for TweetStore {
    fn from(tweets: Vec<TweetRecord>) -> Self {
        Self { tweets }
    }
}
