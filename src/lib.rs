//! Tweet Triage - Complaint Classification for Tweet Exports
//!
//! A Rust library for classifying customer-complaint tweets and keeping the results in an
//! append-only CSV table.
//!
//! # Features
//!
//! - Load a positional CSV export of tweets
//! - Classify severity, sentiment and category through a chat-completion service
//! - Tolerant parsing of free-text model replies
//! - Append results to a CSV table with count-based ids
//! - Offline keyword heuristics and result summaries

/// Classification service seam and prompt
pub mod classifier;
/// Configuration management
pub mod config;
/// Error types
pub mod error;
/// Keyword-based classification
pub mod heuristics;
/// Logging setup and utilities
pub mod logging;
/// Metrics collection
pub mod metrics;
/// Data models and structures
pub mod models;
/// Single-tweet and batch driver
pub mod pipeline;
/// Model reply parsing
pub mod reply_parser;
/// Result table summaries
pub mod report;
/// Append-only result table
pub mod result_table;
/// Tweet export loading
pub mod tweet_store;
/// Shared helpers
pub mod utils;
/// Input validation and sanitization
pub mod validation;

// Re-export key components for easier access
pub use classifier::{ClassificationService, MistralClient, TweetClassifier};
pub use error::{Result, TriageError};
pub use models::{ParsedReply, ResultRecord, Sentiment, TweetRecord};
pub use pipeline::TriagePipeline;
pub use reply_parser::{LineReplyParser, ReplyParser};
pub use result_table::ResultTable;
pub use tweet_store::TweetStore;
