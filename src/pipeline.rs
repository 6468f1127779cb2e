//! Tweet → classification → result table, for one tweet or a sequential batch.

use std::ops::RangeInclusive;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::classifier::{ClassificationService, TweetClassifier};
use crate::error::Result;
use crate::logging::OperationTimer;
use crate::metrics::MetricsCollector;
use crate::models::{BatchReport, NewResult, ParsedReply, ResultRecord, Sentiment, TweetOutcome};
use crate::result_table::ResultTable;
use crate::tweet_store::TweetStore;
use crate::utils::normalize_date;
use crate::validation::InputValidator;

/// Drives tweets through the classifier into the result table
pub struct TriagePipeline<S> {
    store: TweetStore,
    classifier: TweetClassifier<S>,
    table: ResultTable,
    metrics: MetricsCollector,
}

impl<S: ClassificationService> TriagePipeline<S> {
    /// Pipeline over `store` writing to `table`, with fresh metrics
    pub fn new(store: TweetStore, classifier: TweetClassifier<S>, table: ResultTable) -> Self {
        Self {
            store,
            classifier,
            table,
            metrics: MetricsCollector::default(),
        }
    }

    /// Loaded tweets
    pub const fn store(&self) -> &TweetStore {
        &self.store
    }

    /// Result table being appended to
    pub const fn table(&self) -> &ResultTable {
        &self.table
    }

    /// Tallies for this run
    pub const fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    /// Classify the tweet at 1-based `index` and append its result.
    ///
    /// Out-of-range indexes fail before any call is made; nothing is appended on failure.
    pub async fn process_one(&mut self, index: usize) -> Result<ResultRecord> {
        let tweet = self.store.get(index)?.clone();
        let content = InputValidator::sanitize_text(&tweet.content);

        let timer = OperationTimer::new("classify_tweet");
        let outcome = self.classifier.classify(&content).await;
        self.metrics.record_classification(timer.elapsed(), outcome.is_ok());
        let reply = outcome?;

        let parsed = self.classifier.parse(&reply);
        self.record_fallbacks(&parsed);

        let record = self.table.append(NewResult {
            date: normalize_date(&tweet.timestamp),
            parsed,
        })?;
        self.metrics.record_append();

        info!(index, id = record.id, "Tweet classified");
        Ok(record)
    }

    fn record_fallbacks(&mut self, parsed: &ParsedReply) {
        if parsed.score.is_none() {
            self.metrics.record_parse_fallback("score");
        }
        if parsed.sentiment == Sentiment::Unknown {
            self.metrics.record_parse_fallback("sentiment");
        }
        if parsed.category_fallback {
            self.metrics.record_parse_fallback("category");
        }
    }

    /// Process `range` in order, one tweet at a time, sleeping `delay` between tweets.
    ///
    /// Per-tweet failures are reported through `on_outcome` and do not stop the batch. Errors
    /// writing the result table abort it, since every later append would fail the same way.
    pub async fn run_batch<F>(&mut self, range: RangeInclusive<usize>, delay: Duration, mut on_outcome: F) -> Result<BatchReport>
    where
        F: FnMut(usize, &TweetOutcome),
    {
        let timer = OperationTimer::new("batch");
        let mut report = BatchReport::default();
        let (from, to) = (*range.start(), *range.end());
        info!(from, to, delay_secs = delay.as_secs_f64(), "Starting batch");

        for index in range {
            if index > from && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let outcome = match self.process_one(index).await {
                Ok(record) => {
                    report.recorded += 1;
                    TweetOutcome::Recorded(record)
                },
                Err(e) if e.is_per_tweet() => {
                    warn!(index, error = %e, "Skipping tweet");
                    report.failed.push((index, e.to_string()));
                    TweetOutcome::Failed { reason: e.to_string() }
                },
                Err(e) => {
                    error!(index, error = %e, "Batch aborted");
                    return Err(e);
                },
            };
            on_outcome(index, &outcome);
        }

        info!(recorded = report.recorded, failed = report.failed.len(), "Batch finished");
        timer.finish();
        Ok(report)
    }
}
