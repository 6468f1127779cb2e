//! Console summary of a result table.

use std::collections::BTreeMap;
use std::fmt;

use crate::models::ResultRecord;

/// Aggregates over the rows of a result table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableSummary {
    /// Number of rows
    pub rows: usize,
    /// Rows carrying a score
    pub scored: usize,
    /// Mean of the present scores
    pub mean_score: Option<f64>,
    /// Rows per sentiment label
    pub by_sentiment: BTreeMap<String, usize>,
    /// Rows per category label
    pub by_category: BTreeMap<String, usize>,
}

impl TableSummary {
    /// Summarize `records`
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_records(records: &[ResultRecord]) -> Self {
        let mut summary = Self {
            rows: records.len(),
            ..Self::default()
        };
        let mut total = 0u64;

        for record in records {
            if let Some(score) = record.score {
                summary.scored += 1;
                total += u64::from(score);
            }
            *summary.by_sentiment.entry(record.sentiment.clone()).or_insert(0) += 1;
            *summary.by_category.entry(record.category.clone()).or_insert(0) += 1;
        }

        if summary.scored > 0 {
            summary.mean_score = Some(total as f64 / summary.scored as f64);
        }
        summary
    }

    /// Categories by descending count, then by name
    #[must_use]
    pub fn top_categories(&self) -> Vec<(&str, usize)> {
        let mut categories: Vec<(&str, usize)> = self.by_category.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        categories.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        categories
    }
}

impl fmt::Display for TableSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Rows: {}", self.rows)?;
        match self.mean_score {
            Some(mean) => writeln!(f, "Mean score: {mean:.1} ({} scored)", self.scored)?,
            None => writeln!(f, "Mean score: n/a")?,
        }
        writeln!(f, "\nSentiment:")?;
        for (sentiment, count) in &self.by_sentiment {
            writeln!(f, "  {sentiment}: {count}")?;
        }
        writeln!(f, "\nCategories:")?;
        for (category, count) in self.top_categories() {
            writeln!(f, "  {category}: {count}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u64, score: Option<u8>, sentiment: &str, category: &str) -> ResultRecord {
        ResultRecord {
            id,
            date: "2023-11-14".to_string(),
            score,
            sentiment: sentiment.to_string(),
            category: category.to_string(),
        }
    }

    #[test]
    fn test_summary() {
        let records = [
            record(1, Some(80), "négatif", "panne et urgences"),
            record(2, None, "inconnu", "Tarifs"),
            record(3, Some(40), "négatif", "panne et urgences"),
        ];
        let summary = TableSummary::from_records(&records);

        assert_eq!(summary.rows, 3);
        assert_eq!(summary.scored, 2);
        assert_eq!(summary.mean_score, Some(60.0));
        assert_eq!(summary.by_sentiment["négatif"], 2);
        assert_eq!(summary.top_categories()[0], ("panne et urgences", 2));
    }

    #[test]
    fn test_empty_summary() {
        let summary = TableSummary::from_records(&[]);
        assert_eq!(summary.mean_score, None);
        assert!(summary.to_string().contains("n/a"));
    }
}
