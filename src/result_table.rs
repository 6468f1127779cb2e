//! Append-only CSV table of classification results.
//!
//! Rows are never rewritten. The id of a new row is the number of data rows already in the
//! file plus one, read right before the append. The read and the write are not atomic, so two
//! processes appending to the same file can assign the same id.

use csv::{ReaderBuilder, WriterBuilder};
use std::fs::OpenOptions;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::models::{NewResult, ResultRecord};

/// Column names of the result table, in file order
pub const HEADER: [&str; 5] = ["ID", "date", "score", "sentiment", "category"];

/// Handle to a result table on disk
#[derive(Debug, Clone)]
pub struct ResultTable {
    path: PathBuf,
}

impl ResultTable {
    /// Open a handle; the file is created on first append
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the table
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of data rows, header excluded. A missing file has none.
    pub fn row_count(&self) -> Result<u64> {
        if !self.path.exists() {
            return Ok(0);
        }

        let mut reader = ReaderBuilder::new().has_headers(true).flexible(true).from_path(&self.path)?;
        let mut count = 0u64;
        for record in reader.byte_records() {
            if let Err(e) = record {
                warn!(path = %self.path.display(), error = %e, "Malformed row in result table");
            }
            count += 1;
        }
        Ok(count)
    }

    /// Id the next appended row will receive
    pub fn next_id(&self) -> Result<u64> {
        Ok(self.row_count()? + 1)
    }

    /// Append one result, assigning its id.
    ///
    /// The header is written only when the file is absent or empty at the start of the call.
    pub fn append(&mut self, result: NewResult) -> Result<ResultRecord> {
        let id = self.next_id()?;
        let needs_header = std::fs::metadata(&self.path).map_or(true, |meta| meta.len() == 0);

        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_writer(BufWriter::new(file));

        if needs_header {
            debug!(path = %self.path.display(), "Writing result table header");
            writer.write_record(HEADER)?;
        }

        let record = ResultRecord::from_new(id, result);
        writer.serialize(&record)?;
        writer.flush()?;

        info!(id, date = %record.date, score = ?record.score, sentiment = %record.sentiment, "Appended classification result");
        Ok(record)
    }

    /// Read every row of the table. A missing file reads as empty.
    pub fn read_all(&self) -> Result<Vec<ResultRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = ReaderBuilder::new().has_headers(true).flexible(true).from_path(&self.path)?;
        let mut records = Vec::new();
        for (row, result) in reader.deserialize::<ResultRecord>().enumerate() {
            match result {
                Ok(record) => records.push(record),
                Err(e) => warn!(row = row + 1, error = %e, "Skipping unreadable result row"),
            }
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ParsedReply, Sentiment};
    use tempfile::tempdir;

    fn sample(score: Option<u8>) -> NewResult {
        NewResult {
            date: "2023-11-14".to_string(),
            parsed: ParsedReply {
                score,
                sentiment: Sentiment::Negative,
                category: "panne et urgences".to_string(),
                category_fallback: false,
            },
        }
    }

    #[test]
    fn test_first_append_writes_header() {
        let dir = tempdir().expect("Failed to create temp directory");
        let mut table = ResultTable::new(dir.path().join("results.csv"));

        let record = table.append(sample(Some(40))).expect("append");
        assert_eq!(record.id, 1);

        let contents = std::fs::read_to_string(table.path()).expect("read table");
        assert_eq!(contents, "ID,date,score,sentiment,category\n1,2023-11-14,40,négatif,panne et urgences\n");
    }

    #[test]
    fn test_missing_score_is_empty_field() {
        let dir = tempdir().expect("Failed to create temp directory");
        let mut table = ResultTable::new(dir.path().join("results.csv"));

        table.append(sample(None)).expect("append");
        let rows = table.read_all().expect("read back");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].score, None);

        let contents = std::fs::read_to_string(table.path()).expect("read table");
        assert!(contents.ends_with("1,2023-11-14,,négatif,panne et urgences\n"));
    }

    #[test]
    fn test_row_count_of_missing_file() {
        let table = ResultTable::new("/nonexistent/dir/results.csv");
        assert_eq!(table.row_count().expect("count"), 0);
        assert_eq!(table.next_id().expect("next id"), 1);
    }
}
