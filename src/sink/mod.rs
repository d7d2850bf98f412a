//! Result sinks: the single consumer that drains the result stream and persists rows.

pub mod csv;

use std::path::PathBuf;
use thiserror::Error;

use crate::ChecksumRecord;
use crate::engine::tools::path_to_row_string;

pub use csv::CsvSink;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("writing {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("moving {} to {}", from.display(), to.display())]
    Finalize {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("row {row} rejected: {reason}")]
    Rejected { row: usize, reason: String },
}

/// Consumer of checksum records. Rows arrive in result-stream order, numbered from 1.
pub trait ChecksumSink {
    /// Persist one record as row `row`.
    fn write_row(&mut self, row: usize, record: &ChecksumRecord) -> Result<(), SinkError>;

    /// Flush and finalize once the stream has closed. Called at most once, also after a
    /// failed run so rows that already arrived are kept.
    fn finish(&mut self) -> Result<(), SinkError>;
}

/// One persisted row: (path, lowercase hex digest).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SinkRow {
    pub row: usize,
    pub path: String,
    pub digest_hex: String,
}

impl SinkRow {
    pub fn from_record(row: usize, record: &ChecksumRecord) -> Self {
        Self {
            row,
            path: path_to_row_string(&record.path),
            digest_hex: record.digest.to_hex(),
        }
    }
}

/// Keeps rows in memory. Handy for lib callers that want the table without a file.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub rows: Vec<SinkRow>,
    pub finished: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// (path, hex) pairs sorted by path, for order-insensitive comparison.
    pub fn sorted_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<_> = self
            .rows
            .iter()
            .map(|r| (r.path.clone(), r.digest_hex.clone()))
            .collect();
        pairs.sort();
        pairs
    }
}

impl ChecksumSink for MemorySink {
    fn write_row(&mut self, row: usize, record: &ChecksumRecord) -> Result<(), SinkError> {
        self.rows.push(SinkRow::from_record(row, record));
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        self.finished = true;
        Ok(())
    }
}
