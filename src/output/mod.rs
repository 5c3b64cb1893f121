//! Batch sinks: where finished record batches go.
//!
//! A tabular writer owns one sink at a time. Parquet writes batches to any
//! byte stream; the memory sink keeps them for the caller.

pub mod memory;
pub mod parquet;

use std::path::Path;

use arrow::array::RecordBatch;
use thiserror::Error;

pub use self::memory::MemoryBatchSink;
pub use self::parquet::ParquetBatchSink;

/// Failures reported by a storage backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] ::parquet::errors::ParquetError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Receiver of flushed batches.
pub trait BatchSink: Send {
    /// Write one batch. Batches arrive in flush order and share one schema.
    fn write_batch(&mut self, batch: RecordBatch) -> Result<(), BackendError>;

    /// Finish writing; for files this writes the footer.
    fn finish(self: Box<Self>) -> Result<(), BackendError>;
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Parquet,
    Json,
}

impl OutputFormat {
    /// Guess the format from a file extension.
    pub fn infer_from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "parquet" | "pq" => Some(OutputFormat::Parquet),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_format() {
        assert_eq!(
            OutputFormat::infer_from_path(Path::new("out/files.parquet")),
            Some(OutputFormat::Parquet)
        );
        assert_eq!(
            OutputFormat::infer_from_path(Path::new("files.JSON")),
            Some(OutputFormat::Json)
        );
        assert_eq!(OutputFormat::infer_from_path(Path::new("files")), None);
        assert_eq!(OutputFormat::infer_from_path(Path::new("files.csv")), None);
    }
}
