//! Error types shared by the tabular and nested writers.

use thiserror::Error;

use crate::document::Container;
use crate::output::BackendError;

pub type Result<T> = std::result::Result<T, OutputError>;

/// Violations of the row protocol: a producer and the schema disagree.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RowProtocolViolation {
    #[error("too few columns written (got {got}, expected {expected})")]
    TooFewColumns { expected: usize, got: usize },

    #[error("too many columns written (got {got}, max is {expected})")]
    TooManyColumns { expected: usize, got: usize },

    #[error("column {column} ('{name}') expects {expected}, got {got}")]
    TypeMismatch {
        column: usize,
        name: String,
        expected: String,
        got: String,
    },
}

/// Errors that can occur while writing structured or tabular output.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unsupported type {semantic} for column '{column}'")]
    UnsupportedType { column: String, semantic: String },

    #[error("row protocol violation: {0}")]
    RowProtocol(#[from] RowProtocolViolation),

    #[error("backend failure: {0}")]
    Backend(#[from] BackendError),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("unbalanced nesting: expected {expected}, found {}", describe_found(.found))]
    Nesting {
        expected: Container,
        found: Option<Container>,
    },

    #[error("formatted value exceeds {limit} bytes")]
    FormatOverflow { limit: usize },
}

fn describe_found(found: &Option<Container>) -> String {
    match found {
        Some(container) => container.to_string(),
        None => "root".to_string(),
    }
}

impl OutputError {
    /// Fatal errors leave the writer unusable for the rest of its life.
    pub fn is_fatal(&self) -> bool {
        matches!(self, OutputError::RowProtocol(_) | OutputError::Backend(_))
    }

    pub(crate) fn invalid_state(message: impl Into<String>) -> Self {
        OutputError::InvalidState(message.into())
    }
}

impl From<std::io::Error> for OutputError {
    fn from(err: std::io::Error) -> Self {
        OutputError::Backend(BackendError::Io(err))
    }
}

impl From<arrow::error::ArrowError> for OutputError {
    fn from(err: arrow::error::ArrowError) -> Self {
        OutputError::Backend(BackendError::Arrow(err))
    }
}

impl From<parquet::errors::ParquetError> for OutputError {
    fn from(err: parquet::errors::ParquetError) -> Self {
        OutputError::Backend(BackendError::Parquet(err))
    }
}
