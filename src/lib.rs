//! Structured and tabular output writers.
//!
//! Producers emit typed values either as a table (fixed columns, many rows,
//! flushed as Arrow record batches into Parquet) or as a nested document
//! (objects and arrays, written as JSON).

pub mod arrow;
pub mod codec;
pub mod config;
pub mod document;
pub mod error;
pub mod json;
pub mod output;
pub mod schema;
pub mod sink;
pub mod table;
pub mod termination;
pub mod value;

pub use config::OutputOptions;
pub use document::{Container, DocValue, StructuredOutput};
pub use error::{OutputError, Result, RowProtocolViolation};
pub use schema::{ColumnDescriptor, EnumValue, Schema, SemanticType};
pub use sink::TableOutput;
pub use table::TableWriter;
pub use value::{Value, Xml};
