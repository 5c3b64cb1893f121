//! Tabular output: a fixed schema, many rows, flushed in batches.

pub mod cursor;
pub mod writer;

pub use cursor::RowCursor;
pub use writer::TableWriter;
