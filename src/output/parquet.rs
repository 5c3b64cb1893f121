//! Parquet batch sink.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use arrow::array::RecordBatch;
use arrow::datatypes::SchemaRef;
use log::debug;
use parquet::arrow::ArrowWriter;

use super::{BackendError, BatchSink};
use crate::config::ParquetOptions;

/// Writes batches into one Parquet stream.
pub struct ParquetBatchSink<W: Write + Send> {
    writer: ArrowWriter<W>,
    rows: usize,
}

impl<W: Write + Send> ParquetBatchSink<W> {
    pub fn new(sink: W, schema: SchemaRef, options: &ParquetOptions) -> Result<Self, BackendError> {
        let props = options.writer_properties();
        let writer = ArrowWriter::try_new(sink, schema, Some(props))?;
        Ok(Self { writer, rows: 0 })
    }

    /// Rows written so far.
    pub fn rows(&self) -> usize {
        self.rows
    }
}

impl ParquetBatchSink<File> {
    pub fn create(path: &Path, schema: SchemaRef, options: &ParquetOptions) -> Result<Self, BackendError> {
        let file = File::create(path)?;
        Self::new(file, schema, options)
    }
}

impl<W: Write + Send> BatchSink for ParquetBatchSink<W> {
    fn write_batch(&mut self, batch: RecordBatch) -> Result<(), BackendError> {
        self.rows += batch.num_rows();
        self.writer.write(&batch)?;
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<(), BackendError> {
        debug!("closing parquet stream after {} rows", self.rows);
        self.writer.close()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrow::{arrow_schema, ColumnSet};
    use crate::config::CompressionCodec;
    use crate::schema::{ColumnDescriptor, Schema, SemanticType};
    use crate::value::Value;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use tempfile::tempdir;

    #[test]
    fn test_write_and_read_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sizes.parquet");

        let schema = Schema::new(vec![ColumnDescriptor::new("size", SemanticType::UInt64)]).unwrap();
        let mut columns = ColumnSet::new(&schema).unwrap();
        columns.append(0, &Value::UInt64(42)).unwrap();
        columns.append(0, &Value::UInt32(7)).unwrap();
        let batch = columns.finish(2).unwrap();

        let options = ParquetOptions {
            compression: CompressionCodec::Snappy,
            ..Default::default()
        };
        let mut sink =
            ParquetBatchSink::create(&path, arrow_schema(&schema).unwrap(), &options).unwrap();
        sink.write_batch(batch).unwrap();
        assert_eq!(sink.rows(), 2);
        Box::new(sink).finish().unwrap();

        let file = File::open(&path).unwrap();
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)
            .unwrap()
            .build()
            .unwrap();
        let rows: usize = reader.map(|b| b.unwrap().num_rows()).sum();
        assert_eq!(rows, 2);
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempdir().unwrap();
        let schema = Schema::new(vec![ColumnDescriptor::new("flag", SemanticType::Bool)]).unwrap();
        let result = ParquetBatchSink::create(
            &dir.path().join("missing/out.parquet"),
            arrow_schema(&schema).unwrap(),
            &ParquetOptions::default(),
        );
        assert!(matches!(result, Err(BackendError::Io(_))));
    }
}
