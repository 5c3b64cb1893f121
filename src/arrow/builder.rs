use std::sync::Arc;

use arrow::array::{
    ArrayBuilder, ArrayRef, BinaryBuilder, BooleanBuilder, FixedSizeBinaryBuilder, Int16Builder,
    Int32Builder, Int64Builder, Int8Builder, NullArray, NullBuilder, StringBuilder,
    TimestampMicrosecondBuilder, UInt16Builder, UInt32Builder, UInt64Builder, UInt8Builder,
};
use arrow::datatypes::{DataType, TimeUnit};
use thiserror::Error;

/// Errors that can occur while creating a column builder.
#[derive(Debug, Error)]
pub enum BuilderError {
    #[error("unsupported data type: {0}")]
    UnsupportedType(DataType),
}

/// A typed Arrow builder for one column, chosen from the column's data type.
#[derive(Debug)]
pub enum ColumnBuilder {
    Null(NullBuilder),
    Bool(BooleanBuilder),
    Int8(Int8Builder),
    Int16(Int16Builder),
    Int32(Int32Builder),
    Int64(Int64Builder),
    UInt8(UInt8Builder),
    UInt16(UInt16Builder),
    UInt32(UInt32Builder),
    UInt64(UInt64Builder),
    TimestampUs(TimestampMicrosecondBuilder),
    String(StringBuilder),
    Binary(BinaryBuilder),
    FixedBinary(FixedSizeBinaryBuilder),
}

impl ColumnBuilder {
    /// Create an empty builder for the given data type.
    pub fn new(data_type: &DataType) -> Result<Self, BuilderError> {
        match data_type {
            DataType::Null => Ok(ColumnBuilder::Null(NullBuilder::new())),
            DataType::Boolean => Ok(ColumnBuilder::Bool(BooleanBuilder::new())),
            DataType::Int8 => Ok(ColumnBuilder::Int8(Int8Builder::new())),
            DataType::Int16 => Ok(ColumnBuilder::Int16(Int16Builder::new())),
            DataType::Int32 => Ok(ColumnBuilder::Int32(Int32Builder::new())),
            DataType::Int64 => Ok(ColumnBuilder::Int64(Int64Builder::new())),
            DataType::UInt8 => Ok(ColumnBuilder::UInt8(UInt8Builder::new())),
            DataType::UInt16 => Ok(ColumnBuilder::UInt16(UInt16Builder::new())),
            DataType::UInt32 => Ok(ColumnBuilder::UInt32(UInt32Builder::new())),
            DataType::UInt64 => Ok(ColumnBuilder::UInt64(UInt64Builder::new())),
            DataType::Timestamp(TimeUnit::Microsecond, None) => {
                Ok(ColumnBuilder::TimestampUs(TimestampMicrosecondBuilder::new()))
            }
            DataType::Utf8 => Ok(ColumnBuilder::String(StringBuilder::new())),
            DataType::Binary => Ok(ColumnBuilder::Binary(BinaryBuilder::new())),
            DataType::FixedSizeBinary(width) if *width > 0 => {
                Ok(ColumnBuilder::FixedBinary(FixedSizeBinaryBuilder::new(*width)))
            }
            other => Err(BuilderError::UnsupportedType(other.clone())),
        }
    }

    /// Append a null value to this builder.
    pub fn append_null(&mut self) {
        match self {
            ColumnBuilder::Null(b) => b.append_null(),
            ColumnBuilder::Bool(b) => b.append_null(),
            ColumnBuilder::Int8(b) => b.append_null(),
            ColumnBuilder::Int16(b) => b.append_null(),
            ColumnBuilder::Int32(b) => b.append_null(),
            ColumnBuilder::Int64(b) => b.append_null(),
            ColumnBuilder::UInt8(b) => b.append_null(),
            ColumnBuilder::UInt16(b) => b.append_null(),
            ColumnBuilder::UInt32(b) => b.append_null(),
            ColumnBuilder::UInt64(b) => b.append_null(),
            ColumnBuilder::TimestampUs(b) => b.append_null(),
            ColumnBuilder::String(b) => b.append_null(),
            ColumnBuilder::Binary(b) => b.append_null(),
            ColumnBuilder::FixedBinary(b) => b.append_null(),
        }
    }

    /// Finish building and return the array. The builder is left empty.
    pub fn finish(&mut self) -> ArrayRef {
        match self {
            // NullBuilder::finish keeps its length, so start over by hand.
            ColumnBuilder::Null(b) => {
                let len = b.len();
                *b = NullBuilder::new();
                Arc::new(NullArray::new(len))
            }
            ColumnBuilder::Bool(b) => Arc::new(b.finish()),
            ColumnBuilder::Int8(b) => Arc::new(b.finish()),
            ColumnBuilder::Int16(b) => Arc::new(b.finish()),
            ColumnBuilder::Int32(b) => Arc::new(b.finish()),
            ColumnBuilder::Int64(b) => Arc::new(b.finish()),
            ColumnBuilder::UInt8(b) => Arc::new(b.finish()),
            ColumnBuilder::UInt16(b) => Arc::new(b.finish()),
            ColumnBuilder::UInt32(b) => Arc::new(b.finish()),
            ColumnBuilder::UInt64(b) => Arc::new(b.finish()),
            ColumnBuilder::TimestampUs(b) => Arc::new(b.finish()),
            ColumnBuilder::String(b) => Arc::new(b.finish()),
            ColumnBuilder::Binary(b) => Arc::new(b.finish()),
            ColumnBuilder::FixedBinary(b) => Arc::new(b.finish()),
        }
    }

    /// Get the number of values (nulls included) in the builder.
    pub fn len(&self) -> usize {
        match self {
            ColumnBuilder::Null(b) => b.len(),
            ColumnBuilder::Bool(b) => b.len(),
            ColumnBuilder::Int8(b) => b.len(),
            ColumnBuilder::Int16(b) => b.len(),
            ColumnBuilder::Int32(b) => b.len(),
            ColumnBuilder::Int64(b) => b.len(),
            ColumnBuilder::UInt8(b) => b.len(),
            ColumnBuilder::UInt16(b) => b.len(),
            ColumnBuilder::UInt32(b) => b.len(),
            ColumnBuilder::UInt64(b) => b.len(),
            ColumnBuilder::TimestampUs(b) => b.len(),
            ColumnBuilder::String(b) => b.len(),
            ColumnBuilder::Binary(b) => b.len(),
            ColumnBuilder::FixedBinary(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
