//! The per-schema set of column accumulators.

use arrow::array::{ArrayRef, RecordBatch};
use arrow::record_batch::RecordBatchOptions;
use arrow::datatypes::SchemaRef;

use super::builder::{BuilderError, ColumnBuilder};
use super::field::arrow_schema;
use crate::codec::{utf16le_bytes, utf16le_bytes_from_str};
use crate::error::{OutputError, Result, RowProtocolViolation};
use crate::schema::{Schema, SemanticType};
use crate::value::{IntKind, Value, Xml};

/// What happened to a value handed to [`ColumnSet::append`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Appended {
    Value,
    /// The value could not be transcoded; a null was stored instead.
    EncodingFailed,
}

/// One accumulator per schema column, in column order.
#[derive(Debug)]
pub struct ColumnSet {
    schema: Schema,
    arrow_schema: SchemaRef,
    builders: Vec<ColumnBuilder>,
}

impl ColumnSet {
    /// Map `schema` to Arrow and build an empty accumulator for every column.
    ///
    /// Nothing is returned unless every column maps.
    pub fn new(schema: &Schema) -> Result<Self> {
        let arrow_schema = arrow_schema(schema)?;
        let builders = fresh_builders(&arrow_schema)?;
        Ok(Self {
            schema: schema.clone(),
            arrow_schema,
            builders,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn arrow_schema(&self) -> &SchemaRef {
        &self.arrow_schema
    }

    pub fn len(&self) -> usize {
        self.builders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }

    /// Number of values buffered in column `index`.
    pub fn buffered(&self, index: usize) -> usize {
        self.builders.get(index).map(ColumnBuilder::len).unwrap_or(0)
    }

    pub fn append_null(&mut self, index: usize) {
        if let Some(builder) = self.builders.get_mut(index) {
            builder.append_null();
        }
    }

    /// Append `value` to column `index`.
    ///
    /// A value whose kind does not fit the column's semantic type is a
    /// [`RowProtocolViolation::TypeMismatch`]; nothing is appended in that case.
    pub fn append(&mut self, index: usize, value: &Value<'_>) -> Result<Appended> {
        let column = &self.schema.columns()[index];
        let builder = &mut self.builders[index];
        let semantic = &column.semantic_type;

        let stored = match (builder, value) {
            (ColumnBuilder::Bool(b), Value::Bool(v)) => {
                b.append_value(*v);
                true
            }
            (ColumnBuilder::TimestampUs(b), Value::Timestamp(ts)) => {
                b.append_value(ts.as_micros());
                true
            }

            (ColumnBuilder::String(b), Value::Utf8(s)) => {
                b.append_value(s);
                true
            }
            (ColumnBuilder::String(b), Value::Utf16(units)) => match String::from_utf16(units) {
                Ok(s) => {
                    b.append_value(s);
                    true
                }
                Err(_) => {
                    b.append_null();
                    return Ok(Appended::EncodingFailed);
                }
            },

            (ColumnBuilder::Binary(b), Value::Utf16(units)) if *semantic == SemanticType::Utf16Text => {
                b.append_value(utf16le_bytes(units));
                true
            }
            (ColumnBuilder::Binary(b), Value::Utf8(s)) if *semantic == SemanticType::Utf16Text => {
                b.append_value(utf16le_bytes_from_str(s));
                true
            }
            (ColumnBuilder::Binary(b), Value::Binary(bytes)) if *semantic == SemanticType::Binary => {
                b.append_value(bytes);
                true
            }
            (ColumnBuilder::Binary(b), Value::Xml(xml)) if *semantic == SemanticType::Xml => {
                match xml {
                    Xml::Utf8(s) => b.append_value(s.as_bytes()),
                    Xml::Utf16(units) => b.append_value(utf16le_bytes(units)),
                }
                true
            }

            (ColumnBuilder::FixedBinary(b), Value::Guid(guid))
                if matches!(semantic, SemanticType::Guid | SemanticType::FixedBinary(16)) =>
            {
                b.append_value(guid.to_bytes_le())?;
                true
            }
            (ColumnBuilder::FixedBinary(b), Value::Binary(bytes))
                if *semantic == SemanticType::FixedBinary(bytes.len() as u32) =>
            {
                b.append_value(bytes)?;
                true
            }

            (builder, Value::Enum(code) | Value::Flags(code)) => {
                append_integer(builder, i128::from(*code), IntKind::Unsigned(32))
            }
            (builder, other) => match other.as_integer() {
                Some((v, kind)) => append_integer(builder, v, kind),
                None => false,
            },
        };

        if stored {
            Ok(Appended::Value)
        } else {
            Err(self.mismatch(index, value).into())
        }
    }

    fn mismatch(&self, index: usize, value: &Value<'_>) -> RowProtocolViolation {
        let column = &self.schema.columns()[index];
        let got = match value {
            Value::Binary(bytes) => format!("binary({})", bytes.len()),
            other => other.type_name().to_string(),
        };
        RowProtocolViolation::TypeMismatch {
            column: index,
            name: column.name.clone(),
            expected: column.semantic_type.to_string(),
            got,
        }
    }

    /// Drain every accumulator into one record batch of `rows` rows.
    ///
    /// Accumulators are swapped for fresh ones before the old ones are
    /// finished, so the set can take new rows whatever happens to the batch.
    pub fn finish(&mut self, rows: usize) -> Result<RecordBatch> {
        let fresh = fresh_builders(&self.arrow_schema)?;
        let mut drained = std::mem::replace(&mut self.builders, fresh);
        let arrays: Vec<ArrayRef> = drained.iter_mut().map(ColumnBuilder::finish).collect();

        // Arrays built from builders carry no field metadata; the schema does.
        let options = RecordBatchOptions::new()
            .with_row_count(Some(rows))
            .with_match_field_names(false);
        Ok(RecordBatch::try_new_with_options(
            self.arrow_schema.clone(),
            arrays,
            &options,
        )?)
    }
}

fn fresh_builders(schema: &SchemaRef) -> Result<Vec<ColumnBuilder>> {
    schema
        .fields()
        .iter()
        .map(|field| {
            ColumnBuilder::new(field.data_type()).map_err(|BuilderError::UnsupportedType(data_type)| {
                OutputError::UnsupportedType {
                    column: field.name().clone(),
                    semantic: data_type.to_string(),
                }
            })
        })
        .collect()
}

/// Append an integer if its source type widens losslessly into the column.
fn append_integer(builder: &mut ColumnBuilder, value: i128, kind: IntKind) -> bool {
    macro_rules! widen {
        ($b:expr, $target:expr, $ty:ty) => {{
            if !kind.fits_in($target) {
                return false;
            }
            match <$ty>::try_from(value) {
                Ok(v) => {
                    $b.append_value(v);
                    true
                }
                Err(_) => false,
            }
        }};
    }

    match builder {
        ColumnBuilder::Int8(b) => widen!(b, IntKind::Signed(8), i8),
        ColumnBuilder::Int16(b) => widen!(b, IntKind::Signed(16), i16),
        ColumnBuilder::Int32(b) => widen!(b, IntKind::Signed(32), i32),
        ColumnBuilder::Int64(b) => widen!(b, IntKind::Signed(64), i64),
        ColumnBuilder::UInt8(b) => widen!(b, IntKind::Unsigned(8), u8),
        ColumnBuilder::UInt16(b) => widen!(b, IntKind::Unsigned(16), u16),
        ColumnBuilder::UInt32(b) => widen!(b, IntKind::Unsigned(32), u32),
        ColumnBuilder::UInt64(b) => widen!(b, IntKind::Unsigned(64), u64),
        _ => false,
    }
}
