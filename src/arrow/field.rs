//! Mapping from semantic column types to Arrow fields.

use std::collections::HashMap;
use std::sync::Arc;

use arrow::datatypes::{DataType, Field, Schema as ArrowSchema, SchemaRef, TimeUnit};

use crate::error::{OutputError, Result};
use crate::schema::{ColumnDescriptor, Schema, SemanticType};

/// Field metadata key recording the semantic type a column was declared with.
pub const SEMANTIC_TYPE_KEY: &str = "tabout.semantic_type";

/// Metadata key for one enum or flag code: `0x` plus 6 lowercase hex digits.
pub fn code_key(code: u32) -> String {
    format!("{:#08x}", code)
}

/// The Arrow data type used to store a semantic type.
pub fn data_type_for(semantic: &SemanticType) -> std::result::Result<DataType, String> {
    let data_type = match semantic {
        SemanticType::Nothing => DataType::Null,
        SemanticType::Bool => DataType::Boolean,
        SemanticType::UInt8 => DataType::UInt8,
        SemanticType::Int8 => DataType::Int8,
        SemanticType::UInt16 => DataType::UInt16,
        SemanticType::Int16 => DataType::Int16,
        SemanticType::UInt32 => DataType::UInt32,
        SemanticType::Int32 => DataType::Int32,
        SemanticType::UInt64 => DataType::UInt64,
        SemanticType::Int64 => DataType::Int64,
        SemanticType::Timestamp => DataType::Timestamp(TimeUnit::Microsecond, None),
        // UTF-16 text keeps its original code units, little-endian.
        SemanticType::Utf16Text => DataType::Binary,
        SemanticType::Utf8Text => DataType::Utf8,
        SemanticType::Binary | SemanticType::Xml => DataType::Binary,
        SemanticType::FixedBinary(len) => {
            let width = i32::try_from(*len)
                .map_err(|_| format!("fixed width {} exceeds {}", len, i32::MAX))?;
            DataType::FixedSizeBinary(width)
        }
        SemanticType::Guid => DataType::FixedSizeBinary(16),
        SemanticType::Enum(_) | SemanticType::Flags(_) => DataType::UInt32,
    };
    Ok(data_type)
}

/// Build the nullable Arrow field for one column, carrying enum and flag
/// names as metadata.
pub fn field_for(column: &ColumnDescriptor) -> Result<Field> {
    let data_type = data_type_for(&column.semantic_type).map_err(|reason| {
        OutputError::UnsupportedType {
            column: column.name.clone(),
            semantic: format!("{} ({})", column.semantic_type, reason),
        }
    })?;

    let mut metadata = HashMap::new();
    metadata.insert(
        SEMANTIC_TYPE_KEY.to_string(),
        column.semantic_type.name().to_string(),
    );
    match &column.semantic_type {
        SemanticType::Enum(Some(values)) => {
            for value in values {
                metadata.insert(code_key(value.index), value.name.clone());
            }
        }
        SemanticType::Flags(Some(flags)) => {
            for flag in flags {
                metadata.insert(code_key(flag.flag), flag.name.clone());
            }
        }
        _ => {}
    }

    Ok(Field::new(&column.name, data_type, column.nullable()).with_metadata(metadata))
}

/// Map a whole schema. Either every column maps or nothing is returned.
pub fn arrow_schema(schema: &Schema) -> Result<SchemaRef> {
    let fields = schema
        .columns()
        .iter()
        .map(field_for)
        .collect::<Result<Vec<_>>>()?;
    Ok(Arc::new(ArrowSchema::new(fields)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::FlagDefinition;
    use crate::schema::EnumValue;

    #[test]
    fn test_code_key() {
        assert_eq!(code_key(0), "0x000000");
        assert_eq!(code_key(0x1f), "0x00001f");
        assert_eq!(code_key(0x8000_0000), "0x80000000");
    }

    #[test]
    fn test_primitive_mapping() {
        let cases = [
            (SemanticType::Nothing, DataType::Null),
            (SemanticType::Bool, DataType::Boolean),
            (SemanticType::Int16, DataType::Int16),
            (SemanticType::UInt64, DataType::UInt64),
            (
                SemanticType::Timestamp,
                DataType::Timestamp(TimeUnit::Microsecond, None),
            ),
            (SemanticType::Utf16Text, DataType::Binary),
            (SemanticType::Utf8Text, DataType::Utf8),
            (SemanticType::Xml, DataType::Binary),
            (SemanticType::FixedBinary(20), DataType::FixedSizeBinary(20)),
            (SemanticType::Guid, DataType::FixedSizeBinary(16)),
            (SemanticType::Flags(None), DataType::UInt32),
        ];
        for (semantic, expected) in cases {
            assert_eq!(data_type_for(&semantic).unwrap(), expected, "{semantic}");
        }
    }

    #[test]
    fn test_enum_metadata() {
        let column = ColumnDescriptor::new(
            "kind",
            SemanticType::Enum(Some(EnumValue::table(["File", "Directory"]))),
        );
        let field = field_for(&column).unwrap();
        assert!(field.is_nullable());
        assert_eq!(field.data_type(), &DataType::UInt32);
        assert_eq!(field.metadata().get("0x000000").map(String::as_str), Some("File"));
        assert_eq!(field.metadata().get("0x000001").map(String::as_str), Some("Directory"));
        assert_eq!(
            field.metadata().get(SEMANTIC_TYPE_KEY).map(String::as_str),
            Some("enum")
        );
    }

    #[test]
    fn test_flags_metadata() {
        let column = ColumnDescriptor::new(
            "mode",
            SemanticType::Flags(Some(vec![
                FlagDefinition::new(0x1, "READ"),
                FlagDefinition::new(0x2, "WRITE"),
            ])),
        );
        let field = field_for(&column).unwrap();
        assert_eq!(field.metadata().get("0x000002").map(String::as_str), Some("WRITE"));
    }

    #[test]
    fn test_unsupported_width_names_column() {
        let schema = Schema::new(vec![
            ColumnDescriptor::new("ok", SemanticType::Bool),
            ColumnDescriptor::new("huge", SemanticType::FixedBinary(u32::MAX)),
        ])
        .unwrap();
        match arrow_schema(&schema) {
            Err(OutputError::UnsupportedType { column, .. }) => assert_eq!(column, "huge"),
            other => panic!("expected UnsupportedType, got {:?}", other),
        }
    }
}
