//! Table schemas: an ordered, immutable list of typed column descriptors.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::codec::FlagDefinition;
use crate::error::{OutputError, Result};

/// Display name for one code of an enumerated column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValue {
    pub index: u32,
    pub name: String,
}

impl EnumValue {
    pub fn new(index: u32, name: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
        }
    }

    /// Build a table from names, indexed in order from 0.
    pub fn table<I, S>(names: I) -> Vec<EnumValue>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names
            .into_iter()
            .enumerate()
            .map(|(i, name)| EnumValue::new(i as u32, name))
            .collect()
    }
}

/// The logical kind of value a column holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "meta")]
pub enum SemanticType {
    Nothing,
    Bool,
    UInt8,
    Int8,
    UInt16,
    Int16,
    UInt32,
    Int32,
    UInt64,
    Int64,
    Timestamp,
    Utf16Text,
    Utf8Text,
    Binary,
    FixedBinary(u32),
    Guid,
    Enum(Option<Vec<EnumValue>>),
    Xml,
    Flags(Option<Vec<FlagDefinition>>),
}

impl SemanticType {
    /// Short name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            SemanticType::Nothing => "nothing",
            SemanticType::Bool => "bool",
            SemanticType::UInt8 => "u8",
            SemanticType::Int8 => "i8",
            SemanticType::UInt16 => "u16",
            SemanticType::Int16 => "i16",
            SemanticType::UInt32 => "u32",
            SemanticType::Int32 => "i32",
            SemanticType::UInt64 => "u64",
            SemanticType::Int64 => "i64",
            SemanticType::Timestamp => "timestamp",
            SemanticType::Utf16Text => "utf16",
            SemanticType::Utf8Text => "utf8",
            SemanticType::Binary => "binary",
            SemanticType::FixedBinary(_) => "fixed_binary",
            SemanticType::Guid => "guid",
            SemanticType::Enum(_) => "enum",
            SemanticType::Xml => "xml",
            SemanticType::Flags(_) => "flags",
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticType::FixedBinary(len) => write!(f, "fixed_binary({})", len),
            other => f.write_str(other.name()),
        }
    }
}

/// One column of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub semantic_type: SemanticType,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, semantic_type: SemanticType) -> Self {
        Self {
            name: name.into(),
            semantic_type,
        }
    }

    /// Columns are always nullable: any value may be written as nothing.
    pub fn nullable(&self) -> bool {
        true
    }
}

/// An ordered list of columns, cheap to clone and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: Arc<[ColumnDescriptor]>,
}

impl Schema {
    /// Build a schema, rejecting an empty column list, duplicate names and
    /// zero-width fixed binary columns.
    pub fn new(columns: Vec<ColumnDescriptor>) -> Result<Self> {
        if columns.is_empty() {
            return Err(OutputError::InvalidArgument(
                "schema must have at least one column".into(),
            ));
        }

        let mut seen = HashSet::new();
        for column in &columns {
            if column.name.is_empty() {
                return Err(OutputError::InvalidArgument("column name is empty".into()));
            }
            if !seen.insert(column.name.as_str()) {
                return Err(OutputError::InvalidArgument(format!(
                    "duplicate column name '{}'",
                    column.name
                )));
            }
            if let SemanticType::FixedBinary(0) = column.semantic_type {
                return Err(OutputError::InvalidArgument(format!(
                    "fixed binary column '{}' needs a positive length",
                    column.name
                )));
            }
        }

        Ok(Self {
            columns: columns.into(),
        })
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column(&self, index: usize) -> Option<&ColumnDescriptor> {
        self.columns.get(index)
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }
}

impl TryFrom<Vec<ColumnDescriptor>> for Schema {
    type Error = OutputError;

    fn try_from(columns: Vec<ColumnDescriptor>) -> Result<Self> {
        Schema::new(columns)
    }
}
