mod builder;
pub mod columns;
pub mod field;

pub use builder::{BuilderError, ColumnBuilder};
pub use columns::{Appended, ColumnSet};
pub use field::{arrow_schema, data_type_for, field_for, SEMANTIC_TYPE_KEY};
