//! Values handed to the tabular writer, one per column.

use crate::codec::{Guid, Timestamp};

/// XML payloads are stored as raw bytes in whichever encoding they arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Xml<'a> {
    Utf8(&'a str),
    Utf16(&'a [u16]),
}

/// A single column value, after codec conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    Bool(bool),
    UInt8(u8),
    Int8(i8),
    UInt16(u16),
    Int16(i16),
    UInt32(u32),
    Int32(i32),
    UInt64(u64),
    Int64(i64),
    Timestamp(Timestamp),
    Utf8(&'a str),
    Utf16(&'a [u16]),
    Binary(&'a [u8]),
    Guid(Guid),
    Enum(u32),
    Flags(u32),
    Xml(Xml<'a>),
}

impl Value<'_> {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::UInt8(_) => "u8",
            Value::Int8(_) => "i8",
            Value::UInt16(_) => "u16",
            Value::Int16(_) => "i16",
            Value::UInt32(_) => "u32",
            Value::Int32(_) => "i32",
            Value::UInt64(_) => "u64",
            Value::Int64(_) => "i64",
            Value::Timestamp(_) => "timestamp",
            Value::Utf8(_) => "utf8",
            Value::Utf16(_) => "utf16",
            Value::Binary(_) => "binary",
            Value::Guid(_) => "guid",
            Value::Enum(_) => "enum",
            Value::Flags(_) => "flags",
            Value::Xml(_) => "xml",
        }
    }

    /// The value as a signed 128-bit integer, for integer-like variants.
    pub(crate) fn as_integer(&self) -> Option<(i128, IntKind)> {
        match *self {
            Value::UInt8(v) => Some((v.into(), IntKind::Unsigned(8))),
            Value::Int8(v) => Some((v.into(), IntKind::Signed(8))),
            Value::UInt16(v) => Some((v.into(), IntKind::Unsigned(16))),
            Value::Int16(v) => Some((v.into(), IntKind::Signed(16))),
            Value::UInt32(v) => Some((v.into(), IntKind::Unsigned(32))),
            Value::Int32(v) => Some((v.into(), IntKind::Signed(32))),
            Value::UInt64(v) => Some((v.into(), IntKind::Unsigned(64))),
            Value::Int64(v) => Some((v.into(), IntKind::Signed(64))),
            _ => None,
        }
    }
}

/// Width and signedness of an integer type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IntKind {
    Signed(u8),
    Unsigned(u8),
}

impl IntKind {
    /// Whether every value of `self` is representable in `target`.
    pub(crate) fn fits_in(self, target: IntKind) -> bool {
        match (self, target) {
            (IntKind::Unsigned(from), IntKind::Unsigned(to)) => from <= to,
            (IntKind::Signed(from), IntKind::Signed(to)) => from <= to,
            (IntKind::Unsigned(from), IntKind::Signed(to)) => from < to,
            (IntKind::Signed(_), IntKind::Unsigned(_)) => false,
        }
    }
}

macro_rules! impl_from_primitive {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value<'_> {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from_primitive!(
    bool => Bool,
    u8 => UInt8,
    i8 => Int8,
    u16 => UInt16,
    i16 => Int16,
    u32 => UInt32,
    i32 => Int32,
    u64 => UInt64,
    i64 => Int64,
    Timestamp => Timestamp,
    Guid => Guid,
);

impl<'a> From<&'a str> for Value<'a> {
    fn from(v: &'a str) -> Self {
        Value::Utf8(v)
    }
}

impl<'a> From<&'a [u8]> for Value<'a> {
    fn from(v: &'a [u8]) -> Self {
        Value::Binary(v)
    }
}

impl<'a> From<&'a [u16]> for Value<'a> {
    fn from(v: &'a [u16]) -> Self {
        Value::Utf16(v)
    }
}
