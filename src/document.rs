//! Nested document output: objects and arrays of typed values.

use std::borrow::Cow;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use crate::codec::{
    attributes, enum_name, flags, format, hex_bytes, hex_u32, hex_u64, ipv4_text, ipv6_bytes,
    FlagDefinition, Guid, Timestamp,
};
use crate::error::Result;

/// The two kinds of nested container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    Object,
    Array,
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Container::Object => f.write_str("object"),
            Container::Array => f.write_str("array"),
        }
    }
}

/// A leaf value for a document. Rendering goes through the value codec.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DocValue<'a> {
    Str(&'a str),
    /// UTF-16 code units; invalid sequences are replaced on output.
    Wide(&'a [u16]),
    Bool(bool),
    U32 { value: u32, hex: bool },
    I32 { value: i32, hex: bool },
    U64 { value: u64, hex: bool },
    I64 { value: i64, hex: bool },
    Timestamp(Timestamp),
    /// 100ns ticks since 1601-01-01 UTC.
    FileTime(u64),
    Bytes { bytes: &'a [u8], prefix: bool },
    Guid(Guid),
    Attributes(u32),
    Enum { code: u32, names: &'a [&'a str] },
    Flags {
        value: u32,
        definitions: &'a [FlagDefinition],
        separator: Option<char>,
    },
    Ipv4(Ipv4Addr),
    Ipv6(Ipv6Addr),
}

/// A rendered leaf, ready for a backend's typed emitters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    Str(Cow<'a, str>),
    Bool(bool),
    U64(u64),
    I64(i64),
}

impl<'a> DocValue<'a> {
    pub fn token(&self) -> Token<'a> {
        match *self {
            DocValue::Str(s) => Token::Str(Cow::Borrowed(s)),
            DocValue::Wide(units) => Token::Str(Cow::Owned(String::from_utf16_lossy(units))),
            DocValue::Bool(b) => Token::Bool(b),
            DocValue::U32 { value, hex: true } => text(hex_u32(value)),
            DocValue::U32 { value, hex: false } => Token::U64(value.into()),
            DocValue::I32 { value, hex: true } => text(hex_u32(value as u32)),
            DocValue::I32 { value, hex: false } => Token::I64(value.into()),
            DocValue::U64 { value, hex: true } => text(hex_u64(value)),
            DocValue::U64 { value, hex: false } => Token::U64(value),
            DocValue::I64 { value, hex: true } => text(hex_u64(value as u64)),
            DocValue::I64 { value, hex: false } => Token::I64(value),
            DocValue::Timestamp(ts) => text(ts.to_string()),
            DocValue::FileTime(ticks) => text(Timestamp::from_file_time(ticks).to_string()),
            DocValue::Bytes { bytes, prefix } => text(hex_bytes(bytes, prefix)),
            DocValue::Guid(guid) => text(guid.to_string()),
            DocValue::Attributes(value) => text(attributes::encode(value)),
            DocValue::Enum { code, names } => Token::Str(Cow::Borrowed(enum_name(code, names))),
            DocValue::Flags {
                value,
                definitions,
                separator: None,
            } => text(flags::describe(value, definitions)),
            DocValue::Flags {
                value,
                definitions,
                separator: Some(sep),
            } => text(flags::describe_with_separator(value, definitions, sep)),
            DocValue::Ipv4(addr) => text(ipv4_text(addr)),
            DocValue::Ipv6(addr) => text(hex_bytes(&ipv6_bytes(addr), false)),
        }
    }
}

fn text<'a>(s: String) -> Token<'a> {
    Token::Str(Cow::Owned(s))
}

impl<'a> From<&'a str> for DocValue<'a> {
    fn from(s: &'a str) -> Self {
        DocValue::Str(s)
    }
}

impl<'a> From<&'a [u16]> for DocValue<'a> {
    fn from(units: &'a [u16]) -> Self {
        DocValue::Wide(units)
    }
}

impl From<bool> for DocValue<'_> {
    fn from(b: bool) -> Self {
        DocValue::Bool(b)
    }
}

impl From<u32> for DocValue<'_> {
    fn from(value: u32) -> Self {
        DocValue::U32 { value, hex: false }
    }
}

impl From<i32> for DocValue<'_> {
    fn from(value: i32) -> Self {
        DocValue::I32 { value, hex: false }
    }
}

impl From<u64> for DocValue<'_> {
    fn from(value: u64) -> Self {
        DocValue::U64 { value, hex: false }
    }
}

impl From<i64> for DocValue<'_> {
    fn from(value: i64) -> Self {
        DocValue::I64 { value, hex: false }
    }
}

impl From<Timestamp> for DocValue<'_> {
    fn from(ts: Timestamp) -> Self {
        DocValue::Timestamp(ts)
    }
}

impl From<Guid> for DocValue<'_> {
    fn from(guid: Guid) -> Self {
        DocValue::Guid(guid)
    }
}

impl From<Ipv4Addr> for DocValue<'_> {
    fn from(addr: Ipv4Addr) -> Self {
        DocValue::Ipv4(addr)
    }
}

impl From<Ipv6Addr> for DocValue<'_> {
    fn from(addr: Ipv6Addr) -> Self {
        DocValue::Ipv6(addr)
    }
}

/// A writer for nested documents.
///
/// The document starts with an implicit root object. Inside an object every
/// value needs a key: either pass a name (`write_named`, `begin_element`)
/// or set one with `write_key` first. Inside an array names are ignored.
pub trait StructuredOutput {
    fn begin_element(&mut self, name: Option<&str>) -> Result<()>;
    fn end_element(&mut self) -> Result<()>;

    fn begin_collection(&mut self, name: Option<&str>) -> Result<()>;
    fn end_collection(&mut self) -> Result<()>;

    /// Set the key for the next value in the current object.
    fn write_key(&mut self, name: &str) -> Result<()>;

    fn write(&mut self, value: DocValue<'_>) -> Result<()>;

    fn write_named(&mut self, name: &str, value: DocValue<'_>) -> Result<()>;

    /// Comments have no representation; accepted and dropped.
    fn write_comment(&mut self, _comment: &str) -> Result<()> {
        Ok(())
    }

    fn write_formatted(&mut self, args: fmt::Arguments<'_>) -> Result<()> {
        let text = format::bounded(args)?;
        self.write(DocValue::Str(&text))
    }

    fn write_named_formatted(&mut self, name: &str, args: fmt::Arguments<'_>) -> Result<()> {
        let text = format::bounded(args)?;
        self.write_named(name, DocValue::Str(&text))
    }

    /// End the root object and flush. Only the root may be open.
    fn close(&mut self) -> Result<()>;
}
