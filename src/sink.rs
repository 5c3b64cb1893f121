//! Producer-facing row protocol.
//!
//! A producer writes exactly one value (or nothing) per schema column, in
//! column order, then calls `end_of_row`. The typed methods convert through
//! the value codec and all funnel into [`TableOutput::write_value`].
//!
//! ```ignore
//! out.write_str("a.txt")?;       // path
//! out.write_u64(12)?;            // size
//! out.write_nothing()?;          // modified, unknown
//! out.end_of_row()?;
//! ```

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use chrono::NaiveDateTime;

use crate::codec::{attributes, format, ipv4_text, ipv6_bytes, Guid, Timestamp};
use crate::error::{OutputError, Result};
use crate::value::{Value, Xml};

pub trait TableOutput {
    /// Write one value into the current column and move to the next.
    fn write_value(&mut self, value: Value<'_>) -> Result<()>;

    /// Write a null into the current column and move to the next.
    fn write_nothing(&mut self) -> Result<()>;

    /// Give up on the current column. Stored as a null.
    fn abandon_column(&mut self) -> Result<()> {
        self.write_nothing()
    }

    /// Fill the rest of the row with nulls.
    fn abandon_row(&mut self) -> Result<()>;

    fn end_of_row(&mut self) -> Result<()>;

    fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_value(Value::Bool(value))
    }
    fn write_u8(&mut self, value: u8) -> Result<()> {
        self.write_value(Value::UInt8(value))
    }
    fn write_i8(&mut self, value: i8) -> Result<()> {
        self.write_value(Value::Int8(value))
    }
    fn write_u16(&mut self, value: u16) -> Result<()> {
        self.write_value(Value::UInt16(value))
    }
    fn write_i16(&mut self, value: i16) -> Result<()> {
        self.write_value(Value::Int16(value))
    }
    fn write_u32(&mut self, value: u32) -> Result<()> {
        self.write_value(Value::UInt32(value))
    }
    fn write_i32(&mut self, value: i32) -> Result<()> {
        self.write_value(Value::Int32(value))
    }
    fn write_u64(&mut self, value: u64) -> Result<()> {
        self.write_value(Value::UInt64(value))
    }
    fn write_i64(&mut self, value: i64) -> Result<()> {
        self.write_value(Value::Int64(value))
    }

    fn write_timestamp(&mut self, value: Timestamp) -> Result<()> {
        self.write_value(Value::Timestamp(value))
    }

    /// 100ns ticks since 1601-01-01 UTC.
    fn write_file_time(&mut self, ticks: u64) -> Result<()> {
        self.write_timestamp(Timestamp::from_file_time(ticks))
    }

    fn write_unix_time(&mut self, seconds: i64) -> Result<()> {
        self.write_timestamp(Timestamp::from_unix_seconds(seconds))
    }

    /// Broken-down UTC time.
    fn write_datetime(&mut self, value: NaiveDateTime) -> Result<()> {
        self.write_timestamp(Timestamp::from_datetime(value))
    }

    fn write_str(&mut self, value: &str) -> Result<()> {
        self.write_value(Value::Utf8(value))
    }

    /// UTF-16 code units, not necessarily well formed.
    fn write_wide(&mut self, value: &[u16]) -> Result<()> {
        self.write_value(Value::Utf16(value))
    }

    fn write_bytes(&mut self, value: &[u8]) -> Result<()> {
        self.write_value(Value::Binary(value))
    }

    fn write_guid(&mut self, value: Guid) -> Result<()> {
        self.write_value(Value::Guid(value))
    }

    fn write_enum(&mut self, code: u32) -> Result<()> {
        self.write_value(Value::Enum(code))
    }

    fn write_flags(&mut self, value: u32) -> Result<()> {
        self.write_value(Value::Flags(value))
    }

    fn write_xml(&mut self, value: Xml<'_>) -> Result<()> {
        self.write_value(Value::Xml(value))
    }

    /// File attributes as their fixed-width letter string.
    fn write_attributes(&mut self, value: u32) -> Result<()> {
        self.write_str(&attributes::encode(value))
    }

    fn write_ipv4(&mut self, addr: Ipv4Addr) -> Result<()> {
        self.write_str(&ipv4_text(addr))
    }

    fn write_ipv6(&mut self, addr: Ipv6Addr) -> Result<()> {
        self.write_bytes(&ipv6_bytes(addr))
    }

    /// Render `args` into a bounded buffer and write it as text.
    ///
    /// An empty rendering writes a null. On overflow the column is abandoned
    /// before the error is returned, so the row stays aligned.
    fn write_formatted(&mut self, args: fmt::Arguments<'_>) -> Result<()> {
        match format::bounded(args) {
            Ok(text) if text.is_empty() => self.write_nothing(),
            Ok(text) => self.write_str(&text),
            Err(e @ OutputError::FormatOverflow { .. }) => {
                self.abandon_column()?;
                Err(e)
            }
            Err(e) => Err(e),
        }
    }
}
