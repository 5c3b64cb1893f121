//! Conversions from semantic values to the representations the backends store.
//!
//! Everything in here is pure: no writer state, no I/O. The tabular writer
//! and the document writer both route values through these functions so a
//! timestamp or a flag set renders the same way regardless of the backend.

pub mod attributes;
pub mod flags;
pub mod format;
mod guid;
mod time;

use std::net::{Ipv4Addr, Ipv6Addr};

pub use flags::FlagDefinition;
pub use format::{FormatBuffer, MAX_FORMATTED_LEN};
pub use guid::Guid;
pub use time::Timestamp;

/// Rendered in place of an enum code that has no entry in its name table.
pub const INVALID_ENUM: &str = "IllegalEnumValue";

/// Look up the display name of an enum code.
///
/// The table is scanned in order with the first entry as code 0. Codes past
/// the end of the table yield [`INVALID_ENUM`].
pub fn enum_name<S: AsRef<str>>(code: u32, names: &[S]) -> &str {
    usize::try_from(code)
        .ok()
        .and_then(|index| names.get(index))
        .map(|name| AsRef::<str>::as_ref(name))
        .unwrap_or(INVALID_ENUM)
}

/// `0x` followed by 8 uppercase hex digits.
pub fn hex_u32(value: u32) -> String {
    format!("0x{:08X}", value)
}

/// `0x` followed by 16 uppercase hex digits.
pub fn hex_u64(value: u64) -> String {
    format!("0x{:016X}", value)
}

/// Uppercase hex rendering of a byte string, optionally `0x` prefixed.
///
/// An empty slice renders as an empty string, prefix or not.
pub fn hex_bytes(bytes: &[u8], prefix: bool) -> String {
    if bytes.is_empty() {
        return String::new();
    }
    if prefix {
        format!("0x{}", hex::encode_upper(bytes))
    } else {
        hex::encode_upper(bytes)
    }
}

pub fn ipv4_text(addr: Ipv4Addr) -> String {
    addr.to_string()
}

pub fn ipv6_bytes(addr: Ipv6Addr) -> [u8; 16] {
    addr.octets()
}

/// Encode text as UTF-16LE bytes, the layout of `Utf16Text` columns.
pub fn utf16le_bytes_from_str(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

pub fn utf16le_bytes(units: &[u16]) -> Vec<u8> {
    units.iter().flat_map(|u| u.to_le_bytes()).collect()
}
