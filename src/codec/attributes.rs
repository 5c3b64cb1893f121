//! Fixed-width rendering of file attribute bitmasks.
//!
//! The output is always 13 characters. Each position belongs to one
//! attribute and holds its letter when the bit is set, `.` otherwise. The
//! position order is part of the format and does not follow bit order.

pub const READONLY: u32 = 0x0000_0001;
pub const HIDDEN: u32 = 0x0000_0002;
pub const SYSTEM: u32 = 0x0000_0004;
pub const DIRECTORY: u32 = 0x0000_0010;
pub const ARCHIVE: u32 = 0x0000_0020;
pub const NORMAL: u32 = 0x0000_0080;
pub const TEMPORARY: u32 = 0x0000_0100;
pub const SPARSE_FILE: u32 = 0x0000_0200;
pub const REPARSE_POINT: u32 = 0x0000_0400;
pub const COMPRESSED: u32 = 0x0000_0800;
pub const OFFLINE: u32 = 0x0000_1000;
pub const ENCRYPTED: u32 = 0x0000_4000;
pub const VIRTUAL: u32 = 0x0001_0000;

/// Position order of the rendered string.
const LAYOUT: [(u32, char); 13] = [
    (ARCHIVE, 'A'),
    (COMPRESSED, 'C'),
    (DIRECTORY, 'D'),
    (ENCRYPTED, 'E'),
    (HIDDEN, 'H'),
    (NORMAL, 'N'),
    (OFFLINE, 'O'),
    (READONLY, 'R'),
    (REPARSE_POINT, 'L'),
    (SPARSE_FILE, 'P'),
    (SYSTEM, 'S'),
    (TEMPORARY, 'T'),
    (VIRTUAL, 'V'),
];

pub const WIDTH: usize = LAYOUT.len();

/// Every bit that has a position in the rendered string.
pub const KNOWN_BITS: u32 = ARCHIVE
    | COMPRESSED
    | DIRECTORY
    | ENCRYPTED
    | HIDDEN
    | NORMAL
    | OFFLINE
    | READONLY
    | REPARSE_POINT
    | SPARSE_FILE
    | SYSTEM
    | TEMPORARY
    | VIRTUAL;

/// Render `attributes` as the 13-character positional string. Bits outside
/// [`KNOWN_BITS`] are ignored.
pub fn encode(attributes: u32) -> String {
    LAYOUT
        .iter()
        .map(|&(bit, letter)| if attributes & bit != 0 { letter } else { '.' })
        .collect()
}

/// Parse a string produced by [`encode`] back into a bitmask.
pub fn decode(text: &str) -> Option<u32> {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() != WIDTH {
        return None;
    }
    let mut attributes = 0;
    for (&(bit, letter), &c) in LAYOUT.iter().zip(chars.iter()) {
        if c == letter {
            attributes |= bit;
        } else if c != '.' {
            return None;
        }
    }
    Some(attributes)
}
