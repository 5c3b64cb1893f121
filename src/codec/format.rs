//! Bounded rendering of formatted values.

use std::fmt::{self, Write};

use crate::error::{OutputError, Result};

/// Upper bound on the rendered size of a formatted value, in bytes.
pub const MAX_FORMATTED_LEN: usize = 1024;

/// Scratch buffer for `format_args!` output with a hard size limit.
///
/// Writing past the limit fails instead of truncating, so a value is either
/// rendered whole or not at all.
#[derive(Debug)]
pub struct FormatBuffer {
    buf: String,
    limit: usize,
    overflowed: bool,
}

impl FormatBuffer {
    pub fn new() -> Self {
        Self::with_limit(MAX_FORMATTED_LEN)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            buf: String::new(),
            limit,
            overflowed: false,
        }
    }

    /// Render `args`, replacing any previous content.
    pub fn render(&mut self, args: fmt::Arguments<'_>) -> Result<&str> {
        self.buf.clear();
        self.overflowed = false;
        if self.write_fmt(args).is_err() || self.overflowed {
            self.buf.clear();
            return Err(OutputError::FormatOverflow { limit: self.limit });
        }
        Ok(&self.buf)
    }
}

impl Default for FormatBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for FormatBuffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if self.buf.len() + s.len() > self.limit {
            self.overflowed = true;
            return Err(fmt::Error);
        }
        self.buf.push_str(s);
        Ok(())
    }
}

/// Render `args` into a fresh bounded buffer.
pub fn bounded(args: fmt::Arguments<'_>) -> Result<String> {
    let mut buffer = FormatBuffer::new();
    buffer.render(args).map(str::to_owned)
}
