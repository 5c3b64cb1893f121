//! JSON backend for nested document output.

mod utf16;
mod writer;

use std::io::Write;

use serde_json::ser::{CompactFormatter, PrettyFormatter};

pub use utf16::Utf16Writer;
pub use writer::JsonWriter;

use crate::config::{OutputOptions, TextEncoding};
use crate::document::StructuredOutput;
use crate::error::Result;

/// Open a JSON document on `sink`, laid out and encoded per `options`.
pub fn open<W: Write + 'static>(sink: W, options: &OutputOptions) -> Result<Box<dyn StructuredOutput>> {
    let output: Box<dyn StructuredOutput> = match (options.encoding, options.pretty_print) {
        (TextEncoding::Utf8, false) => Box::new(JsonWriter::new(sink, CompactFormatter)?),
        (TextEncoding::Utf8, true) => Box::new(JsonWriter::new(sink, PrettyFormatter::new())?),
        (TextEncoding::Utf16, false) => {
            Box::new(JsonWriter::new(Utf16Writer::new(sink), CompactFormatter)?)
        }
        (TextEncoding::Utf16, true) => Box::new(JsonWriter::new(
            Utf16Writer::new(sink),
            PrettyFormatter::new(),
        )?),
    };
    Ok(output)
}
