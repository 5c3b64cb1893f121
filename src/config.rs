//! Writer options, loadable from JSON.

use std::fs;
use std::path::Path;

use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use serde::{Deserialize, Serialize};

use crate::error::{OutputError, Result};

/// Character encoding of nested document output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextEncoding {
    #[default]
    Utf8,
    Utf16,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionCodec {
    Uncompressed,
    Snappy,
    #[default]
    Gzip,
    Zstd,
}

impl From<CompressionCodec> for Compression {
    fn from(codec: CompressionCodec) -> Self {
        match codec {
            CompressionCodec::Uncompressed => Compression::UNCOMPRESSED,
            CompressionCodec::Snappy => Compression::SNAPPY,
            CompressionCodec::Gzip => Compression::GZIP(Default::default()),
            CompressionCodec::Zstd => Compression::ZSTD(Default::default()),
        }
    }
}

/// Parquet file layout settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParquetOptions {
    pub data_page_size: usize,
    pub max_row_group_size: usize,
    pub compression: CompressionCodec,
}

impl Default for ParquetOptions {
    fn default() -> Self {
        Self {
            data_page_size: 4 * 1024 * 1024,
            max_row_group_size: 10_000,
            compression: CompressionCodec::default(),
        }
    }
}

impl ParquetOptions {
    pub fn writer_properties(&self) -> WriterProperties {
        WriterProperties::builder()
            .set_data_page_size_limit(self.data_page_size)
            .set_max_row_group_size(self.max_row_group_size)
            .set_compression(self.compression.into())
            .build()
    }
}

/// Options shared by the tabular and nested writers.
///
/// `pretty_print` and `encoding` only affect nested output; `batch_size` and
/// `parquet` only affect tabular output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputOptions {
    pub pretty_print: bool,
    pub encoding: TextEncoding,
    /// Flush automatically once this many rows are buffered.
    pub batch_size: Option<usize>,
    pub parquet: ParquetOptions,
}

impl OutputOptions {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let options: OutputOptions = serde_json::from_str(text)
            .map_err(|e| OutputError::InvalidArgument(format!("bad options: {}", e)))?;
        options.validate()?;
        Ok(options)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            OutputError::InvalidArgument(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == Some(0) {
            return Err(OutputError::InvalidArgument(
                "batch_size must be positive".into(),
            ));
        }
        if self.parquet.max_row_group_size == 0 {
            return Err(OutputError::InvalidArgument(
                "max_row_group_size must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let options = OutputOptions::default();
        assert!(!options.pretty_print);
        assert_eq!(options.encoding, TextEncoding::Utf8);
        assert_eq!(options.batch_size, None);
        assert_eq!(options.parquet.data_page_size, 4 * 1024 * 1024);
        assert_eq!(options.parquet.max_row_group_size, 10_000);
        assert_eq!(options.parquet.compression, CompressionCodec::Gzip);

        let props = options.parquet.writer_properties();
        assert_eq!(props.max_row_group_size(), 10_000);
        assert_eq!(props.data_page_size_limit(), 4 * 1024 * 1024);
    }

    #[test]
    fn test_partial_json() {
        let options = OutputOptions::from_json_str(
            r#"{"encoding":"utf16","batch_size":500,"parquet":{"compression":"zstd"}}"#,
        )
        .unwrap();
        assert_eq!(options.encoding, TextEncoding::Utf16);
        assert_eq!(options.batch_size, Some(500));
        assert_eq!(options.parquet.compression, CompressionCodec::Zstd);
        assert_eq!(options.parquet.max_row_group_size, 10_000);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(matches!(
            OutputOptions::from_json_str(r#"{"batch_size":0}"#),
            Err(OutputError::InvalidArgument(_))
        ));
        assert!(matches!(
            OutputOptions::from_json_str(r#"{"encoding":"latin1"}"#),
            Err(OutputError::InvalidArgument(_))
        ));
        assert!(OutputOptions::from_json_file("/nonexistent/tabout.json").is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"pretty_print":true}}"#).unwrap();
        let options = OutputOptions::from_json_file(file.path()).unwrap();
        assert!(options.pretty_print);
    }
}
