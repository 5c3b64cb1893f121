//! UTF-8 to UTF-16LE transcoding for byte streams.

use std::io::{self, Write};

/// Re-encodes a UTF-8 byte stream as UTF-16LE on its way to `inner`.
///
/// A multi-byte sequence split across two writes is held back until the
/// rest of it arrives. Invalid UTF-8 is an `InvalidData` error.
#[derive(Debug)]
pub struct Utf16Writer<W: Write> {
    inner: W,
    pending: Vec<u8>,
}

impl<W: Write> Utf16Writer<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            pending: Vec::new(),
        }
    }

    /// Return the inner writer. Fails if a sequence is still incomplete.
    pub fn into_inner(self) -> io::Result<W> {
        if !self.pending.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "stream ended inside a UTF-8 sequence",
            ));
        }
        Ok(self.inner)
    }
}

impl<W: Write> Write for Utf16Writer<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);
        let complete = match std::str::from_utf8(&self.pending) {
            Ok(text) => text.len(),
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(e) => {
                self.pending.truncate(self.pending.len() - buf.len());
                return Err(io::Error::new(io::ErrorKind::InvalidData, e));
            }
        };

        let text = std::str::from_utf8(&self.pending[..complete])
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let encoded: Vec<u8> = text.encode_utf16().flat_map(u16::to_le_bytes).collect();
        if let Err(e) = self.inner.write_all(&encoded) {
            // Nothing of `buf` counts as written, so a retry must not repeat it.
            self.pending.truncate(self.pending.len() - buf.len());
            return Err(e);
        }
        self.pending.drain(..complete);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8]) -> String {
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16(&units).unwrap()
    }

    #[test]
    fn test_ascii() {
        let mut writer = Utf16Writer::new(Vec::new());
        writer.write_all(b"{}").unwrap();
        assert_eq!(writer.into_inner().unwrap(), vec![b'{', 0, b'}', 0]);
    }

    #[test]
    fn test_split_sequences() {
        let text = "é€😀";
        let bytes = text.as_bytes();
        let mut writer = Utf16Writer::new(Vec::new());
        for byte in bytes {
            writer.write_all(std::slice::from_ref(byte)).unwrap();
        }
        let out = writer.into_inner().unwrap();
        assert_eq!(decode(&out), text);
        // One surrogate pair for the emoji.
        assert_eq!(out.len(), 2 * 4);
    }

    #[test]
    fn test_incomplete_at_end() {
        let mut writer = Utf16Writer::new(Vec::new());
        writer.write_all(&[0xE2, 0x82]).unwrap();
        assert!(writer.into_inner().is_err());
    }

    #[test]
    fn test_invalid_utf8() {
        let mut writer = Utf16Writer::new(Vec::new());
        assert!(writer.write(&[b'a', 0xFF]).is_err());
        writer.write_all(b"b").unwrap();
        assert_eq!(decode(&writer.into_inner().unwrap()), "b");
    }

    /// Fails its first write, then accepts everything.
    struct FailOnce {
        failed: bool,
        out: Vec<u8>,
    }

    impl Write for FailOnce {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if !self.failed {
                self.failed = true;
                return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
            }
            self.out.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_retry_after_inner_failure() {
        let inner = FailOnce { failed: false, out: Vec::new() };
        let mut writer = Utf16Writer::new(inner);
        assert!(writer.write(b"ab").is_err());
        assert_eq!(writer.write(b"ab").unwrap(), 2);
        let inner = writer.into_inner().unwrap();
        assert_eq!(decode(&inner.out), "ab");
    }
}
