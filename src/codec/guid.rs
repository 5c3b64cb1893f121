use std::fmt;

/// A GUID in its mixed-endian field layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Guid {
    pub data1: u32,
    pub data2: u16,
    pub data3: u16,
    pub data4: [u8; 8],
}

impl Guid {
    pub const fn new(data1: u32, data2: u16, data3: u16, data4: [u8; 8]) -> Self {
        Self {
            data1,
            data2,
            data3,
            data4,
        }
    }

    /// The 16-byte in-memory layout: the first three fields little-endian,
    /// `data4` as-is. This is what table columns store.
    pub fn to_bytes_le(&self) -> [u8; 16] {
        let mut out = [0u8; 16];
        out[0..4].copy_from_slice(&self.data1.to_le_bytes());
        out[4..6].copy_from_slice(&self.data2.to_le_bytes());
        out[6..8].copy_from_slice(&self.data3.to_le_bytes());
        out[8..16].copy_from_slice(&self.data4);
        out
    }

    pub fn from_bytes_le(bytes: [u8; 16]) -> Self {
        let mut data4 = [0u8; 8];
        data4.copy_from_slice(&bytes[8..16]);
        Self {
            data1: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            data2: u16::from_le_bytes([bytes[4], bytes[5]]),
            data3: u16::from_le_bytes([bytes[6], bytes[7]]),
            data4,
        }
    }
}

impl fmt::Display for Guid {
    /// Braced, hyphenated, uppercase: `{00112233-4455-6677-8899-AABBCCDDEEFF}`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{:08X}-{:04X}-{:04X}-{:02X}{:02X}-",
            self.data1, self.data2, self.data3, self.data4[0], self.data4[1]
        )?;
        for byte in &self.data4[2..] {
            write!(f, "{:02X}", byte)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: Guid = Guid::new(
        0x0011_2233,
        0x4455,
        0x6677,
        [0x88, 0x99, 0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff],
    );

    #[test]
    fn test_display() {
        assert_eq!(SAMPLE.to_string(), "{00112233-4455-6677-8899-AABBCCDDEEFF}");
        assert_eq!(
            Guid::default().to_string(),
            "{00000000-0000-0000-0000-000000000000}"
        );
    }

    #[test]
    fn test_byte_layout() {
        let bytes = SAMPLE.to_bytes_le();
        assert_eq!(&bytes[0..4], &[0x33, 0x22, 0x11, 0x00]);
        assert_eq!(&bytes[4..6], &[0x55, 0x44]);
        assert_eq!(&bytes[6..8], &[0x77, 0x66]);
        assert_eq!(&bytes[8..], &SAMPLE.data4);
        assert_eq!(Guid::from_bytes_le(bytes), SAMPLE);
    }
}
