//! BFPK archive header

use binrw::{BinRead, BinWrite};

/// Archive signature
pub const SIGNATURE: [u8; 4] = *b"BFPK";

/// Size of the header on disk
pub const HEADER_SIZE: u64 = 12;

/// BFPK archive header
///
/// - Magic "BFPK" (4 bytes)
/// - Version (4 bytes, little-endian, signed)
/// - File count (4 bytes, little-endian, signed)
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct BfpkHeader {
    /// Magic signature, always "BFPK"
    pub magic: [u8; 4],

    /// Archive version
    pub version: i32,

    /// Number of file entries following the header
    pub file_count: i32,
}

impl BfpkHeader {
    /// Create a header for `file_count` entries
    pub fn new(version: i32, file_count: i32) -> Self {
        Self {
            magic: SIGNATURE,
            version,
            file_count,
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use binrw::io::Cursor;

    #[test]
    fn test_header_layout() {
        let mut buffer = Vec::new();
        BfpkHeader::new(1, 3)
            .write(&mut Cursor::new(&mut buffer))
            .expect("Operation should succeed");
        assert_eq!(buffer, b"BFPK\x01\0\0\0\x03\0\0\0");
        assert_eq!(buffer.len() as u64, HEADER_SIZE);
    }
}
