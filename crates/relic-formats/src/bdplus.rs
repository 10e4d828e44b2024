//! BD+ content code (SVM) header support

use binrw::BinRead;
use relic_io::{Cursor, Format, ParseResult, ReaderConfig, gate};
use std::io::{Read, Seek};
use tracing::trace;

/// File signature
pub const SIGNATURE: [u8; 8] = *b"BDSVM_CC";

/// SVM header (25 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead)]
pub struct SvmHeader {
    /// "BDSVM_CC"
    pub signature: [u8; 8],
    /// Unidentified bytes
    pub unknown1: [u8; 5],
    /// Build year, big-endian
    #[br(big)]
    pub year: u16,
    /// Build month
    pub month: u8,
    /// Build day
    pub day: u8,
    /// Unidentified bytes
    pub unknown2: [u8; 4],
    /// Length of the SVM code following the header
    #[br(little)]
    pub length: u32,
}

impl SvmHeader {
    /// Encoded size in bytes
    pub const SIZE: u64 = 25;

    /// Build date as `YYYY-MM-DD`
    pub fn date(&self) -> String {
        format!("{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }

    /// Offset and length of the SVM code, relative to the header start
    pub fn code_range(&self) -> (u64, u64) {
        (Self::SIZE, u64::from(self.length))
    }
}

impl Format for SvmHeader {
    const NAME: &'static str = "BD+";

    fn read<R: Read + Seek>(cursor: &mut Cursor<R>, _config: &ReaderConfig) -> ParseResult<Self> {
        gate::expect_signature(Self::NAME, &cursor.peek_array::<8>()?, &SIGNATURE)?;
        let header: Self = cursor.read_type(binrw::Endian::Little, ())?;
        gate::ensure_range("month", i64::from(header.month), 1..=12)?;
        gate::ensure_range("day", i64::from(header.day), 1..=31)?;
        trace!(date = %header.date(), length = header.length, "BD+ header read");
        Ok(header)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use relic_io::ParseError;

    fn sample(month: u8, day: u8) -> Vec<u8> {
        let mut data = SIGNATURE.to_vec();
        data.extend_from_slice(&[0; 5]);
        data.extend_from_slice(&2008u16.to_be_bytes());
        data.extend_from_slice(&[month, day]);
        data.extend_from_slice(&[0; 4]);
        data.extend_from_slice(&0x1234u32.to_le_bytes());
        data
    }

    #[test]
    fn test_header() {
        let header = SvmHeader::parse_bytes(&sample(6, 17), 0).expect("Operation should succeed");
        assert_eq!(header.date(), "2008-06-17");
        assert_eq!(header.code_range(), (25, 0x1234));
    }

    #[test]
    fn test_date_range_checks() {
        assert!(matches!(
            SvmHeader::parse_bytes(&sample(13, 1), 0),
            Err(ParseError::InvalidField { field: "month", value: 13 })
        ));
        assert!(matches!(
            SvmHeader::parse_bytes(&sample(1, 0), 0),
            Err(ParseError::InvalidField { field: "day", value: 0 })
        ));
        assert!(SvmHeader::from_bytes(&sample(12, 31), 0).is_some());
    }

    #[test]
    fn test_truncated_header() {
        let mut data = sample(1, 1);
        data.truncate(24);
        assert!(SvmHeader::from_bytes(&data, 0).is_none());
    }
}
