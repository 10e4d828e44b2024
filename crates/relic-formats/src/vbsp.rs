//! Source engine level (VBSP) header support

use binrw::BinRead;
use relic_io::{Cursor, Format, ParseError, ParseResult, ReaderConfig, gate};
use std::io::{Read, Seek};
use tracing::{debug, trace};

/// File signature
pub const SIGNATURE: [u8; 4] = *b"VBSP";

/// Number of lumps in the header
pub const LUMP_COUNT: usize = 64;

/// Version written by some console builds
pub const CONSOLE_VERSION: i32 = 0x0004_0014;

/// Index of the entity lump
pub const LUMP_ENTITIES: usize = 0;
/// Index of the game lump
pub const LUMP_GAME: usize = 35;
/// Index of the embedded pak file lump
pub const LUMP_PAKFILE: usize = 40;

/// One lump of the header
///
/// Version 21 headers from some games store the fields as version, offset,
/// length. Samples seen so far use the order below, so no reordering is
/// applied for any version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead)]
#[br(little)]
pub struct Lump {
    /// Offset from the start of the level
    pub offset: u32,
    /// Length in bytes
    pub length: u32,
    /// Lump format version
    pub version: u32,
    /// Uncompressed size for compressed lumps, otherwise zero
    pub four_cc: [u8; 4],
}

impl Lump {
    /// Whether the lump holds data
    pub fn is_present(&self) -> bool {
        self.length > 0
    }

    /// Offset one past the last byte
    pub fn end(&self) -> u64 {
        u64::from(self.offset) + u64::from(self.length)
    }

    /// Uncompressed size, when the lump is compressed
    pub fn uncompressed_size(&self) -> Option<u32> {
        let size = u32::from_le_bytes(self.four_cc);
        (size != 0).then_some(size)
    }
}

/// Complete level header
#[derive(Debug, Clone, PartialEq, Eq, BinRead)]
#[br(little, magic = b"VBSP")]
pub struct Vbsp {
    /// Level version
    pub version: i32,
    /// Lump table
    pub lumps: [Lump; LUMP_COUNT],
    /// Map revision
    pub map_revision: i32,
}

impl Format for Vbsp {
    const NAME: &'static str = "VBSP";

    fn read<R: Read + Seek>(cursor: &mut Cursor<R>, config: &ReaderConfig) -> ParseResult<Self> {
        let lead = cursor.peek_array::<8>()?;
        gate::expect_signature(Self::NAME, &lead[..4], &SIGNATURE)?;
        let version = i32::from_le_bytes([lead[4], lead[5], lead[6], lead[7]]);
        if !is_supported(version) {
            return Err(ParseError::UnsupportedVersion {
                format: Self::NAME,
                version: u64::from(version as u32),
            });
        }

        let origin = cursor.position();
        let level: Self = cursor.read_le()?;
        if config.strict_declared_size {
            let available = cursor.len() - origin;
            if let Some((index, lump)) = level
                .lumps
                .iter()
                .enumerate()
                .find(|(_, lump)| lump.end() > available)
            {
                debug!(index, end = lump.end(), available, "VBSP lump past the end of data");
                return Err(ParseError::CountOutOfRange {
                    field: "lump_end",
                    count: lump.end(),
                    limit: available,
                });
            }
        }
        trace!(
            version,
            revision = level.map_revision,
            present = level.lumps.iter().filter(|lump| lump.is_present()).count(),
            "VBSP header read"
        );
        Ok(level)
    }
}

/// Whether a header version is understood
pub fn is_supported(version: i32) -> bool {
    (19..=22).contains(&version) || version == CONSOLE_VERSION
}

impl Vbsp {
    /// Lump at `index`
    pub fn lump(&self, index: usize) -> Option<&Lump> {
        self.lumps.get(index)
    }

    /// The embedded pak file lump, when present
    pub fn pakfile(&self) -> Option<&Lump> {
        self.lump(LUMP_PAKFILE).filter(|lump| lump.is_present())
    }
}
