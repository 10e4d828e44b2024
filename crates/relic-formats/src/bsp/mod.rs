//! Half-Life level (BSP) support
//!
//! A level starts with a version word and a fixed table of fifteen lumps.
//! Only the texture lump is walked: it holds a count, a table of offsets
//! relative to the lump, and at each offset a texture record with its mip
//! levels and palette.

mod texture;

pub use texture::{MIP_LEVELS, Texture};

use binrw::BinRead;
use relic_io::{Cursor, Format, ParseError, ParseResult, ReaderConfig, read_u32_table};
use std::io::{Read, Seek};
use tracing::trace;

/// Number of lumps in the header
pub const LUMP_COUNT: usize = 15;

/// Index of the texture lump
pub const LUMP_TEXTURES: usize = 2;

/// Accepted level versions
pub const VERSIONS: [u32; 2] = [29, 30];

/// Offset and length of one lump
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead)]
#[br(little)]
pub struct Lump {
    /// Offset from the start of the level
    pub offset: u32,
    /// Length in bytes
    pub length: u32,
}

/// Level header
#[derive(Debug, Clone, PartialEq, Eq, BinRead)]
#[br(little)]
pub struct BspHeader {
    /// Level version
    pub version: u32,
    /// Lump table
    pub lumps: [Lump; LUMP_COUNT],
}

/// Complete level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bsp {
    /// Level header
    pub header: BspHeader,
    /// Offsets of each texture, relative to the texture lump
    pub texture_offsets: Vec<u32>,
    /// Textures; `None` where the offset points outside the level
    pub textures: Vec<Option<Texture>>,
}

impl Format for Bsp {
    const NAME: &'static str = "BSP";

    fn read<R: Read + Seek>(cursor: &mut Cursor<R>, config: &ReaderConfig) -> ParseResult<Self> {
        let origin = cursor.position();
        let version = cursor.peek_u32_le()?;
        if !VERSIONS.contains(&version) {
            return Err(ParseError::UnsupportedVersion {
                format: Self::NAME,
                version: u64::from(version),
            });
        }
        let header: BspHeader = cursor.read_le()?;

        let lump = header.lumps[LUMP_TEXTURES];
        if lump.offset == 0 || lump.length == 0 {
            return Err(ParseError::InvalidField {
                field: "texture_lump",
                value: i64::from(lump.offset),
            });
        }
        let lump_start = origin + u64::from(lump.offset);
        if lump_start >= cursor.len() {
            return Err(ParseError::OffsetOutOfRange {
                offset: lump_start,
                length: cursor.len(),
            });
        }
        cursor.set_position(lump_start)?;

        let count = cursor.read_u32_le()?;
        let texture_offsets = read_u32_table(cursor, config, "texture_count", u64::from(count))?;

        let mut textures = Vec::with_capacity(texture_offsets.len());
        for &offset in &texture_offsets {
            let target = lump_start + u64::from(offset);
            if target >= cursor.len() {
                textures.push(None);
                continue;
            }
            textures.push(Some(cursor.at(target, Texture::read)?));
        }
        trace!(
            version,
            textures = textures.len(),
            "BSP texture lump read"
        );

        Ok(Self {
            header,
            texture_offsets,
            textures,
        })
    }
}

impl Bsp {
    /// Lump at `index`
    pub fn lump(&self, index: usize) -> Option<Lump> {
        self.header.lumps.get(index).copied()
    }

    /// Texture by name, ignoring case
    pub fn find_texture(&self, name: &str) -> Option<&Texture> {
        self.textures
            .iter()
            .flatten()
            .find(|texture| texture.name.eq_ignore_ascii_case(name))
    }
}
