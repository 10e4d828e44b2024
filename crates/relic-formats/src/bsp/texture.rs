//! Miptex records of the texture lump

use binrw::BinRead;
use relic_io::{Cursor, Encoding, ParseResult};
use std::io::{Read, Seek};

/// Number of mip levels per texture
pub const MIP_LEVELS: usize = 4;

/// Fixed part of a texture record
#[derive(Debug, Clone, PartialEq, Eq, BinRead)]
#[br(little)]
struct TextureRecord {
    #[br(map = |raw: [u8; 16]| {
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        Encoding::Ascii.decode(&raw[..end])
    })]
    name: String,
    width: u32,
    height: u32,
    mip_offsets: [u32; MIP_LEVELS],
}

/// One texture with its embedded mip levels and palette
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    /// Texture name
    pub name: String,
    /// Width of mip level 0
    pub width: u32,
    /// Height of mip level 0
    pub height: u32,
    /// Offset of each mip level from the start of the record; zero if absent
    pub mip_offsets: [u32; MIP_LEVELS],
    /// Pixel data of all present mip levels, level 0 first
    pub pixels: Vec<u8>,
    /// Palette entries, three bytes each
    pub palette: Vec<u8>,
}

impl Texture {
    /// Read a texture at the cursor position
    ///
    /// Textures referencing an external WAD have no mip offsets and carry no
    /// pixel or palette data.
    pub fn read<R: Read + Seek>(cursor: &mut Cursor<R>) -> ParseResult<Self> {
        cursor.atomic(|c| {
            let record: TextureRecord = c.read_le()?;
            let mut texture = Self {
                name: record.name,
                width: record.width,
                height: record.height,
                mip_offsets: record.mip_offsets,
                pixels: Vec::new(),
                palette: Vec::new(),
            };

            let pixel_size = texture.pixel_size();
            if pixel_size == 0 {
                return Ok(texture);
            }
            // An unaddressable size fails as a short read
            let pixel_size = usize::try_from(pixel_size).unwrap_or(usize::MAX);
            texture.pixels = c.read_bytes(pixel_size)?;
            let palette_size = c.read_u16_le()?;
            texture.palette = c.read_bytes(usize::from(palette_size) * 3)?;
            Ok(texture)
        })
    }

    /// Pixel count of a mip level, zero when the level is absent
    pub fn mip_size(&self, level: usize) -> u64 {
        match self.mip_offsets.get(level) {
            Some(&offset) if offset != 0 => {
                u64::from(self.width >> level) * u64::from(self.height >> level)
            }
            _ => 0,
        }
    }

    /// Combined pixel count of all present mip levels
    pub fn pixel_size(&self) -> u64 {
        (0..MIP_LEVELS).map(|level| self.mip_size(level)).sum()
    }

    /// Pixels of one mip level
    pub fn mip_data(&self, level: usize) -> Option<&[u8]> {
        let size = self.mip_size(level);
        if size == 0 {
            return None;
        }
        let start: u64 = (0..level).map(|l| self.mip_size(l)).sum();
        let start = usize::try_from(start).ok()?;
        let end = start.checked_add(usize::try_from(size).ok()?)?;
        self.pixels.get(start..end)
    }

    /// Number of palette entries
    pub fn palette_len(&self) -> usize {
        self.palette.len() / 3
    }
}
