//! File entries (CFFILE)

use relic_io::{Cursor, Encoding, ReadResult};
use std::io::{Read, Seek};

/// Attribute: read-only
pub const ATTR_READ_ONLY: u16 = 0x0001;
/// Attribute: hidden
pub const ATTR_HIDDEN: u16 = 0x0002;
/// Attribute: system file
pub const ATTR_SYSTEM: u16 = 0x0004;
/// Attribute: archive bit
pub const ATTR_ARCHIVE: u16 = 0x0040;
/// Attribute: run after extraction
pub const ATTR_EXECUTE: u16 = 0x0080;
/// Attribute: name is UTF-16LE rather than ASCII
pub const ATTR_NAME_IS_UTF: u16 = 0x0100;

/// Which folder a file's data lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderRef {
    /// Index into the cabinet's folder table
    Index(u16),
    /// Data starts in the previous cabinet
    ContinuedFromPrevious,
    /// Data continues into the next cabinet
    ContinuedToNext,
    /// Data spans the previous, this and the next cabinet
    ContinuedPreviousAndNext,
}

impl FolderRef {
    /// Decode the raw folder index field
    pub fn from_raw(raw: u16) -> Self {
        match raw {
            0xFFFD => Self::ContinuedFromPrevious,
            0xFFFE => Self::ContinuedToNext,
            0xFFFF => Self::ContinuedPreviousAndNext,
            index => Self::Index(index),
        }
    }
}

/// File entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CabinetFile {
    /// Uncompressed size of the file
    pub file_size: u32,
    /// Offset of the file within its folder's uncompressed data
    pub folder_start_offset: u32,
    /// Raw folder index field
    pub folder_index: u16,
    /// MS-DOS date
    pub date: u16,
    /// MS-DOS time
    pub time: u16,
    /// Attribute bits
    pub attributes: u16,
    /// File name
    pub name: String,
}

impl CabinetFile {
    /// Smallest possible entry: fixed part and an empty name
    pub const MIN_SIZE: u64 = 17;

    /// Read one entry, choosing the name encoding from the attributes
    pub fn read<R: Read + Seek>(cursor: &mut Cursor<R>) -> ReadResult<Self> {
        cursor.atomic(|c| {
            let file_size = c.read_u32_le()?;
            let folder_start_offset = c.read_u32_le()?;
            let folder_index = c.read_u16_le()?;
            let date = c.read_u16_le()?;
            let time = c.read_u16_le()?;
            let attributes = c.read_u16_le()?;
            let encoding = if attributes & ATTR_NAME_IS_UTF != 0 {
                Encoding::Utf16Le
            } else {
                Encoding::Ascii
            };
            let name = c.read_cstring(encoding)?;

            Ok(Self {
                file_size,
                folder_start_offset,
                folder_index,
                date,
                time,
                attributes,
                name,
            })
        })
    }

    /// Folder holding this file's data
    pub fn folder(&self) -> FolderRef {
        FolderRef::from_raw(self.folder_index)
    }

    /// Whether the file's data spans into another cabinet
    pub fn is_continued(&self) -> bool {
        !matches!(self.folder(), FolderRef::Index(_))
    }

    /// Whether the read-only attribute is set
    pub fn is_read_only(&self) -> bool {
        self.attributes & ATTR_READ_ONLY != 0
    }

    /// Whether the hidden attribute is set
    pub fn is_hidden(&self) -> bool {
        self.attributes & ATTR_HIDDEN != 0
    }

    /// Whether the file should be run after extraction
    pub fn is_executable(&self) -> bool {
        self.attributes & ATTR_EXECUTE != 0
    }

    /// Calendar date as (year, month, day)
    pub fn date_parts(&self) -> (u16, u16, u16) {
        (1980 + (self.date >> 9), (self.date >> 5) & 0x0F, self.date & 0x1F)
    }

    /// Time of day as (hour, minute, second)
    pub fn time_parts(&self) -> (u16, u16, u16) {
        (self.time >> 11, (self.time >> 5) & 0x3F, (self.time & 0x1F) * 2)
    }
}
