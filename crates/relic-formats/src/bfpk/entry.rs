//! BFPK file table entries

use relic_io::{Cursor, Encoding, ParseResult};
use std::io::{Read, Seek};

/// One entry of the file table
///
/// When `offset` is positive the compressed size is not stored in the entry
/// itself but as the first four bytes of the file's data block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// File name, empty when the stored name length is not positive
    pub name: String,
    /// Size of the file after decompression
    pub uncompressed_size: i32,
    /// Offset of the data block from the archive start
    pub offset: i32,
    /// Compressed size read from the data block, present when `offset > 0`
    pub compressed_size: Option<i32>,
}

impl FileEntry {
    /// Smallest possible entry: name length, size and offset
    pub const MIN_SIZE: u64 = 12;

    /// Read one entry; `origin` is the archive start
    pub fn read<R: Read + Seek>(cursor: &mut Cursor<R>, origin: u64) -> ParseResult<Self> {
        cursor.atomic(|c| {
            let name_size = c.read_i32_le()?;
            let name = if name_size > 0 {
                c.read_string(name_size as usize, Encoding::Ascii)?
            } else {
                String::new()
            };

            let uncompressed_size = c.read_i32_le()?;
            let offset = c.read_i32_le()?;
            let compressed_size = if offset > 0 {
                Some(c.at(origin + offset as u64, |block| block.read_i32_le())?)
            } else {
                None
            };

            Ok(Self {
                name,
                uncompressed_size,
                offset,
                compressed_size,
            })
        })
    }

    /// Bytes this entry occupies in the file table
    pub fn table_size(&self) -> u64 {
        Self::MIN_SIZE + self.name.len() as u64
    }
}
