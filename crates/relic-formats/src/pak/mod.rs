//! Half-Life package (PAK) support
//!
//! A package is a 12-byte header pointing at a directory of fixed 64-byte
//! items. The directory usually sits at the end of the file, after the item
//! data, so the walker jumps straight to it once the header is validated.

mod builder;
mod header;

pub use builder::PackageBuilder;
pub use header::{DirectoryItem, HEADER_SIZE, ITEM_SIZE, NAME_SIZE, PakHeader, SIGNATURE};

use crate::error::{BuildError, BuildResult};
use binrw::{BinWrite, io::Cursor as WriteCursor};
use relic_io::{Cursor, Format, ParseError, ParseResult, ReaderConfig, gate};
use std::io::{Read, Seek};

/// Complete package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    /// Package header
    pub header: PakHeader,
    /// Directory items in on-disk order
    pub items: Vec<DirectoryItem>,
}

impl Format for Package {
    const NAME: &'static str = "PAK";

    fn read<R: Read + Seek>(cursor: &mut Cursor<R>, config: &ReaderConfig) -> ParseResult<Self> {
        let origin = cursor.position();
        gate::expect_signature(Self::NAME, &cursor.peek_array::<4>()?, &SIGNATURE)?;
        let header: PakHeader = cursor.read_le()?;

        // An empty directory may sit right at the end of data
        let directory = origin + u64::from(header.directory_offset);
        if directory > cursor.len() || (directory == cursor.len() && header.item_count() > 0) {
            return Err(ParseError::OffsetOutOfRange {
                offset: directory,
                length: cursor.len(),
            });
        }
        cursor.set_position(directory)?;

        let count = gate::ensure_count(cursor, config, "directory_length", header.item_count(), ITEM_SIZE)?;
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(cursor.read_le()?);
        }

        Ok(Self { header, items })
    }
}

impl Package {
    /// Serialize the package with zero-filled item data
    pub fn build(&self) -> BuildResult<Vec<u8>> {
        self.validate()?;

        let mut buffer = Vec::new();
        let mut cursor = WriteCursor::new(&mut buffer);
        self.header.write(&mut cursor)?;

        buffer.resize(self.header.directory_offset as usize, 0);
        let mut cursor = WriteCursor::new(&mut buffer);
        cursor.set_position(u64::from(self.header.directory_offset));
        for item in &self.items {
            item.write(&mut cursor)?;
        }
        Ok(buffer)
    }

    /// Check that the directory and item data can be laid out
    pub fn validate(&self) -> BuildResult<()> {
        let expected = self.items.len() as u64 * ITEM_SIZE;
        if u64::from(self.header.directory_length) != expected {
            return Err(BuildError::InvalidLayout(format!(
                "directory length {} does not match {} items",
                self.header.directory_length,
                self.items.len()
            )));
        }

        let directory = u64::from(self.header.directory_offset);
        if directory < HEADER_SIZE {
            return Err(BuildError::InvalidLayout(
                "directory overlaps the header".to_string(),
            ));
        }

        for item in &self.items {
            if item.name.len() >= NAME_SIZE {
                return Err(BuildError::FieldOverflow {
                    field: "name",
                    value: item.name.len() as u64,
                });
            }
            let end = u64::from(item.offset) + u64::from(item.length);
            if u64::from(item.offset) < HEADER_SIZE || end > directory {
                return Err(BuildError::InvalidLayout(format!(
                    "item {:?} lies outside the data area",
                    item.name
                )));
            }
        }
        Ok(())
    }

    /// Find an item by its path, ignoring ASCII case
    pub fn find(&self, name: &str) -> Option<&DirectoryItem> {
        self.items
            .iter()
            .find(|item| item.name.eq_ignore_ascii_case(name))
    }
}
