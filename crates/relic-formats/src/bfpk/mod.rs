//! BFPK archive support
//!
//! BFPK is a flat package format: a 12-byte header, a table of file entries
//! and the data blocks the entries point at.
//!
//! # Structure
//!
//! - **Header** (12 bytes): magic "BFPK", version, file count
//! - **File table**: per file a name length, name, uncompressed size and the
//!   offset of its data block
//! - **Data blocks**: a compressed size followed by the compressed payload
//!
//! The compressed size lives in the data block, so reading an entry means
//! jumping to its block and back before the next entry can be read.
//!
//! ```rust
//! use relic_formats::bfpk::Archive;
//! use relic_io::Format;
//!
//! let empty = b"BFPK\x01\0\0\0\0\0\0\0";
//! let archive = Archive::from_bytes(empty, 0).expect("valid archive");
//! assert!(archive.files.is_empty());
//! ```

mod builder;
mod entry;
mod header;

pub use builder::ArchiveBuilder;
pub use entry::FileEntry;
pub use header::{BfpkHeader, HEADER_SIZE, SIGNATURE};

use crate::error::{BuildError, BuildResult, narrow};
use binrw::{BinWrite, io::Cursor as WriteCursor};
use relic_io::{Cursor, Encoding, Format, ParseResult, ReaderConfig, gate};
use std::io::{Read, Seek};
use tracing::trace;

/// Complete BFPK archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    /// Archive header
    pub header: BfpkHeader,
    /// File table in on-disk order
    pub files: Vec<FileEntry>,
}

impl Format for Archive {
    const NAME: &'static str = "BFPK";

    fn read<R: Read + Seek>(cursor: &mut Cursor<R>, config: &ReaderConfig) -> ParseResult<Self> {
        let origin = cursor.position();
        gate::expect_signature(Self::NAME, &cursor.peek_array::<4>()?, &SIGNATURE)?;
        let header: BfpkHeader = cursor.read_le()?;

        let declared = gate::non_negative("file_count", header.file_count)?;
        let count = gate::ensure_count(cursor, config, "file_count", declared, FileEntry::MIN_SIZE)?;

        let mut files = Vec::with_capacity(count);
        for _ in 0..count {
            files.push(FileEntry::read(cursor, origin)?);
        }
        trace!(version = header.version, files = files.len(), "BFPK file table read");

        Ok(Self { header, files })
    }
}

impl Archive {
    /// Serialize the archive
    ///
    /// Each entry with a positive offset gets its compressed size written at
    /// that offset, followed by a zero-filled payload area of that size.
    pub fn build(&self) -> BuildResult<Vec<u8>> {
        self.validate()?;

        let mut buffer = Vec::new();
        let mut cursor = WriteCursor::new(&mut buffer);
        self.header.write(&mut cursor)?;
        for file in &self.files {
            let name = Encoding::Ascii.encode(&file.name);
            narrow::<i32>("name_size", name.len() as u64)?.write_le(&mut cursor)?;
            name.write_le(&mut cursor)?;
            file.uncompressed_size.write_le(&mut cursor)?;
            file.offset.write_le(&mut cursor)?;
        }

        for file in &self.files {
            let Some(compressed_size) = file.compressed_size else {
                continue;
            };
            let start = file.offset as usize;
            let payload = usize::try_from(compressed_size).unwrap_or(0);
            let end = start + 4 + payload;
            if buffer.len() < end {
                buffer.resize(end, 0);
            }
            buffer[start..start + 4].copy_from_slice(&compressed_size.to_le_bytes());
        }

        Ok(buffer)
    }

    /// Check that the table and data blocks can be laid out
    pub fn validate(&self) -> BuildResult<()> {
        if usize::try_from(self.header.file_count).ok() != Some(self.files.len()) {
            return Err(BuildError::InvalidLayout(format!(
                "header declares {} files, table holds {}",
                self.header.file_count,
                self.files.len()
            )));
        }

        let table_end = HEADER_SIZE + self.files.iter().map(FileEntry::table_size).sum::<u64>();
        let mut slots = Vec::new();
        for file in &self.files {
            match (file.offset > 0, file.compressed_size) {
                (true, Some(_)) => {
                    let start = file.offset as u64;
                    if start < table_end {
                        return Err(BuildError::InvalidLayout(format!(
                            "data block of {:?} at {start} overlaps the file table",
                            file.name
                        )));
                    }
                    slots.push((start, start + 4));
                }
                (false, None) => {}
                _ => {
                    return Err(BuildError::InvalidLayout(format!(
                        "entry {:?} must carry a compressed size exactly when its offset is positive",
                        file.name
                    )));
                }
            }
        }

        slots.sort_unstable();
        if slots.windows(2).any(|pair| pair[1].0 < pair[0].1) {
            return Err(BuildError::InvalidLayout(
                "data blocks overlap".to_string(),
            ));
        }
        Ok(())
    }

    /// Total uncompressed size of all files
    pub fn total_uncompressed_size(&self) -> i64 {
        self.files
            .iter()
            .map(|file| i64::from(file.uncompressed_size))
            .sum()
    }
}
