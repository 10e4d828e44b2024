//! Builder pattern for creating BFPK archives

use crate::bfpk::{Archive, BfpkHeader, FileEntry, HEADER_SIZE};
use crate::error::{BuildResult, narrow};

/// Builder for BFPK archives
///
/// Lays the data blocks out directly after the file table, each block
/// starting with its compressed size followed by room for the payload.
///
/// ```rust
/// use relic_formats::bfpk::{Archive, ArchiveBuilder};
/// use relic_io::Format;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let archive = ArchiveBuilder::new(1)
///     .add_file("data/intro.bik", 4096, 1024)
///     .add_file("data/empty.txt", 0, 0)
///     .build()?;
///
/// let bytes = archive.build()?;
/// assert_eq!(Archive::from_bytes(&bytes, 0), Some(archive));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ArchiveBuilder {
    version: i32,
    files: Vec<(String, i32, i32)>,
}

impl ArchiveBuilder {
    /// Create an empty builder for the given archive version
    pub fn new(version: i32) -> Self {
        Self {
            version,
            files: Vec::new(),
        }
    }

    /// Add a file with its uncompressed and compressed sizes
    #[must_use]
    pub fn add_file(mut self, name: impl Into<String>, uncompressed_size: i32, compressed_size: i32) -> Self {
        self.files.push((name.into(), uncompressed_size, compressed_size));
        self
    }

    /// Assign data offsets and produce the archive
    pub fn build(self) -> BuildResult<Archive> {
        let table_end = HEADER_SIZE
            + self
                .files
                .iter()
                .map(|(name, _, _)| FileEntry::MIN_SIZE + name.len() as u64)
                .sum::<u64>();

        let mut next_block = table_end;
        let mut files = Vec::with_capacity(self.files.len());
        for (name, uncompressed_size, compressed_size) in self.files {
            let offset = narrow::<i32>("offset", next_block)?;
            next_block += 4 + u64::try_from(compressed_size).unwrap_or(0);
            files.push(FileEntry {
                name,
                uncompressed_size,
                offset,
                compressed_size: Some(compressed_size),
            });
        }

        let file_count = narrow::<i32>("file_count", files.len() as u64)?;
        Ok(Archive {
            header: BfpkHeader::new(self.version, file_count),
            files,
        })
    }
}
