//! Half-Life No Cache File (NCF) support
//!
//! An NCF describes a directory tree whose file data lives outside the file
//! itself. The layout is a sequence of count-driven sections:
//!
//! 1. File header, starting with the fixed version words 1, 2, 1
//! 2. Directory section: header, entries, name blob, then the info1, info2,
//!    copy and local tables. Its total size is stored in the header.
//! 3. An item-sized table of unknown words
//! 4. Checksum section: map header, per-item ranges, then the checksums
//!
//! Entry names are resolved from the name blob by offset once the whole
//! directory section has been read.

mod directory;
mod header;

pub use directory::{
    DirectoryEntry, FLAG_BACKUP_LOCAL, FLAG_COPY_LOCAL, FLAG_COPY_LOCAL_NO_OVERWRITE,
    FLAG_ENCRYPTED, FLAG_FILE, FLAG_FOLDER, NO_INDEX,
};
pub use header::{
    CHECKSUM_MAP_MAGIC, ChecksumHeader, ChecksumMapEntry, ChecksumMapHeader, DirectoryHeader,
    NcfHeader, SIGNATURE, UnknownHeader,
};

use relic_io::{Cursor, Format, ParseError, ParseResult, ReaderConfig, gate, read_table, read_u32_table};
use std::collections::BTreeMap;
use std::io::{Read, Seek};
use tracing::{debug, trace};

/// Complete NCF document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ncf {
    /// File header
    pub header: NcfHeader,
    /// Directory header
    pub directory_header: DirectoryHeader,
    /// Directory entries with their resolved names
    pub directory_entries: Vec<DirectoryEntry>,
    /// Name blob split by offset
    pub directory_names: BTreeMap<u32, String>,
    /// Info1 table
    pub info1_entries: Vec<u32>,
    /// Info2 table, one word per item
    pub info2_entries: Vec<u32>,
    /// Indices of items copied locally
    pub copy_entries: Vec<u32>,
    /// Indices of local items
    pub local_entries: Vec<u32>,
    /// Header following the directory section
    pub unknown_header: UnknownHeader,
    /// One word per item following the unknown header
    pub unknown_entries: Vec<u32>,
    /// Checksum section header
    pub checksum_header: ChecksumHeader,
    /// Checksum map header
    pub checksum_map_header: ChecksumMapHeader,
    /// Per-item checksum ranges
    pub checksum_map_entries: Vec<ChecksumMapEntry>,
    /// Checksums
    pub checksum_entries: Vec<u32>,
}

impl Format for Ncf {
    const NAME: &'static str = "NCF";

    fn read<R: Read + Seek>(cursor: &mut Cursor<R>, config: &ReaderConfig) -> ParseResult<Self> {
        gate::expect_signature(Self::NAME, &cursor.peek_array::<12>()?, &SIGNATURE)?;
        let header: NcfHeader = cursor.read_le()?;

        let directory_start = cursor.position();
        let directory_header: DirectoryHeader = cursor.read_le()?;
        if directory_header.header_version != DirectoryHeader::VERSION {
            return Err(ParseError::UnsupportedVersion {
                format: Self::NAME,
                version: u64::from(directory_header.header_version),
            });
        }

        let item_count = u64::from(directory_header.item_count);
        let mut directory_entries: Vec<DirectoryEntry> = read_table(
            cursor,
            config,
            "item_count",
            item_count,
            DirectoryEntry::SIZE,
            |c| Ok(c.read_le()?),
        )?;

        let blob = cursor.read_bytes(directory_header.name_size as usize)?;
        let directory_names = directory::split_names(&blob);
        if !blob.is_empty() {
            for entry in &mut directory_entries {
                let name = directory_names.get(&entry.name_offset).ok_or(
                    ParseError::InvalidField {
                        field: "name_offset",
                        value: i64::from(entry.name_offset),
                    },
                )?;
                entry.name = Some(name.clone());
            }
        }

        let info1_entries = read_u32_table(
            cursor,
            config,
            "info1_count",
            u64::from(directory_header.info1_count),
        )?;
        let info2_entries = read_u32_table(cursor, config, "item_count", item_count)?;
        let copy_entries = read_u32_table(
            cursor,
            config,
            "copy_count",
            u64::from(directory_header.copy_count),
        )?;
        let local_entries = read_u32_table(
            cursor,
            config,
            "local_count",
            u64::from(directory_header.local_count),
        )?;

        let directory_end = directory_start + u64::from(directory_header.directory_size);
        if cursor.position() != directory_end {
            if config.strict_declared_size {
                return Err(ParseError::InvalidField {
                    field: "directory_size",
                    value: i64::from(directory_header.directory_size),
                });
            }
            debug!(
                position = cursor.position(),
                directory_end, "NCF directory size disagrees with its tables"
            );
        }
        cursor.set_position(directory_end)?;

        let unknown_header: UnknownHeader = cursor.read_le()?;
        if unknown_header.header_version != 1 || unknown_header.reserved != 0 {
            return Err(ParseError::InvalidField {
                field: "unknown_header",
                value: i64::from(unknown_header.header_version),
            });
        }
        let unknown_entries = read_u32_table(cursor, config, "item_count", item_count)?;

        let checksum_header: ChecksumHeader = cursor.read_le()?;
        if checksum_header.header_version != 1 {
            return Err(ParseError::UnsupportedVersion {
                format: Self::NAME,
                version: u64::from(checksum_header.header_version),
            });
        }

        let map_start = cursor.position();
        let checksum_map_header: ChecksumMapHeader = cursor.read_le()?;
        if checksum_map_header.magic != CHECKSUM_MAP_MAGIC {
            return Err(ParseError::signature(
                Self::NAME,
                &CHECKSUM_MAP_MAGIC.to_le_bytes(),
                &checksum_map_header.magic.to_le_bytes(),
            ));
        }
        if checksum_map_header.version != 1 {
            return Err(ParseError::UnsupportedVersion {
                format: Self::NAME,
                version: u64::from(checksum_map_header.version),
            });
        }

        let checksum_map_entries = read_table(
            cursor,
            config,
            "checksum_map_count",
            u64::from(checksum_map_header.item_count),
            ChecksumMapEntry::SIZE,
            |c| Ok(c.read_le()?),
        )?;
        let checksum_entries = read_u32_table(
            cursor,
            config,
            "checksum_count",
            u64::from(checksum_map_header.checksum_count),
        )?;
        cursor.set_position(map_start + u64::from(checksum_header.checksum_size))?;

        trace!(
            items = directory_entries.len(),
            checksums = checksum_entries.len(),
            "NCF read"
        );

        Ok(Self {
            header,
            directory_header,
            directory_entries,
            directory_names,
            info1_entries,
            info2_entries,
            copy_entries,
            local_entries,
            unknown_header,
            unknown_entries,
            checksum_header,
            checksum_map_header,
            checksum_map_entries,
            checksum_entries,
        })
    }
}

impl Ncf {
    /// Entries flagged as files
    pub fn files(&self) -> impl Iterator<Item = &DirectoryEntry> {
        self.directory_entries.iter().filter(|entry| entry.is_file())
    }

    /// Slash-separated path of the entry at `index`
    ///
    /// Returns `None` for an unknown index, an unnamed entry, or a parent
    /// chain that does not terminate.
    pub fn path_of(&self, index: usize) -> Option<String> {
        let mut parts = Vec::new();
        let mut current = index;
        for _ in 0..=self.directory_entries.len() {
            let entry = self.directory_entries.get(current)?;
            let name = entry.name.as_deref()?;
            if !name.is_empty() {
                parts.push(name);
            }
            if entry.parent_index == NO_INDEX {
                parts.reverse();
                return Some(parts.join("/"));
            }
            current = entry.parent_index as usize;
        }
        None
    }

    /// Checksums covering the item at `index`
    pub fn checksums_of(&self, index: usize) -> Option<&[u32]> {
        let range = self.checksum_map_entries.get(index)?;
        let start = range.first_checksum_index as usize;
        let end = start.checked_add(range.checksum_count as usize)?;
        self.checksum_entries.get(start..end)
    }
}
