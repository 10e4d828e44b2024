//! Directory entries and the name blob

use binrw::{BinRead, BinWrite};
use std::collections::BTreeMap;

/// Item is a folder
pub const FLAG_FOLDER: u32 = 0x0000_0000;
/// Copy locally, keep existing files
pub const FLAG_COPY_LOCAL_NO_OVERWRITE: u32 = 0x0000_0001;
/// Copy locally
pub const FLAG_COPY_LOCAL: u32 = 0x0000_000A;
/// Back up local copies
pub const FLAG_BACKUP_LOCAL: u32 = 0x0000_0040;
/// Item data is encrypted
pub const FLAG_ENCRYPTED: u32 = 0x0000_0100;
/// Item is a file
pub const FLAG_FILE: u32 = 0x0000_4000;

/// Index value meaning "no item"
pub const NO_INDEX: u32 = 0xFFFF_FFFF;

/// One item of the directory tree (28 bytes)
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct DirectoryEntry {
    /// Offset of the item name inside the name blob
    pub name_offset: u32,
    /// File size, or child count for folders
    pub item_size: u32,
    /// Index into the checksum map
    pub checksum_index: u32,
    /// `FLAG_*` bits
    pub directory_flags: u32,
    /// Index of the parent folder
    pub parent_index: u32,
    /// Index of the next sibling
    pub next_index: u32,
    /// Index of the first child
    pub first_index: u32,
    /// Name resolved from the name blob
    #[brw(ignore)]
    pub name: Option<String>,
}

impl DirectoryEntry {
    /// Encoded size in bytes
    pub const SIZE: u64 = 28;

    /// Whether the item is a file
    pub fn is_file(&self) -> bool {
        self.directory_flags & FLAG_FILE != 0
    }

    /// Whether the item data is encrypted
    pub fn is_encrypted(&self) -> bool {
        self.directory_flags & FLAG_ENCRYPTED != 0
    }
}

/// Split a blob of NUL-terminated names into an offset-keyed map
///
/// A name running past the end of the blob is cut at the end.
pub(super) fn split_names(blob: &[u8]) -> BTreeMap<u32, String> {
    let mut names = BTreeMap::new();
    let mut start = 0;
    while start < blob.len() {
        let rest = &blob[start..];
        let len = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());
        names.insert(
            start as u32,
            String::from_utf8_lossy(&rest[..len]).into_owned(),
        );
        start += len + 1;
    }
    names
}
