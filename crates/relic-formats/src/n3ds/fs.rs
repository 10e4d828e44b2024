//! ExeFS and RomFS headers

use super::fixed_ascii;
use binrw::BinRead;

/// First magic of a RomFS (IVFC) header
pub const ROMFS_MAGIC: [u8; 4] = *b"IVFC";

/// Second magic of a RomFS header
pub const ROMFS_VERSION: u32 = 0x0001_0000;

/// One file slot of the ExeFS header
#[derive(Debug, Clone, PartialEq, Eq, BinRead)]
#[br(little)]
pub struct ExeFsFile {
    /// File name, empty for an unused slot
    #[br(map = |bytes: [u8; 8]| fixed_ascii(&bytes))]
    pub name: String,
    /// Offset after the ExeFS header
    pub offset: u32,
    /// Size in bytes
    pub size: u32,
}

/// ExeFS header (0x200 bytes)
#[derive(Debug, Clone, PartialEq, Eq, BinRead)]
#[br(little)]
pub struct ExeFsHeader {
    /// File slots
    #[br(pad_after = 0x20)]
    pub files: [ExeFsFile; 10],
    /// SHA-256 per file slot, stored in reverse slot order
    pub hashes: [[u8; 0x20]; 10],
}

impl ExeFsHeader {
    /// Slots holding a file
    pub fn used_files(&self) -> impl Iterator<Item = &ExeFsFile> {
        self.files.iter().filter(|file| !file.name.is_empty())
    }
}

/// One level of the RomFS hash tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead)]
#[br(little)]
pub struct HashLevel {
    /// Logical offset of the level
    pub logical_offset: u64,
    /// Size of the hash data
    pub hash_data_size: u64,
    /// Block size as a power of two
    #[br(pad_after = 4)]
    pub block_size_log2: u32,
}

/// RomFS header
#[derive(Debug, Clone, PartialEq, Eq, BinRead)]
#[br(little)]
pub struct RomFsHeader {
    /// "IVFC"
    #[br(assert(magic == ROMFS_MAGIC))]
    pub magic: [u8; 4],
    /// Always [`ROMFS_VERSION`]
    #[br(assert(version == ROMFS_VERSION))]
    pub version: u32,
    /// Size of the master hash
    pub master_hash_size: u32,
    /// Hash tree levels
    #[br(pad_after = 4)]
    pub levels: [HashLevel; 3],
    /// Size of the optional info
    pub optional_info_size: u32,
}
