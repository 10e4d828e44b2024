//! NCF fixed headers

use binrw::{BinRead, BinWrite};

/// Leading words every NCF file starts with: header version 1, format 2.1
pub const SIGNATURE: [u8; 12] = [1, 0, 0, 0, 2, 0, 0, 0, 1, 0, 0, 0];

/// Marker word of the checksum map header
pub const CHECKSUM_MAP_MAGIC: u32 = 0x1489_3721;

/// File header (44 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct NcfHeader {
    /// Always 1
    pub header_version: u32,
    /// Always 2
    pub major_version: u32,
    /// Always 1
    pub minor_version: u32,
    /// Cache identifier
    pub cache_id: u32,
    /// Last version played
    pub last_version_played: u32,
    /// Unused
    pub reserved1: u32,
    /// Unused
    pub reserved2: u32,
    /// Total file size
    pub file_size: u32,
    /// Size of one data block
    pub block_size: u32,
    /// Number of data blocks
    pub block_count: u32,
    /// Unused
    pub reserved3: u32,
}

impl NcfHeader {
    /// Encoded size in bytes
    pub const SIZE: u64 = 44;
}

/// Directory header (56 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct DirectoryHeader {
    /// Always 4
    pub header_version: u32,
    /// Cache identifier
    pub cache_id: u32,
    /// Last version played
    pub last_version_played: u32,
    /// Number of directory items
    pub item_count: u32,
    /// Number of file items
    pub file_count: u32,
    /// Length of the checksum data
    pub checksum_data_length: u32,
    /// Size of the whole directory section, this header included
    pub directory_size: u32,
    /// Size of the name blob
    pub name_size: u32,
    /// Number of info1 entries
    pub info1_count: u32,
    /// Number of copy entries
    pub copy_count: u32,
    /// Number of local entries
    pub local_count: u32,
    /// Unused
    pub reserved1: u32,
    /// Unused
    pub reserved2: u32,
    /// Directory checksum
    pub checksum: u32,
}

impl DirectoryHeader {
    /// Expected header version
    pub const VERSION: u32 = 4;
}

/// Header between the directory and the checksum section
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct UnknownHeader {
    /// Always 1
    pub header_version: u32,
    /// Always 0
    pub reserved: u32,
}

/// Checksum section header
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct ChecksumHeader {
    /// Always 1
    pub header_version: u32,
    /// Size of the checksum map that follows
    pub checksum_size: u32,
}

/// Checksum map header
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct ChecksumMapHeader {
    /// Always [`CHECKSUM_MAP_MAGIC`]
    pub magic: u32,
    /// Always 1
    pub version: u32,
    /// Number of map entries
    pub item_count: u32,
    /// Number of checksums
    pub checksum_count: u32,
}

/// Checksum range of one item
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct ChecksumMapEntry {
    /// Number of checksums belonging to the item
    pub checksum_count: u32,
    /// Index of the first of them
    pub first_checksum_index: u32,
}

impl ChecksumMapEntry {
    /// Encoded size in bytes
    pub const SIZE: u64 = 8;
}
