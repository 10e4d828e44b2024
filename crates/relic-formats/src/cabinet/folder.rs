//! Folder entries and the data blocks they own

use binrw::BinRead;

/// Compression method of a folder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionType {
    /// Stored
    None,
    /// Deflate with MSZIP framing
    MsZip,
    /// Quantum
    Quantum,
    /// LZX
    Lzx,
    /// Any other method value
    Unknown(u16),
}

impl CompressionType {
    /// Mask selecting the method bits of the raw field
    pub const MASK: u16 = 0x000F;

    /// Decode the method from the raw field; upper bits hold parameters
    pub fn from_raw(raw: u16) -> Self {
        match raw & Self::MASK {
            0 => Self::None,
            1 => Self::MsZip,
            2 => Self::Quantum,
            3 => Self::Lzx,
            other => Self::Unknown(other),
        }
    }
}

/// Folder entry (CFFOLDER)
#[derive(Debug, Clone, PartialEq, Eq, BinRead)]
#[br(little, import(reserved_size: u8))]
pub struct Folder {
    /// Offset of the first data block from the cabinet start
    pub cab_start_offset: u32,
    /// Number of data blocks in the folder
    pub data_count: u16,
    /// Raw compression field
    pub compression: u16,
    /// Per-folder reserved data
    #[br(count = reserved_size)]
    pub reserved: Vec<u8>,
    /// Data blocks, read from `cab_start_offset` when it is non-zero
    #[br(ignore)]
    pub data_blocks: Vec<DataBlock>,
}

impl Folder {
    /// Size of the fixed part on disk
    pub const FIXED_SIZE: u64 = 8;

    /// Compression method of the folder
    pub fn compression_type(&self) -> CompressionType {
        CompressionType::from_raw(self.compression)
    }

    /// Sum of the uncompressed sizes of all data blocks
    pub fn uncompressed_size(&self) -> u64 {
        self.data_blocks
            .iter()
            .map(|block| u64::from(block.uncompressed_size))
            .sum()
    }
}

/// Data block (CFDATA)
#[derive(Debug, Clone, PartialEq, Eq, BinRead)]
#[br(little, import(reserved_size: u8))]
pub struct DataBlock {
    /// Checksum of the block, zero when unused
    pub checksum: u32,
    /// Bytes of compressed data
    pub compressed_size: u16,
    /// Bytes after decompression
    pub uncompressed_size: u16,
    /// Per-block reserved data
    #[br(count = reserved_size)]
    pub reserved: Vec<u8>,
    /// Compressed payload
    #[br(count = compressed_size)]
    pub data: Vec<u8>,
}

impl DataBlock {
    /// Size of the fixed part on disk
    pub const FIXED_SIZE: u64 = 8;
}
