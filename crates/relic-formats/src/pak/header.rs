//! Package header and directory items

use binrw::{BinRead, BinWrite};
use relic_io::Encoding;

/// Package signature
pub const SIGNATURE: [u8; 4] = *b"PACK";

/// Size of the header on disk
pub const HEADER_SIZE: u64 = 12;

/// Size of one directory item on disk
pub const ITEM_SIZE: u64 = 64;

/// Width of the zero-padded item name field
pub const NAME_SIZE: usize = 56;

/// Package header
///
/// - Magic "PACK" (4 bytes)
/// - Directory offset (4 bytes, little-endian)
/// - Directory length in bytes (4 bytes, little-endian)
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct PakHeader {
    /// Magic signature, always "PACK"
    pub magic: [u8; 4],

    /// Offset of the directory from the package start
    pub directory_offset: u32,

    /// Directory size in bytes, a multiple of 64
    pub directory_length: u32,
}

impl PakHeader {
    /// Number of items the directory holds
    pub fn item_count(&self) -> u64 {
        u64::from(self.directory_length) / ITEM_SIZE
    }
}

/// One directory item
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct DirectoryItem {
    /// Item path, stored zero-padded in 56 bytes
    #[br(map = |raw: [u8; NAME_SIZE]| decode_name(&raw))]
    #[bw(map = |name: &String| encode_name(name))]
    pub name: String,

    /// Offset of the item data from the package start
    pub offset: u32,

    /// Size of the item data
    pub length: u32,
}

fn decode_name(raw: &[u8]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    Encoding::Ascii.decode(&raw[..end])
}

fn encode_name(name: &str) -> [u8; NAME_SIZE] {
    let mut raw = [0u8; NAME_SIZE];
    let encoded = Encoding::Ascii.encode(name);
    let len = encoded.len().min(NAME_SIZE - 1);
    raw[..len].copy_from_slice(&encoded[..len]);
    raw
}
