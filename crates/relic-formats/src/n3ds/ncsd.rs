//! NCSD image header and the card info blocks that follow it

use super::ncch::NcchHeader;
use binrw::BinRead;

/// Magic at offset 0x100
pub const NCSD_MAGIC: [u8; 4] = *b"NCSD";

/// Partition filesystem type of a regular cart image
pub const FS_TYPE_NORMAL: u64 = 1;
/// Partition filesystem type left unset
pub const FS_TYPE_NONE: u64 = 0;
/// Partition filesystem type of a firmware image
pub const FS_TYPE_FIRM: u64 = 3;

/// Index of the media unit exponent inside the partition flags
pub const MEDIA_UNIT_SIZE_INDEX: usize = 6;

/// Smallest media unit, in bytes
pub const BASE_MEDIA_UNIT: u64 = 0x200;

/// Largest accepted media unit exponent
const MAX_MEDIA_UNIT_EXPONENT: u8 = 16;

/// Offset and length of one partition, in media units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, BinRead)]
#[br(little)]
pub struct PartitionEntry {
    /// Start of the partition
    pub offset: u32,
    /// Length of the partition; zero for an unused slot
    pub length: u32,
}

/// NCSD header (0x200 bytes)
#[derive(Debug, Clone, PartialEq, Eq, BinRead)]
#[br(little)]
pub struct NcsdHeader {
    /// RSA-2048 signature over the header
    pub signature: [u8; 0x100],
    /// "NCSD"
    pub magic: [u8; 4],
    /// Image size in media units
    pub image_size: u32,
    /// Media identifier
    pub media_id: [u8; 8],
    /// Filesystem type shared by all partitions
    pub partitions_fs_type: u64,
    /// Per-partition crypt type
    pub partitions_crypt_type: [u8; 8],
    /// Partition table
    pub partition_table: [PartitionEntry; 8],
    /// Remainder of the header, laid out by filesystem type
    #[br(args(partitions_fs_type))]
    pub layout: HeaderLayout,
}

impl NcsdHeader {
    /// Size of one media unit in bytes
    ///
    /// Firmware images carry no partition flags and use the base unit.
    pub fn media_unit_size(&self) -> Option<u64> {
        match &self.layout {
            HeaderLayout::Cart(cart) => {
                let exponent = cart.partition_flags[MEDIA_UNIT_SIZE_INDEX];
                (exponent <= MAX_MEDIA_UNIT_EXPONENT).then(|| BASE_MEDIA_UNIT << exponent)
            }
            HeaderLayout::Firm { .. } => Some(BASE_MEDIA_UNIT),
        }
    }
}

/// Filesystem-type dependent tail of the NCSD header
#[derive(Debug, Clone, PartialEq, Eq, BinRead)]
#[br(little, import(fs_type: u64))]
pub enum HeaderLayout {
    /// Regular cart image
    #[br(pre_assert(fs_type == FS_TYPE_NORMAL || fs_type == FS_TYPE_NONE))]
    Cart(CartLayout),
    /// Firmware image
    #[br(pre_assert(fs_type == FS_TYPE_FIRM))]
    Firm {
        /// Unidentified bytes
        unknown: [u8; 0x5E],
        /// Encrypted master boot record
        encrypted_mbr: [u8; 0x42],
    },
}

/// Header tail of a regular cart image
#[derive(Debug, Clone, PartialEq, Eq, BinRead)]
#[br(little)]
pub struct CartLayout {
    /// SHA-256 over the first partition's extended header
    pub exheader_hash: [u8; 0x20],
    /// Size of the additional header
    pub additional_header_size: u32,
    /// Offset of sector zero
    pub sector_zero_offset: u32,
    /// Partition flags; index 6 is the media unit exponent
    pub partition_flags: [u8; 8],
    /// Partition identifiers
    pub partition_ids: [u64; 8],
    /// Firmware update bytes
    #[br(pad_before = 0x2E)]
    pub firm_update: [u8; 2],
}

/// Card info header (0xE00 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead)]
#[br(little)]
pub struct CardInfoHeader {
    /// Writable address in media units
    pub writable_address: u32,
    /// Card info bitmask
    #[br(pad_after = 0xF8)]
    pub card_info_bitmask: u32,
    /// Filled size of the cart
    #[br(pad_after = 0x0C)]
    pub filled_size: u32,
    /// Title version
    pub title_version: u16,
    /// Card revision
    #[br(pad_after = 0x0C)]
    pub card_revision: u16,
    /// Title identifier of the CVer title
    pub cver_title_id: [u8; 8],
    /// Version of the CVer title
    #[br(pad_after = 0xCD6)]
    pub cver_version: u16,
}

/// Development card info (0x3000 bytes)
#[derive(Debug, Clone, PartialEq, Eq, BinRead)]
#[br(little)]
pub struct DevelopmentCardInfo {
    /// Card seed KeyY
    pub card_seed_key_y: [u8; 0x10],
    /// Encrypted card seed
    pub encrypted_card_seed: [u8; 0x10],
    /// AES-MAC over the card seed
    pub card_seed_mac: [u8; 0x10],
    /// Nonce of the card seed
    #[br(pad_after = 0xC4)]
    pub card_seed_nonce: [u8; 0x0C],
    /// Copy of the first partition's NCCH header, without its signature
    #[br(args(false))]
    pub backup_header: NcchHeader,
    /// Title key
    #[br(pad_before = 0x200, pad_after = 0x1BF0)]
    pub title_key: [u8; 0x10],
    /// Test pattern signature
    #[br(pad_after = 0xFF8)]
    pub test_signature: [u8; 8],
}
