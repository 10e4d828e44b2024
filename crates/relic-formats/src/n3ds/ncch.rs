//! NCCH partition header and extended header

use super::fixed_ascii;
use binrw::BinRead;

/// Magic of a readable NCCH header
pub const NCCH_MAGIC: [u8; 4] = *b"NCCH";

/// Size of a signed NCCH header
pub const NCCH_HEADER_SIZE: u64 = 0x200;

/// Size of the extended header as stored after the NCCH header
pub const EXTENDED_HEADER_SIZE: u64 = 0x800;

/// Bitmask flag: partition content is not encrypted
pub const BITMASK_NO_CRYPTO: u8 = 0x04;

/// NCCH flag bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead)]
pub struct NcchFlags {
    /// Unused
    pub reserved: [u8; 3],
    /// Crypto method
    pub crypto_method: u8,
    /// Content platform
    pub content_platform: u8,
    /// Content type bits
    pub content_type: u8,
    /// Content unit size exponent
    pub content_unit_size: u8,
    /// `BITMASK_*` bits
    pub bitmasks: u8,
}

/// NCCH partition header (0x200 bytes, or 0x100 without its signature)
#[derive(Debug, Clone, PartialEq, Eq, BinRead)]
#[br(little, import(signed: bool))]
pub struct NcchHeader {
    /// RSA-2048 signature; absent in the development card backup copy
    #[br(if(signed))]
    pub signature: Option<[u8; 0x100]>,
    /// "NCCH" when the partition is readable
    pub magic: [u8; 4],
    /// Content size in media units
    pub content_size: u32,
    /// Partition identifier
    pub partition_id: u64,
    /// Maker code
    pub maker_code: u16,
    /// Header version
    pub version: u16,
    /// Seed verification hash
    pub verification_hash: u32,
    /// Program identifier
    #[br(pad_after = 0x10)]
    pub program_id: [u8; 8],
    /// Hash over the logo region
    pub logo_region_hash: [u8; 0x20],
    /// Product code
    #[br(map = |bytes: [u8; 0x10]| fixed_ascii(&bytes))]
    pub product_code: String,
    /// Hash over the extended header
    pub extended_header_hash: [u8; 0x20],
    /// Hashed size of the extended header
    #[br(pad_after = 4)]
    pub extended_header_size: u32,
    /// Flag bytes
    pub flags: NcchFlags,
    /// Plain region offset in media units
    pub plain_region_offset: u32,
    /// Plain region size in media units
    pub plain_region_size: u32,
    /// Logo region offset in media units
    pub logo_region_offset: u32,
    /// Logo region size in media units
    pub logo_region_size: u32,
    /// ExeFS offset in media units, relative to the partition
    pub exefs_offset: u32,
    /// ExeFS size in media units
    pub exefs_size: u32,
    /// ExeFS hash region size in media units
    #[br(pad_after = 4)]
    pub exefs_hash_region_size: u32,
    /// RomFS offset in media units, relative to the partition
    pub romfs_offset: u32,
    /// RomFS size in media units
    pub romfs_size: u32,
    /// RomFS hash region size in media units
    #[br(pad_after = 4)]
    pub romfs_hash_region_size: u32,
    /// Hash over the ExeFS superblock
    pub exefs_superblock_hash: [u8; 0x20],
    /// Hash over the RomFS superblock
    pub romfs_superblock_hash: [u8; 0x20],
}

impl NcchHeader {
    /// Whether the header carries the NCCH magic
    pub fn is_valid(&self) -> bool {
        self.magic == NCCH_MAGIC
    }

    /// Whether the partition content is encrypted
    pub fn is_encrypted(&self) -> bool {
        self.flags.bitmasks & BITMASK_NO_CRYPTO == 0
    }
}

/// Address and size of one code segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead)]
#[br(little)]
pub struct CodeSetInfo {
    /// Load address
    pub address: u32,
    /// Physical region size in pages
    pub physical_region_size: u32,
    /// Size in bytes
    pub size: u32,
}

/// System control info (0x200 bytes)
#[derive(Debug, Clone, PartialEq, Eq, BinRead)]
#[br(little)]
pub struct SystemControlInfo {
    /// Application title
    #[br(map = |bytes: [u8; 8]| fixed_ascii(&bytes), pad_after = 5)]
    pub application_title: String,
    /// Flag byte
    pub flag: u8,
    /// Remaster version
    pub remaster_version: u16,
    /// Text segment
    pub text: CodeSetInfo,
    /// Stack size
    pub stack_size: u32,
    /// Read-only data segment
    #[br(pad_after = 4)]
    pub read_only: CodeSetInfo,
    /// Data segment
    pub data: CodeSetInfo,
    /// BSS size
    pub bss_size: u32,
    /// Program identifiers of required modules
    pub dependencies: [u64; 48],
    /// Save data size
    pub save_data_size: u64,
    /// Jump identifier
    #[br(pad_after = 0x30)]
    pub jump_id: u64,
}

/// Access control info (0x200 bytes)
#[derive(Debug, Clone, PartialEq, Eq, BinRead)]
#[br(little)]
pub struct AccessControlInfo {
    /// Program identifier
    pub program_id: u64,
    /// Core version
    pub core_version: u32,
    /// Flag bytes 1, 2 and 0, in that order
    pub flags: [u8; 3],
    /// Thread priority
    pub priority: u8,
    /// Resource limit descriptors
    pub resource_limits: [u16; 16],
    /// Extdata identifier
    pub extdata_id: u64,
    /// System save data identifiers
    pub system_savedata_ids: [u8; 8],
    /// Accessible unique identifiers
    pub accessible_unique_ids: [u8; 8],
    /// Filesystem access info
    pub filesystem_access: [u8; 7],
    /// Other storage attributes
    pub storage_attributes: u8,
    /// Service access control entries
    pub services: [u64; 34],
    /// Resource limit category
    #[br(pad_before = 0x0F)]
    pub resource_limit_category: u8,
    /// ARM11 kernel capability descriptors
    #[br(pad_after = 0x10)]
    pub kernel_descriptors: [u32; 28],
    /// ARM9 access control descriptors
    pub arm9_descriptors: [u8; 15],
    /// ARM9 descriptor version
    pub arm9_descriptor_version: u8,
}

/// Extended header following a readable NCCH header
#[derive(Debug, Clone, PartialEq, Eq, BinRead)]
#[br(little)]
pub struct ExtendedHeader {
    /// System control info
    pub system_control: SystemControlInfo,
    /// Access control info
    pub access_control: AccessControlInfo,
    /// Signature over the access descriptor
    pub access_descriptor_signature: [u8; 0x100],
    /// NCCH header public key
    pub ncch_public_key: [u8; 0x100],
    /// Access control limits
    pub access_control_limits: AccessControlInfo,
}
