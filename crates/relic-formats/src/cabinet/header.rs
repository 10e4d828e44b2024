//! Cabinet header with its flag-gated optional blocks

use binrw::{BinRead, NullString};

/// Cabinet signature
pub const SIGNATURE: [u8; 4] = *b"MSCF";

/// Largest per-cabinet reserved area the format allows
pub const MAX_HEADER_RESERVE: u16 = 60_000;

/// Header flag: the set continues from a previous cabinet
pub const FLAG_PREV_CABINET: u16 = 0x0001;
/// Header flag: the set continues in a next cabinet
pub const FLAG_NEXT_CABINET: u16 = 0x0002;
/// Header flag: reserved-area sizes are present
pub const FLAG_RESERVE_PRESENT: u16 = 0x0004;

/// Cabinet header (CFHEADER)
///
/// The fixed part is 36 bytes. Which optional blocks follow it is decided
/// by `flags`, and each block is only populated when its flag is set.
#[derive(Debug, Clone, PartialEq, Eq, BinRead)]
#[br(little)]
pub struct CabinetHeader {
    /// Magic signature, always "MSCF"
    pub signature: [u8; 4],
    /// Reserved, zero
    pub reserved1: u32,
    /// Total size of the cabinet file in bytes
    pub cabinet_size: u32,
    /// Reserved, zero
    pub reserved2: u32,
    /// Offset of the first file entry from the cabinet start
    pub files_offset: u32,
    /// Reserved, zero
    pub reserved3: u32,
    /// Format minor version, usually 3
    pub version_minor: u8,
    /// Format major version, usually 1
    pub version_major: u8,
    /// Number of folder entries
    pub folder_count: u16,
    /// Number of file entries
    pub file_count: u16,
    /// Optional-block flags
    pub flags: u16,
    /// Identifier shared by all cabinets of a set
    pub set_id: u16,
    /// Position of this cabinet within its set
    pub cabinet_index: u16,

    /// Reserved-area sizes and the per-cabinet reserved data
    #[br(if(flags & FLAG_RESERVE_PRESENT != 0))]
    pub reserve: Option<ReserveArea>,

    /// Previous cabinet of the set
    #[br(if(flags & FLAG_PREV_CABINET != 0))]
    pub previous: Option<CabinetLink>,

    /// Next cabinet of the set
    #[br(if(flags & FLAG_NEXT_CABINET != 0))]
    pub next: Option<CabinetLink>,
}

impl CabinetHeader {
    /// Reserved bytes trailing every folder entry
    pub fn folder_reserved_size(&self) -> u8 {
        self.reserve.as_ref().map_or(0, |r| r.folder_reserved_size)
    }

    /// Reserved bytes trailing every data block header
    pub fn data_reserved_size(&self) -> u8 {
        self.reserve.as_ref().map_or(0, |r| r.data_reserved_size)
    }
}

/// Reserved-area block, present with [`FLAG_RESERVE_PRESENT`]
#[derive(Debug, Clone, PartialEq, Eq, BinRead)]
#[br(little)]
pub struct ReserveArea {
    /// Size of the per-cabinet reserved data
    #[br(assert(
        header_reserved_size <= MAX_HEADER_RESERVE,
        "header reserve of {} bytes exceeds {}",
        header_reserved_size,
        MAX_HEADER_RESERVE
    ))]
    pub header_reserved_size: u16,
    /// Reserved bytes per folder entry
    pub folder_reserved_size: u8,
    /// Reserved bytes per data block
    pub data_reserved_size: u8,
    /// Per-cabinet reserved data
    #[br(count = header_reserved_size)]
    pub data: Vec<u8>,
}

/// Name and disk label of a neighbouring cabinet
#[derive(Debug, Clone, PartialEq, Eq, BinRead)]
pub struct CabinetLink {
    /// Cabinet file name
    #[br(map = |s: NullString| s.to_string())]
    pub cabinet: String,
    /// Label of the disk holding that cabinet
    #[br(map = |s: NullString| s.to_string())]
    pub disk: String,
}
