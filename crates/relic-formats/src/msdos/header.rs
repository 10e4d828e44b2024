//! MZ executable header

use binrw::{BinRead, BinWrite};

/// Executable signature
pub const SIGNATURE: [u8; 2] = *b"MZ";

/// Size of the standard header
pub const HEADER_SIZE: u64 = 28;

/// Size of the extension that follows the standard header in newer executables
pub const EXTENSION_SIZE: u64 = 36;

/// Size of a relocation entry
pub const RELOCATION_SIZE: u64 = 4;

/// Standard MZ header (28 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct ExecutableHeader {
    /// "MZ"
    pub magic: [u8; 2],
    /// Bytes used in the last 512-byte page
    pub last_page_bytes: u16,
    /// Number of 512-byte pages
    pub pages: u16,
    /// Number of relocation entries
    pub relocation_items: u16,
    /// Header size in 16-byte paragraphs
    pub header_paragraph_size: u16,
    /// Minimum extra paragraphs needed
    pub minimum_extra_paragraphs: u16,
    /// Maximum extra paragraphs needed
    pub maximum_extra_paragraphs: u16,
    /// Initial SS, relative to the load segment
    pub initial_ss: u16,
    /// Initial SP
    pub initial_sp: u16,
    /// Word checksum
    pub checksum: u16,
    /// Initial IP
    pub initial_ip: u16,
    /// Initial CS, relative to the load segment
    pub initial_cs: u16,
    /// Offset of the relocation table from the start of the executable
    pub relocation_table_addr: u16,
    /// Overlay number, zero for the main program
    pub overlay_number: u16,
}

impl ExecutableHeader {
    /// Header with the signature set and every other field zero
    pub fn new() -> Self {
        Self {
            magic: SIGNATURE,
            last_page_bytes: 0,
            pages: 0,
            relocation_items: 0,
            header_paragraph_size: 0,
            minimum_extra_paragraphs: 0,
            maximum_extra_paragraphs: 0,
            initial_ss: 0,
            initial_sp: 0,
            checksum: 0,
            initial_ip: 0,
            initial_cs: 0,
            relocation_table_addr: 0,
            overlay_number: 0,
        }
    }
}

impl Default for ExecutableHeader {
    fn default() -> Self {
        Self::new()
    }
}

/// Fields added for new-style (NE/LE/PE) executables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, BinRead, BinWrite)]
#[brw(little)]
pub struct HeaderExtension {
    /// Reserved words
    pub reserved1: [u16; 4],
    /// OEM identifier
    pub oem_identifier: u16,
    /// OEM information
    pub oem_information: u16,
    /// Reserved words
    pub reserved2: [u16; 10],
    /// Offset of the new executable header
    pub new_exe_header_addr: u32,
}

/// One far pointer to patch at load time
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct RelocationEntry {
    /// Offset within the segment
    pub offset: u16,
    /// Segment, relative to the load segment
    pub segment: u16,
}
