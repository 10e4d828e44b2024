//! Accelerator table resources

use binrw::BinRead;
use relic_io::{Cursor, Format, ParseError, ParseResult, ReaderConfig, read_table};
use std::io::{Read, Seek};

/// Size of one table entry
const ENTRY_SIZE: u64 = 8;

/// Every flag bit the format defines
const KNOWN_FLAGS: u16 = AcceleratorEntry::VIRTKEY
    | AcceleratorEntry::NOINVERT
    | AcceleratorEntry::SHIFT
    | AcceleratorEntry::CONTROL
    | AcceleratorEntry::ALT
    | AcceleratorEntry::LAST;

/// One keyboard shortcut
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead)]
#[br(little)]
pub struct AcceleratorEntry {
    /// Modifier and type flags
    pub flags: u16,
    /// Virtual key code or character
    pub key: u16,
    /// Command identifier
    pub id: u16,
    /// Padding word
    pub padding: u16,
}

impl AcceleratorEntry {
    /// `key` is a virtual key code rather than a character
    pub const VIRTKEY: u16 = 0x01;
    /// No top-level menu item is highlighted
    pub const NOINVERT: u16 = 0x02;
    /// Shift must be held
    pub const SHIFT: u16 = 0x04;
    /// Ctrl must be held
    pub const CONTROL: u16 = 0x08;
    /// Alt must be held
    pub const ALT: u16 = 0x10;
    /// Last entry of the table
    pub const LAST: u16 = 0x80;

    /// Whether all bits of `flag` are set
    pub fn has(&self, flag: u16) -> bool {
        self.flags & flag == flag
    }
}

/// Accelerator table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceleratorTable {
    /// Entries in table order
    pub entries: Vec<AcceleratorEntry>,
}

impl Format for AcceleratorTable {
    const NAME: &'static str = "RT_ACCELERATOR";

    fn read<R: Read + Seek>(cursor: &mut Cursor<R>, config: &ReaderConfig) -> ParseResult<Self> {
        let size = cursor.remaining();
        if size % ENTRY_SIZE != 0 {
            return Err(ParseError::InvalidField {
                field: "accelerator_table_length",
                value: size as i64,
            });
        }

        let entries = read_table(cursor, config, "accelerators", size / ENTRY_SIZE, ENTRY_SIZE, |c| {
            let entry: AcceleratorEntry = c.read_le()?;
            if entry.flags & !KNOWN_FLAGS != 0 {
                return Err(ParseError::InvalidField {
                    field: "accelerator_flags",
                    value: i64::from(entry.flags),
                });
            }
            Ok(entry)
        })?;
        Ok(Self { entries })
    }
}
