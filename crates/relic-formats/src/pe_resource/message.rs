//! Message table resources

use binrw::BinRead;
use relic_io::{Cursor, Encoding, Format, ParseError, ParseResult, ReaderConfig, gate, read_table};
use std::collections::BTreeMap;
use std::io::{Read, Seek};
use tracing::trace;

/// Entry flag marking UTF-16 text
const UNICODE_FLAG: u16 = 0x0001;

/// Length and flag words before the text
const ENTRY_HEADER_SIZE: u16 = 4;

/// A run of consecutive message identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead)]
#[br(little)]
pub struct MessageBlock {
    /// First identifier
    pub low_id: u32,
    /// Last identifier, inclusive
    pub high_id: u32,
    /// Offset of the first entry from the start of the resource
    pub offset_to_entries: u32,
}

impl MessageBlock {
    const SIZE: u64 = 12;

    /// Number of entries in the block
    pub fn len(&self) -> u64 {
        (u64::from(self.high_id) + 1).saturating_sub(u64::from(self.low_id))
    }

    /// Whether the identifier range is inverted
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEntry {
    /// Entry flags
    pub flags: u16,
    /// Message text with trailing terminators removed
    pub text: String,
}

impl MessageEntry {
    /// Whether the text was stored as UTF-16
    pub fn is_unicode(&self) -> bool {
        self.flags & UNICODE_FLAG != 0
    }
}

/// Complete message table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTable {
    /// Identifier runs
    pub blocks: Vec<MessageBlock>,
    /// Messages keyed by identifier
    pub entries: BTreeMap<u32, MessageEntry>,
}

impl Format for MessageTable {
    const NAME: &'static str = "RT_MESSAGETABLE";

    fn read<R: Read + Seek>(cursor: &mut Cursor<R>, config: &ReaderConfig) -> ParseResult<Self> {
        let origin = cursor.position();
        let count = cursor.read_u32_le()?;
        let blocks = read_table(cursor, config, "number_of_blocks", u64::from(count), MessageBlock::SIZE, |c| {
            Ok(c.read_le::<MessageBlock>()?)
        })?;

        let mut entries = BTreeMap::new();
        for block in &blocks {
            if block.is_empty() {
                return Err(ParseError::InvalidField {
                    field: "high_id",
                    value: i64::from(block.high_id),
                });
            }
            let start = gate::ensure_offset(origin + u64::from(block.offset_to_entries), cursor.len())?;
            let texts = cursor.at(start, |c| {
                read_table(c, config, "message_entries", block.len(), u64::from(ENTRY_HEADER_SIZE), read_entry)
            })?;
            for (id, entry) in (block.low_id..=block.high_id).zip(texts) {
                entries.insert(id, entry);
            }
        }
        trace!(blocks = blocks.len(), entries = entries.len(), "message table read");

        Ok(Self { blocks, entries })
    }
}

impl MessageTable {
    /// Text of message `id`
    pub fn get(&self, id: u32) -> Option<&str> {
        self.entries.get(&id).map(|entry| entry.text.as_str())
    }
}

fn read_entry<R: Read + Seek>(cursor: &mut Cursor<R>) -> ParseResult<MessageEntry> {
    cursor.atomic(|c| {
        let length = c.read_u16_le()?;
        let flags = c.read_u16_le()?;
        let Some(text_len) = length.checked_sub(ENTRY_HEADER_SIZE) else {
            return Err(ParseError::InvalidField {
                field: "message_length",
                value: i64::from(length),
            });
        };
        let encoding = if flags & UNICODE_FLAG != 0 {
            Encoding::Utf16Le
        } else {
            Encoding::Ascii
        };
        let text = c.read_string(usize::from(text_len), encoding)?;
        Ok(MessageEntry {
            flags,
            text: text.trim_end_matches('\0').to_string(),
        })
    })
}
