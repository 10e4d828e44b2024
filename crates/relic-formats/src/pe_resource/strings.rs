//! String table resources
//!
//! Each `RT_STRING` resource is a block of sixteen length-prefixed UTF-16
//! strings. Block `n` (the resource name) holds string identifiers
//! `(n - 1) * 16` through `(n - 1) * 16 + 15`.

use relic_io::{Cursor, Encoding, Format, ParseError, ParseResult, ReaderConfig};
use std::io::{Read, Seek};

/// Strings held by one block
pub const STRINGS_PER_BLOCK: u32 = 16;

/// Decoded string block
///
/// Empty slots are kept as empty strings so indices stay aligned with the
/// string identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringTable {
    /// Strings in slot order
    pub strings: Vec<String>,
}

impl Format for StringTable {
    const NAME: &'static str = "RT_STRING";

    /// A single odd byte left after the last string is ignored
    fn read<R: Read + Seek>(cursor: &mut Cursor<R>, config: &ReaderConfig) -> ParseResult<Self> {
        let mut strings = Vec::new();
        while cursor.remaining() >= 2 {
            if strings.len() as u64 >= config.max_table_entries {
                return Err(ParseError::CountOutOfRange {
                    field: "strings",
                    count: strings.len() as u64 + 1,
                    limit: config.max_table_entries,
                });
            }
            let units = u64::from(cursor.peek_u16_le()?);
            let available = (cursor.remaining() - 2) / 2;
            if units > available {
                return Err(ParseError::CountOutOfRange {
                    field: "string_length",
                    count: units,
                    limit: available,
                });
            }
            cursor.skip(2)?;
            strings.push(cursor.read_string(units as usize * 2, Encoding::Utf16Le)?);
        }
        Ok(Self { strings })
    }
}

impl StringTable {
    /// String in slot `index`, if present and non-empty
    pub fn get(&self, index: usize) -> Option<&str> {
        self.strings
            .get(index)
            .map(String::as_str)
            .filter(|text| !text.is_empty())
    }

    /// Pair each non-empty slot with its string identifier
    ///
    /// `block_id` is the resource name of the block, starting at 1.
    pub fn with_ids(&self, block_id: u16) -> Vec<(u32, &str)> {
        let base = u32::from(block_id.saturating_sub(1)) * STRINGS_PER_BLOCK;
        self.strings
            .iter()
            .enumerate()
            .filter(|(_, text)| !text.is_empty())
            .map(|(slot, text)| (base + slot as u32, text.as_str()))
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn block(strings: &[&str]) -> Vec<u8> {
        let mut data = Vec::new();
        for text in strings {
            let units = Encoding::Utf16Le.encode(text);
            data.extend_from_slice(&((units.len() / 2) as u16).to_le_bytes());
            data.extend(units);
        }
        data
    }

    #[test]
    fn test_block_with_empty_slots() {
        let mut slots = vec![""; 16];
        slots[1] = "Open";
        slots[15] = "Line one\nline two";
        let table = StringTable::parse_bytes(&block(&slots), 0).expect("Operation should succeed");
        assert_eq!(table.strings.len(), 16);
        assert_eq!(table.get(0), None);
        assert_eq!(table.get(1), Some("Open"));
        assert_eq!(
            table.with_ids(2),
            vec![(17, "Open"), (31, "Line one\nline two")]
        );
    }

    #[test]
    fn test_trailing_odd_byte_ignored() {
        let mut data = block(&["Save", "Quit"]);
        data.push(0xAA);
        let table = StringTable::parse_bytes(&data, 0).expect("Operation should succeed");
        assert_eq!(table.strings, vec!["Save".to_string(), "Quit".to_string()]);
    }

    #[test]
    fn test_length_past_end() {
        let mut data = block(&["abc"]);
        data.truncate(data.len() - 2);
        assert!(matches!(
            StringTable::parse_bytes(&data, 0),
            Err(ParseError::CountOutOfRange { field: "string_length", count: 3, limit: 2 })
        ));
    }
}
