//! AACS media key block (MKB) support
//!
//! A media key block is a sequence of typed records, each starting with a
//! type byte and a 24-bit big-endian length that includes the four prefix
//! bytes. Records are padded to a four-byte boundary. The block opens with a
//! type-and-version record and ends with an end-of-block record or the end of
//! data. An unknown record type fails the whole block.

mod record;

pub use record::{
    COPYRIGHT, DRIVE_REVOCATION_LIST, END_OF_MEDIA_KEY_BLOCK, EXPLICIT_SUBSET_DIFFERENCE,
    HOST_REVOCATION_LIST, MEDIA_KEY_DATA, RECORD_HEADER_SIZE, Record, RecordBody, RecordHeader,
    RevocationBlock, RevocationEntry, RevocationList, SUBSET_DIFFERENCE_INDEX, SubsetDifference,
    TYPE_AND_VERSION, VERIFY_MEDIA_KEY,
};

use relic_io::{Cursor, Format, ParseError, ParseResult, ReaderConfig, Variant};
use std::io::{Read, Seek};
use tracing::trace;

/// Complete media key block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaKeyBlock {
    /// Records in block order
    pub records: Vec<Record>,
}

impl Format for MediaKeyBlock {
    const NAME: &'static str = "MKB";

    fn read<R: Read + Seek>(cursor: &mut Cursor<R>, config: &ReaderConfig) -> ParseResult<Self> {
        let origin = cursor.position();
        let first = Record::peek_discriminant(cursor)?;
        if first.record_type != TYPE_AND_VERSION {
            return Err(ParseError::UnknownDiscriminant {
                field: "first_record_type",
                value: u64::from(first.record_type),
            });
        }

        let mut records = Vec::new();
        while !cursor.is_at_end() {
            if records.len() as u64 >= config.max_table_entries {
                return Err(ParseError::CountOutOfRange {
                    field: "records",
                    count: records.len() as u64 + 1,
                    limit: config.max_table_entries,
                });
            }
            let record = Record::read(cursor)?;
            if config.strict_declared_size && !record.unparsed.is_empty() {
                return Err(ParseError::InvalidField {
                    field: "record_length",
                    value: i64::from(record.length),
                });
            }
            let last = record.body.record_type() == END_OF_MEDIA_KEY_BLOCK;
            records.push(record);
            if last {
                break;
            }
            cursor.align_from(4, origin)?;
        }
        trace!(records = records.len(), "media key block read");

        Ok(Self { records })
    }
}

impl MediaKeyBlock {
    /// Block type and version, from the leading record
    pub fn type_and_version(&self) -> Option<(u32, u32)> {
        self.records.iter().find_map(|record| match record.body {
            RecordBody::TypeAndVersion {
                block_type,
                version,
            } => Some((block_type, version)),
            _ => None,
        })
    }

    /// All media keys of the block
    pub fn media_keys(&self) -> impl Iterator<Item = &[u8; 16]> {
        self.records.iter().flat_map(|record| match &record.body {
            RecordBody::MediaKeyData(keys) => keys.as_slice(),
            _ => &[],
        })
    }

    /// Whether the block ended with its terminator record
    pub fn is_terminated(&self) -> bool {
        self.records
            .last()
            .is_some_and(|record| record.body.record_type() == END_OF_MEDIA_KEY_BLOCK)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(record_type: u8, body: &[u8]) -> Vec<u8> {
        let length = body.len() as u32 + RECORD_HEADER_SIZE;
        let mut data = vec![record_type];
        data.extend_from_slice(&length.to_be_bytes()[1..]);
        data.extend_from_slice(body);
        while data.len() % 4 != 0 {
            data.push(0);
        }
        data
    }

    fn type_and_version() -> Vec<u8> {
        let mut body = 0x0003_1003u32.to_be_bytes().to_vec();
        body.extend_from_slice(&68u32.to_be_bytes());
        record(TYPE_AND_VERSION, &body)
    }

    #[test]
    fn test_block_records() {
        let mut data = type_and_version();
        data.extend(record(VERIFY_MEDIA_KEY, &[0x11; 16]));
        let mut keys = vec![0xA0; 16];
        keys.extend_from_slice(&[0xB0; 16]);
        data.extend(record(MEDIA_KEY_DATA, &keys));
        data.extend(record(COPYRIGHT, b"(C) AACS LA\0\0"));

        let mut revocations = 2u32.to_be_bytes().to_vec();
        revocations.extend_from_slice(&2u32.to_be_bytes());
        revocations.extend_from_slice(&[0, 1, 1, 2, 3, 4, 5, 6]);
        revocations.extend_from_slice(&[0, 0, 9, 9, 9, 9, 9, 9]);
        data.extend(record(HOST_REVOCATION_LIST, &revocations));

        // Subset difference records pad themselves to the boundary
        data.extend(record(EXPLICIT_SUBSET_DIFFERENCE, &[1, 0, 0, 0, 7]));
        data.extend(record(END_OF_MEDIA_KEY_BLOCK, &[0x5A; 8]));
        data.extend_from_slice(&[0xEE; 12]);

        let block = MediaKeyBlock::parse_bytes(&data, 0).expect("Operation should succeed");
        assert_eq!(block.records.len(), 7);
        assert_eq!(block.type_and_version(), Some((0x0003_1003, 68)));
        assert_eq!(block.media_keys().count(), 2);
        assert!(block.is_terminated());
        assert_eq!(
            block.records[3].body,
            RecordBody::Copyright("(C) AACS LA".to_string())
        );
        match &block.records[4].body {
            RecordBody::HostRevocationList(list) => {
                assert_eq!(list.total_entries, 2);
                assert_eq!(list.blocks[0].entries[1].id, [9; 6]);
            }
            other => panic!("unexpected record {other:?}"),
        }
        assert_eq!(
            block.records[5].body,
            RecordBody::ExplicitSubsetDifference(vec![SubsetDifference { mask: 1, number: 7 }])
        );
    }

    #[test]
    fn test_unknown_record_type_fails_block() {
        let mut data = type_and_version();
        data.extend(record(0x33, &[0; 4]));
        assert!(matches!(
            MediaKeyBlock::parse_bytes(&data, 0),
            Err(ParseError::UnknownDiscriminant { field: "record_type", value: 0x33 })
        ));
    }

    #[test]
    fn test_must_open_with_type_and_version() {
        let data = record(VERIFY_MEDIA_KEY, &[0; 16]);
        assert!(MediaKeyBlock::from_bytes(&data, 0).is_none());
    }

    #[test]
    fn test_length_shorter_than_prefix() {
        let mut data = type_and_version();
        data.extend_from_slice(&[MEDIA_KEY_DATA, 0, 0, 2]);
        assert!(matches!(
            MediaKeyBlock::parse_bytes(&data, 0),
            Err(ParseError::InvalidField { field: "record_length", value: 2 })
        ));
    }

    #[test]
    fn test_length_past_end_of_data() {
        let mut data = type_and_version();
        data.extend_from_slice(&[MEDIA_KEY_DATA, 0, 1, 0]);
        data.extend_from_slice(&[0; 16]);
        assert!(MediaKeyBlock::from_bytes(&data, 0).is_none());
    }

    #[test]
    fn test_unterminated_block_ends_at_data_end() {
        let data = type_and_version();
        let block = MediaKeyBlock::parse_bytes(&data, 0).expect("Operation should succeed");
        assert!(!block.is_terminated());
    }

    #[test]
    fn test_strict_rejects_unused_record_bytes() {
        let mut data = type_and_version();
        data.extend(record(MEDIA_KEY_DATA, &[0xCC; 20]));
        let block = MediaKeyBlock::parse_bytes(&data, 0).expect("Operation should succeed");
        assert_eq!(block.records[1].unparsed, vec![0xCC; 4]);
        assert!(MediaKeyBlock::parse_bytes_with(&data, 0, &ReaderConfig::default().strict()).is_err());
    }
}
