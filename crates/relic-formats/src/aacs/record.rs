//! Typed media key block records

use relic_io::{Cursor, Encoding, ParseError, ParseResult, ReadResult, SliceCursor, Variant};
use std::io::{Read, Seek};

/// Record type: end of the media key block
pub const END_OF_MEDIA_KEY_BLOCK: u8 = 0x02;
/// Record type: explicit subset-difference list
pub const EXPLICIT_SUBSET_DIFFERENCE: u8 = 0x04;
/// Record type: media key data
pub const MEDIA_KEY_DATA: u8 = 0x05;
/// Record type: subset-difference index
pub const SUBSET_DIFFERENCE_INDEX: u8 = 0x07;
/// Record type: block type and version
pub const TYPE_AND_VERSION: u8 = 0x10;
/// Record type: drive revocation list
pub const DRIVE_REVOCATION_LIST: u8 = 0x20;
/// Record type: host revocation list
pub const HOST_REVOCATION_LIST: u8 = 0x21;
/// Record type: copyright notice
pub const COPYRIGHT: u8 = 0x7F;
/// Record type: verify media key
pub const VERIFY_MEDIA_KEY: u8 = 0x81;

/// Size of the type and length prefix
pub const RECORD_HEADER_SIZE: u32 = 4;

/// Type byte and declared length of a record, prefix included
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    /// Record type
    pub record_type: u8,
    /// Declared length, 24-bit big-endian on disk
    pub length: u32,
}

/// One subset difference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubsetDifference {
    /// Mask byte
    pub mask: u8,
    /// Subset number
    pub number: u32,
}

/// One revoked drive or host range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevocationEntry {
    /// Number of consecutive identifiers covered
    pub range: u16,
    /// First identifier
    pub id: [u8; 6],
}

/// A signed block of revocation entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevocationBlock {
    /// Entries of the block
    pub entries: Vec<RevocationEntry>,
}

/// Drive or host revocation list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevocationList {
    /// Total entries over all blocks
    pub total_entries: u32,
    /// Signature blocks
    pub blocks: Vec<RevocationBlock>,
}

/// Decoded record body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordBody {
    /// Terminator, carrying the block signature
    EndOfMediaKeyBlock {
        /// Signature over the block
        signature: Vec<u8>,
    },
    /// Explicit subset-difference list
    ExplicitSubsetDifference(Vec<SubsetDifference>),
    /// Encrypted media keys
    MediaKeyData(Vec<[u8; 16]>),
    /// Subset-difference index
    SubsetDifferenceIndex {
        /// Index span
        span: u32,
        /// Offsets into the subset-difference list
        offsets: Vec<u32>,
    },
    /// Block type and version
    TypeAndVersion {
        /// Media key block type
        block_type: u32,
        /// Version number
        version: u32,
    },
    /// Revoked drives
    DriveRevocationList(RevocationList),
    /// Revoked hosts
    HostRevocationList(RevocationList),
    /// Verification ciphertext
    VerifyMediaKey([u8; 16]),
    /// Copyright notice
    Copyright(String),
}

impl RecordBody {
    /// Type byte of this body
    pub fn record_type(&self) -> u8 {
        match self {
            Self::EndOfMediaKeyBlock { .. } => END_OF_MEDIA_KEY_BLOCK,
            Self::ExplicitSubsetDifference(_) => EXPLICIT_SUBSET_DIFFERENCE,
            Self::MediaKeyData(_) => MEDIA_KEY_DATA,
            Self::SubsetDifferenceIndex { .. } => SUBSET_DIFFERENCE_INDEX,
            Self::TypeAndVersion { .. } => TYPE_AND_VERSION,
            Self::DriveRevocationList(_) => DRIVE_REVOCATION_LIST,
            Self::HostRevocationList(_) => HOST_REVOCATION_LIST,
            Self::VerifyMediaKey(_) => VERIFY_MEDIA_KEY,
            Self::Copyright(_) => COPYRIGHT,
        }
    }
}

/// A record with its declared length and any bytes its body left unread
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Declared length, prefix included
    pub length: u32,
    /// Decoded body
    pub body: RecordBody,
    /// Bytes inside the declared length that the body did not cover
    pub unparsed: Vec<u8>,
}

impl Variant for Record {
    type Discriminant = RecordHeader;

    fn peek_discriminant<R: Read + Seek>(cursor: &mut Cursor<R>) -> ReadResult<RecordHeader> {
        let raw = cursor.peek_array::<4>()?;
        Ok(RecordHeader {
            record_type: raw[0],
            length: u32::from_be_bytes([0, raw[1], raw[2], raw[3]]),
        })
    }

    fn decode<R: Read + Seek>(cursor: &mut Cursor<R>, header: RecordHeader) -> ParseResult<Self> {
        let Some(body_len) = header.length.checked_sub(RECORD_HEADER_SIZE) else {
            return Err(ParseError::InvalidField {
                field: "record_length",
                value: i64::from(header.length),
            });
        };
        cursor.skip(u64::from(RECORD_HEADER_SIZE))?;
        let bytes = cursor.read_bytes(body_len as usize)?;

        let mut body = Cursor::over(&bytes);
        let decoded = match header.record_type {
            END_OF_MEDIA_KEY_BLOCK => RecordBody::EndOfMediaKeyBlock {
                signature: body.read_to_end()?,
            },
            EXPLICIT_SUBSET_DIFFERENCE => {
                let mut differences = Vec::new();
                while body.remaining() >= 5 {
                    differences.push(SubsetDifference {
                        mask: body.read_u8()?,
                        number: body.read_u32_be()?,
                    });
                }
                RecordBody::ExplicitSubsetDifference(differences)
            }
            MEDIA_KEY_DATA => {
                let mut keys = Vec::new();
                while body.remaining() >= 16 {
                    keys.push(body.read_array::<16>()?);
                }
                RecordBody::MediaKeyData(keys)
            }
            SUBSET_DIFFERENCE_INDEX => {
                let span = body.read_u32_be()?;
                let mut offsets = Vec::new();
                while body.remaining() >= 4 {
                    offsets.push(body.read_u32_be()?);
                }
                RecordBody::SubsetDifferenceIndex { span, offsets }
            }
            TYPE_AND_VERSION => RecordBody::TypeAndVersion {
                block_type: body.read_u32_be()?,
                version: body.read_u32_be()?,
            },
            DRIVE_REVOCATION_LIST => RecordBody::DriveRevocationList(read_revocations(&mut body)?),
            HOST_REVOCATION_LIST => RecordBody::HostRevocationList(read_revocations(&mut body)?),
            VERIFY_MEDIA_KEY => RecordBody::VerifyMediaKey(body.read_array::<16>()?),
            COPYRIGHT => {
                let text = body.read_to_end()?;
                let end = text.iter().rposition(|&b| b != 0).map_or(0, |last| last + 1);
                RecordBody::Copyright(Encoding::Ascii.decode(&text[..end]))
            }
            other => {
                return Err(ParseError::UnknownDiscriminant {
                    field: "record_type",
                    value: u64::from(other),
                });
            }
        };

        Ok(Self {
            length: header.length,
            body: decoded,
            unparsed: body.read_to_end()?,
        })
    }
}

/// Read signature blocks until the declared total is reached
///
/// An empty block ends the list early.
fn read_revocations(body: &mut SliceCursor<'_>) -> ParseResult<RevocationList> {
    let total_entries = body.read_u32_be()?;
    let mut blocks = Vec::new();
    let mut seen = 0u64;
    while seen < u64::from(total_entries) && !body.is_at_end() {
        let count = body.read_u32_be()?;
        if u64::from(count) * 8 > body.remaining() {
            return Err(ParseError::CountOutOfRange {
                field: "revocation_entries",
                count: u64::from(count),
                limit: body.remaining() / 8,
            });
        }
        let mut entries = Vec::with_capacity(count as usize);
        for _ in 0..count {
            entries.push(RevocationEntry {
                range: body.read_u16_be()?,
                id: body.read_array::<6>()?,
            });
        }
        seen += u64::from(count);
        blocks.push(RevocationBlock { entries });
        if count == 0 {
            break;
        }
    }
    Ok(RevocationList {
        total_entries,
        blocks,
    })
}
