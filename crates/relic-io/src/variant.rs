//! Discriminant-driven record decoding
//!
//! Many legacy layouts choose a record shape from a value that sits at the
//! start of the record: a sentinel word, a version number or a type byte.
//! The helpers here read that value without consuming it, pick the shape and
//! only then commit the cursor.

use crate::cursor::{Cursor, Encoding};
use crate::error::{ParseResult, ReadResult};
use std::io::{Read, Seek};

/// Word marking an empty name-or-ordinal field
pub const ABSENT_SENTINEL: u16 = 0x0000;

/// Word marking that a 16-bit ordinal follows instead of a string
pub const ORDINAL_SENTINEL: u16 = 0xFFFF;

/// Classification of a 16-bit discriminant word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentinel {
    /// `0x0000`
    Absent,
    /// `0xFFFF`
    Ordinal,
    /// Any other value, usually the first code unit of a string
    Other(u16),
}

impl Sentinel {
    /// Classify a raw word
    pub const fn classify(word: u16) -> Self {
        match word {
            ABSENT_SENTINEL => Self::Absent,
            ORDINAL_SENTINEL => Self::Ordinal,
            other => Self::Other(other),
        }
    }
}

/// A field holding nothing, a 16-bit ordinal or a UTF-16 string
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum NameOrOrdinal {
    /// Field was a single zero word
    #[default]
    Absent,
    /// Field was `0xFFFF` followed by an ordinal
    Ordinal(u16),
    /// Field was a zero-terminated UTF-16 string
    Name(String),
}

impl NameOrOrdinal {
    /// Decode one field
    ///
    /// Consumes 2 bytes for [`Absent`](Self::Absent), 4 bytes for
    /// [`Ordinal`](Self::Ordinal) and the string plus its terminator for
    /// [`Name`](Self::Name).
    pub fn read<R: Read + Seek>(cursor: &mut Cursor<R>) -> ReadResult<Self> {
        cursor.atomic(|c| match Sentinel::classify(c.peek_u16_le()?) {
            Sentinel::Absent => {
                c.skip(2)?;
                Ok(Self::Absent)
            }
            Sentinel::Ordinal => {
                c.skip(2)?;
                Ok(Self::Ordinal(c.read_u16_le()?))
            }
            Sentinel::Other(_) => Ok(Self::Name(c.read_cstring(Encoding::Utf16Le)?)),
        })
    }

    /// Encode the field, used by writers and tests
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Absent => ABSENT_SENTINEL.to_le_bytes().to_vec(),
            Self::Ordinal(ordinal) => {
                let mut out = ORDINAL_SENTINEL.to_le_bytes().to_vec();
                out.extend_from_slice(&ordinal.to_le_bytes());
                out
            }
            Self::Name(name) => {
                let mut out = Encoding::Utf16Le.encode(name);
                out.extend_from_slice(&[0, 0]);
                out
            }
        }
    }

    /// The ordinal, if the field holds one
    pub fn ordinal(&self) -> Option<u16> {
        match self {
            Self::Ordinal(ordinal) => Some(*ordinal),
            _ => None,
        }
    }

    /// The string, if the field holds one
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name),
            _ => None,
        }
    }

    /// Whether the field is empty
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

/// A record with a closed set of shapes selected by a discriminant
///
/// Implementors say how to peek the discriminant and how to decode each
/// shape; [`Variant::read`] ties the two together so that the cursor only
/// moves once a shape has been chosen and fully decoded.
pub trait Variant: Sized {
    /// Value that selects the shape
    type Discriminant: Copy;

    /// Read the discriminant without consuming any bytes
    fn peek_discriminant<R: Read + Seek>(
        cursor: &mut Cursor<R>,
    ) -> ReadResult<Self::Discriminant>;

    /// Decode the shape for `discriminant`, starting at the record start
    fn decode<R: Read + Seek>(
        cursor: &mut Cursor<R>,
        discriminant: Self::Discriminant,
    ) -> ParseResult<Self>;

    /// Peek, decide and decode as one step
    fn read<R: Read + Seek>(cursor: &mut Cursor<R>) -> ParseResult<Self> {
        let discriminant = Self::peek_discriminant(cursor)?;
        cursor.atomic(|c| Self::decode(c, discriminant))
    }
}

/// Read a one- or two-byte length prefix
///
/// A first byte with the high bit clear is the length itself. With the high
/// bit set, its low seven bits are the high byte of a 15-bit length and the
/// next byte is the low byte.
pub fn read_var_length<R: Read + Seek>(cursor: &mut Cursor<R>) -> ReadResult<u16> {
    cursor.atomic(|c| {
        let first = c.read_u8()?;
        if first & 0x80 == 0 {
            return Ok(u16::from(first));
        }
        let second = c.read_u8()?;
        Ok((u16::from(first & 0x7F) << 8) | u16::from(second))
    })
}
