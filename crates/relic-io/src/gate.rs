//! Signature and range checks run before values are trusted

use crate::config::ReaderConfig;
use crate::cursor::Cursor;
use crate::error::{ParseError, ParseResult};
use std::io::{Read, Seek};
use std::ops::RangeInclusive;

/// Require an exact signature match
pub fn expect_signature(format: &'static str, found: &[u8], expected: &[u8]) -> ParseResult<()> {
    if found != expected {
        return Err(ParseError::signature(format, expected, found));
    }
    Ok(())
}

/// Require one of several accepted signatures, returning the index matched
pub fn expect_one_of(
    format: &'static str,
    found: &[u8],
    candidates: &[&[u8]],
) -> ParseResult<usize> {
    candidates
        .iter()
        .position(|candidate| *candidate == found)
        .ok_or_else(|| ParseError::InvalidSignature {
            format,
            expected: candidates
                .iter()
                .map(hex::encode)
                .collect::<Vec<_>>()
                .join("|"),
            found: hex::encode(found),
        })
}

/// Check a declared record count before anything is allocated
///
/// The count must fit the configured table limit and `count * record_size`
/// bytes must still be available.
pub fn ensure_count<R: Read + Seek>(
    cursor: &Cursor<R>,
    config: &ReaderConfig,
    field: &'static str,
    count: u64,
    record_size: u64,
) -> ParseResult<usize> {
    if count > config.max_table_entries {
        return Err(ParseError::CountOutOfRange {
            field,
            count,
            limit: config.max_table_entries,
        });
    }
    let available = cursor.remaining();
    match count.checked_mul(record_size) {
        Some(needed) if needed <= available => Ok(count as usize),
        _ => Err(ParseError::CountOutOfRange {
            field,
            count,
            limit: available.checked_div(record_size).unwrap_or(u64::MAX),
        }),
    }
}

/// Check that an offset field points inside a source of `length` bytes
pub fn ensure_offset(offset: u64, length: u64) -> ParseResult<u64> {
    if offset >= length {
        return Err(ParseError::OffsetOutOfRange { offset, length });
    }
    Ok(offset)
}

/// Check that a signed field lies within `range`
pub fn ensure_range(field: &'static str, value: i64, range: RangeInclusive<i64>) -> ParseResult<()> {
    if !range.contains(&value) {
        return Err(ParseError::InvalidField { field, value });
    }
    Ok(())
}

/// Convert a signed count or size, rejecting negatives
pub fn non_negative(field: &'static str, value: i32) -> ParseResult<u64> {
    u64::try_from(value).map_err(|_| ParseError::InvalidField {
        field,
        value: i64::from(value),
    })
}
