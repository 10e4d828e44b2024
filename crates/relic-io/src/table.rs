//! Count-driven record tables

use crate::config::ReaderConfig;
use crate::cursor::Cursor;
use crate::error::ParseResult;
use crate::gate;
use std::io::{Read, Seek};
use tracing::trace;

/// Read exactly `count` records in source order
///
/// `min_record_size` is the smallest number of bytes one record can occupy;
/// the count is checked against it before the table is allocated. A short
/// read of any record fails the whole table.
pub fn read_table<R, T, F>(
    cursor: &mut Cursor<R>,
    config: &ReaderConfig,
    field: &'static str,
    count: u64,
    min_record_size: u64,
    mut read: F,
) -> ParseResult<Vec<T>>
where
    R: Read + Seek,
    F: FnMut(&mut Cursor<R>) -> ParseResult<T>,
{
    let count = gate::ensure_count(cursor, config, field, count, min_record_size)?;
    let mut records = Vec::with_capacity(count);
    for _ in 0..count {
        records.push(read(cursor)?);
    }
    trace!(field, count, end = cursor.position(), "table read");
    Ok(records)
}

/// Read `count` little-endian `u32` values
pub fn read_u32_table<R: Read + Seek>(
    cursor: &mut Cursor<R>,
    config: &ReaderConfig,
    field: &'static str,
    count: u64,
) -> ParseResult<Vec<u32>> {
    read_table(cursor, config, field, count, 4, |c| Ok(c.read_u32_le()?))
}
