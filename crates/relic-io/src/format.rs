//! Entry points shared by every walker
//!
//! A format implements [`Format::read`] once, against a [`Cursor`] over any
//! seekable source. The buffer, stream and path entry points are derived from
//! it: a buffer becomes a bounded view starting at the requested offset and a
//! path is opened and handed to the stream entry point.

use crate::config::ReaderConfig;
use crate::cursor::Cursor;
use crate::error::{ParseError, ParseResult};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use tracing::{debug, trace};

/// A document that can be walked out of a byte source
pub trait Format: Sized {
    /// Short name used in diagnostics
    const NAME: &'static str;

    /// Walk one document starting at the cursor position
    ///
    /// Offsets stored inside the document are interpreted relative to the
    /// position the walk started at.
    fn read<R: Read + Seek>(cursor: &mut Cursor<R>, config: &ReaderConfig) -> ParseResult<Self>;

    /// Parse from a seekable stream at its current position
    fn parse_stream<R: Read + Seek>(stream: R) -> ParseResult<Self> {
        Self::parse_stream_with(stream, &ReaderConfig::default())
    }

    /// Parse from a seekable stream with explicit limits
    fn parse_stream_with<R: Read + Seek>(stream: R, config: &ReaderConfig) -> ParseResult<Self> {
        let mut cursor = Cursor::new(stream)?;
        walk(&mut cursor, config)
    }

    /// Parse from `data[offset..]`
    fn parse_bytes(data: &[u8], offset: usize) -> ParseResult<Self> {
        Self::parse_bytes_with(data, offset, &ReaderConfig::default())
    }

    /// Parse from `data[offset..]` with explicit limits
    fn parse_bytes_with(data: &[u8], offset: usize, config: &ReaderConfig) -> ParseResult<Self> {
        if data.is_empty() {
            return Err(ParseError::EmptySource);
        }
        if offset >= data.len() {
            return Err(ParseError::OffsetOutOfRange {
                offset: offset as u64,
                length: data.len() as u64,
            });
        }
        let mut cursor = Cursor::from_bytes(data, offset)?;
        walk(&mut cursor, config)
    }

    /// Open `path` and parse from its start
    ///
    /// The file handle is dropped before this returns, on every path.
    fn parse_file(path: impl AsRef<Path>) -> ParseResult<Self> {
        Self::parse_file_with(path, &ReaderConfig::default())
    }

    /// Open `path` and parse with explicit limits
    fn parse_file_with(path: impl AsRef<Path>, config: &ReaderConfig) -> ParseResult<Self> {
        let file = File::open(path.as_ref())?;
        Self::parse_stream_with(BufReader::new(file), config)
    }

    /// Parse a buffer, collapsing every failure into `None`
    fn from_bytes(data: &[u8], offset: usize) -> Option<Self> {
        Self::parse_bytes(data, offset).ok()
    }

    /// Parse a stream, collapsing every failure into `None`
    fn from_stream<R: Read + Seek>(stream: R) -> Option<Self> {
        Self::parse_stream(stream).ok()
    }

    /// Parse a file, collapsing every failure into `None`
    fn from_file(path: impl AsRef<Path>) -> Option<Self> {
        Self::parse_file(path).ok()
    }
}

fn walk<F: Format, R: Read + Seek>(cursor: &mut Cursor<R>, config: &ReaderConfig) -> ParseResult<F> {
    if cursor.is_empty() {
        return Err(ParseError::EmptySource);
    }
    if cursor.is_at_end() {
        return Err(ParseError::OffsetOutOfRange {
            offset: cursor.position(),
            length: cursor.len(),
        });
    }
    if let Some(limit) = config.max_source_length
        && cursor.len() > limit
    {
        return Err(ParseError::SourceTooLarge {
            length: cursor.len(),
            limit,
        });
    }

    let start = cursor.position();
    match F::read(cursor, config) {
        Ok(document) => {
            trace!(
                format = F::NAME,
                start,
                end = cursor.position(),
                "document parsed"
            );
            Ok(document)
        }
        Err(err) => {
            debug!(
                format = F::NAME,
                start,
                position = cursor.position(),
                error = %err,
                "document rejected"
            );
            Err(err)
        }
    }
}
