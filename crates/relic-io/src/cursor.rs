//! Position-tracking reader over a bounded view of a byte source
//!
//! A [`Cursor`] owns its source for the duration of one parse. It keeps the
//! logical position itself and only talks to the source through `Read` and
//! `Seek`, which lets the same walker run over an in-memory buffer or a file.
//!
//! Every operation either succeeds and advances by exactly the number of bytes
//! consumed, or fails and leaves the position where it was.

use crate::error::{ReadError, ReadResult};
use binrw::{BinRead, Endian};
use std::io::{self, Read, Seek, SeekFrom};

/// Text encodings used by string fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// 7-bit ASCII; bytes above 0x7F decode to `?`
    Ascii,
    /// UTF-8 with lossy replacement
    Utf8,
    /// UTF-16 little-endian code units with lossy replacement
    Utf16Le,
}

impl Encoding {
    /// Width of one code unit (and of the terminator) in bytes
    pub const fn unit_width(self) -> usize {
        match self {
            Self::Ascii | Self::Utf8 => 1,
            Self::Utf16Le => 2,
        }
    }

    /// Decode raw bytes, dropping a trailing partial code unit
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Self::Ascii => bytes
                .iter()
                .map(|&b| if b.is_ascii() { b as char } else { '?' })
                .collect(),
            Self::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Self::Utf16Le => {
                let units = bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_le_bytes([pair[0], pair[1]]));
                char::decode_utf16(units)
                    .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
                    .collect()
            }
        }
    }

    /// Encode a string, used by writers
    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            Self::Ascii => text
                .chars()
                .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
                .collect(),
            Self::Utf8 => text.as_bytes().to_vec(),
            Self::Utf16Le => text.encode_utf16().flat_map(u16::to_le_bytes).collect(),
        }
    }
}

/// Cursor over an in-memory buffer
pub type SliceCursor<'a> = Cursor<io::Cursor<&'a [u8]>>;

macro_rules! primitive_reads {
    ($($(#[$doc:meta])* $name:ident => $ty:ty, $conv:ident;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(&mut self) -> ReadResult<$ty> {
                self.read_array().map(<$ty>::$conv)
            }
        )*
    };
}

/// Bounds-checked sequential reader
///
/// Positions are relative to the start of the view. For a buffer opened with
/// [`Cursor::from_bytes`] the view begins at the requested offset; for a
/// stream opened with [`Cursor::new`] the view is the whole stream and the
/// cursor starts at the stream's current position.
#[derive(Debug)]
pub struct Cursor<R> {
    inner: R,
    len: u64,
    pos: u64,
}

impl<'a> Cursor<io::Cursor<&'a [u8]>> {
    /// View `data[offset..]` as a fresh source
    pub fn from_bytes(data: &'a [u8], offset: usize) -> ReadResult<Self> {
        let Some(view) = data.get(offset..) else {
            return Err(ReadError::SeekOutOfBounds {
                target: offset as i128,
                length: data.len() as u64,
            });
        };
        Ok(Self::over(view))
    }

    /// View a whole buffer
    pub fn over(data: &'a [u8]) -> Self {
        Self {
            inner: io::Cursor::new(data),
            len: data.len() as u64,
            pos: 0,
        }
    }
}

impl<R: Read + Seek> Cursor<R> {
    /// Wrap a seekable stream, starting at its current position
    pub fn new(mut inner: R) -> ReadResult<Self> {
        let pos = inner.stream_position()?;
        let len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(pos))?;
        if pos > len {
            return Err(ReadError::SeekOutOfBounds {
                target: i128::from(pos),
                length: len,
            });
        }
        Ok(Self {
            inner,
            len,
            pos,
        })
    }

    /// Release the underlying source
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Current position relative to the start of the view
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Length of the view
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether the view holds no bytes at all
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes left between the position and the end of the view
    pub fn remaining(&self) -> u64 {
        self.len - self.pos
    }

    /// Whether every byte has been consumed
    pub fn is_at_end(&self) -> bool {
        self.pos == self.len
    }

    fn ensure(&self, needed: u64) -> ReadResult<()> {
        let available = self.remaining();
        if needed > available {
            return Err(ReadError::UnexpectedEof {
                offset: self.pos,
                needed,
                available,
            });
        }
        Ok(())
    }

    /// Re-synchronise the source with the logical position
    fn restore(&mut self) -> ReadResult<()> {
        self.inner.seek(SeekFrom::Start(self.pos))?;
        Ok(())
    }

    fn fill(&mut self, buf: &mut [u8]) -> ReadResult<()> {
        let needed = buf.len() as u64;
        self.ensure(needed)?;
        if let Err(err) = self.inner.read_exact(buf) {
            self.restore()?;
            return Err(if err.kind() == io::ErrorKind::UnexpectedEof {
                ReadError::UnexpectedEof {
                    offset: self.pos,
                    needed,
                    available: self.remaining(),
                }
            } else {
                ReadError::Io(err)
            });
        }
        self.pos += needed;
        Ok(())
    }

    /// Read exactly `N` bytes
    pub fn read_array<const N: usize>(&mut self) -> ReadResult<[u8; N]> {
        let mut buf = [0u8; N];
        self.fill(&mut buf)?;
        Ok(buf)
    }

    /// Read exactly `n` bytes; `n == 0` yields an empty vector
    ///
    /// The length is checked against the remaining bytes before anything is
    /// allocated, so a corrupt size field cannot trigger a huge allocation.
    pub fn read_bytes(&mut self, n: usize) -> ReadResult<Vec<u8>> {
        if n == 0 {
            return Ok(Vec::new());
        }
        self.ensure(n as u64)?;
        let mut buf = vec![0u8; n];
        self.fill(&mut buf)?;
        Ok(buf)
    }

    /// Read everything from the position to the end of the view
    pub fn read_to_end(&mut self) -> ReadResult<Vec<u8>> {
        self.read_bytes(self.remaining() as usize)
    }

    /// Read a single byte
    pub fn read_u8(&mut self) -> ReadResult<u8> {
        self.read_array::<1>().map(|[b]| b)
    }

    /// Read a single signed byte
    pub fn read_i8(&mut self) -> ReadResult<i8> {
        self.read_array::<1>().map(i8::from_le_bytes)
    }

    primitive_reads! {
        /// Read a little-endian `u16`
        read_u16_le => u16, from_le_bytes;
        /// Read a big-endian `u16`
        read_u16_be => u16, from_be_bytes;
        /// Read a little-endian `i16`
        read_i16_le => i16, from_le_bytes;
        /// Read a little-endian `u32`
        read_u32_le => u32, from_le_bytes;
        /// Read a big-endian `u32`
        read_u32_be => u32, from_be_bytes;
        /// Read a little-endian `i32`
        read_i32_le => i32, from_le_bytes;
        /// Read a little-endian `u64`
        read_u64_le => u64, from_le_bytes;
        /// Read a big-endian `u64`
        read_u64_be => u64, from_be_bytes;
    }

    /// Read a big-endian 24-bit unsigned integer
    pub fn read_u24_be(&mut self) -> ReadResult<u32> {
        let [a, b, c] = self.read_array()?;
        Ok(u32::from_be_bytes([0, a, b, c]))
    }

    /// Read a little-endian 24-bit unsigned integer
    pub fn read_u24_le(&mut self) -> ReadResult<u32> {
        let [a, b, c] = self.read_array()?;
        Ok(u32::from_le_bytes([a, b, c, 0]))
    }

    /// Read `len` bytes and decode them
    pub fn read_string(&mut self, len: usize, encoding: Encoding) -> ReadResult<String> {
        let bytes = self.read_bytes(len)?;
        Ok(encoding.decode(&bytes))
    }

    /// Read a fixed-size field and cut it at the first terminator
    pub fn read_fixed_string(&mut self, len: usize, encoding: Encoding) -> ReadResult<String> {
        let bytes = self.read_bytes(len)?;
        let width = encoding.unit_width();
        let end = bytes
            .chunks_exact(width)
            .position(|unit| unit.iter().all(|&b| b == 0))
            .map_or(bytes.len(), |units| units * width);
        Ok(encoding.decode(&bytes[..end]))
    }

    /// Read until a zero code unit or the end of data
    ///
    /// The terminator is consumed but not returned. A trailing partial code
    /// unit is left unread.
    pub fn read_cstring(&mut self, encoding: Encoding) -> ReadResult<String> {
        let width = encoding.unit_width() as u64;
        self.atomic(|c| {
            let mut bytes = Vec::new();
            while c.remaining() >= width {
                if width == 1 {
                    let byte = c.read_u8()?;
                    if byte == 0 {
                        break;
                    }
                    bytes.push(byte);
                } else {
                    let unit = c.read_array::<2>()?;
                    if unit == [0, 0] {
                        break;
                    }
                    bytes.extend_from_slice(&unit);
                }
            }
            Ok(encoding.decode(&bytes))
        })
    }

    /// Read a binrw record with explicit endianness and arguments
    pub fn read_type<T: BinRead>(&mut self, endian: Endian, args: T::Args<'_>) -> ReadResult<T> {
        match T::read_options(&mut self.inner, endian, args) {
            Ok(value) => {
                let end = self.inner.stream_position()?;
                if end > self.len {
                    self.restore()?;
                    return Err(ReadError::Truncated { offset: self.pos });
                }
                self.pos = end;
                Ok(value)
            }
            Err(err) => {
                self.restore()?;
                Err(if err.is_eof() {
                    ReadError::Truncated { offset: self.pos }
                } else {
                    match err {
                        binrw::Error::Io(io) => ReadError::Io(io),
                        other => ReadError::Decode(other),
                    }
                })
            }
        }
    }

    /// Read a little-endian binrw record that takes no arguments
    pub fn read_le<T>(&mut self) -> ReadResult<T>
    where
        T: BinRead,
        for<'a> T::Args<'a>: Default,
    {
        self.read_type(Endian::Little, Default::default())
    }

    /// Read a big-endian binrw record that takes no arguments
    pub fn read_be<T>(&mut self) -> ReadResult<T>
    where
        T: BinRead,
        for<'a> T::Args<'a>: Default,
    {
        self.read_type(Endian::Big, Default::default())
    }

    /// Move within the view
    ///
    /// Targets outside `[0, len]` are rejected without moving.
    pub fn seek(&mut self, target: SeekFrom) -> ReadResult<u64> {
        let target = match target {
            SeekFrom::Start(n) => i128::from(n),
            SeekFrom::Current(delta) => i128::from(self.pos) + i128::from(delta),
            SeekFrom::End(delta) => i128::from(self.len) + i128::from(delta),
        };
        if target < 0 || target > i128::from(self.len) {
            return Err(ReadError::SeekOutOfBounds {
                target,
                length: self.len,
            });
        }
        let target = target as u64;
        self.inner.seek(SeekFrom::Start(target))?;
        self.pos = target;
        Ok(target)
    }

    /// Jump to an absolute position within the view
    pub fn set_position(&mut self, pos: u64) -> ReadResult<()> {
        self.seek(SeekFrom::Start(pos)).map(|_| ())
    }

    /// Discard `n` bytes
    pub fn skip(&mut self, n: u64) -> ReadResult<()> {
        self.ensure(n)?;
        self.set_position(self.pos + n)
    }

    /// Advance to the next multiple of `alignment` from the start of the view
    pub fn align(&mut self, alignment: u64) -> ReadResult<()> {
        self.align_from(alignment, 0)
    }

    /// Advance to the next multiple of `alignment` measured from `origin`
    ///
    /// Never moves past the end of data: if fewer padding bytes remain than
    /// required, the cursor stops at the end.
    pub fn align_from(&mut self, alignment: u64, origin: u64) -> ReadResult<()> {
        if alignment <= 1 {
            return Ok(());
        }
        let misalignment = self.pos.saturating_sub(origin) % alignment;
        if misalignment == 0 {
            return Ok(());
        }
        let padding = (alignment - misalignment).min(self.remaining());
        self.skip(padding)
    }

    fn rewind_to(&mut self, mark: u64) -> ReadResult<()> {
        if self.pos != mark {
            self.inner.seek(SeekFrom::Start(mark))?;
            self.pos = mark;
        }
        Ok(())
    }

    /// Run `f` and rewind if it fails
    ///
    /// Groups several reads into one that either fully succeeds or leaves the
    /// position untouched.
    pub fn atomic<T, E>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, E>) -> Result<T, E>
    where
        E: From<ReadError>,
    {
        let mark = self.pos;
        let result = f(self);
        if result.is_err() {
            self.rewind_to(mark)?;
        }
        result
    }

    /// Run `f` and always rewind afterwards
    pub fn peek<T, E>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, E>) -> Result<T, E>
    where
        E: From<ReadError>,
    {
        let mark = self.pos;
        let result = f(self);
        self.rewind_to(mark)?;
        result
    }

    /// Read a byte without consuming it
    pub fn peek_u8(&mut self) -> ReadResult<u8> {
        self.peek(Self::read_u8)
    }

    /// Read a little-endian `u16` without consuming it
    pub fn peek_u16_le(&mut self) -> ReadResult<u16> {
        self.peek(Self::read_u16_le)
    }

    /// Read a little-endian `u32` without consuming it
    pub fn peek_u32_le(&mut self) -> ReadResult<u32> {
        self.peek(Self::read_u32_le)
    }

    /// Read `N` bytes without consuming them
    pub fn peek_array<const N: usize>(&mut self) -> ReadResult<[u8; N]> {
        self.peek(Self::read_array::<N>)
    }

    /// Seek to `offset`, run `f`, then return to the current position
    ///
    /// The position is restored whether `f` succeeds or fails, so reads made
    /// elsewhere in the source never leak into the sequential walk.
    pub fn at<T, E>(&mut self, offset: u64, f: impl FnOnce(&mut Self) -> Result<T, E>) -> Result<T, E>
    where
        E: From<ReadError>,
    {
        let mark = self.pos;
        self.set_position(offset)?;
        let result = f(self);
        self.rewind_to(mark)?;
        result
    }
}
