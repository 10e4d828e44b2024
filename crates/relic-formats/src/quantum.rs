//! Quantum archive (DS) support
//!
//! A Quantum archive is an 8-byte header, a list of file descriptors and the
//! compressed stream. Descriptor names and comments carry one- or two-byte
//! length prefixes; minor version 22 appends an extra word to each
//! descriptor.

use binrw::BinRead;
use relic_io::{
    Cursor, Encoding, Format, ParseResult, ReaderConfig, gate, read_table, read_var_length,
};
use std::io::{Read, Seek};
use tracing::trace;

/// File signature
pub const SIGNATURE: [u8; 2] = *b"DS";

/// Minor version whose descriptors carry a trailing word
pub const EXTENDED_MINOR_VERSION: u8 = 22;

/// Archive header (8 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead)]
#[br(little, magic = b"DS")]
pub struct QuantumHeader {
    /// Major version
    pub major_version: u8,
    /// Minor version
    pub minor_version: u8,
    /// Number of file descriptors
    pub file_count: u16,
    /// Compression table size
    pub table_size: u8,
    /// Compression flags
    pub compression_flags: u8,
}

/// One file of the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    /// File name
    pub name: String,
    /// Comment
    pub comment: String,
    /// Size after decompression
    pub expanded_size: u32,
    /// DOS time
    pub time: u16,
    /// DOS date
    pub date: u16,
    /// Trailing word written by minor version 22
    pub extra: Option<u16>,
}

impl FileDescriptor {
    /// Smallest encoded descriptor
    pub const MIN_SIZE: u64 = 10;

    /// Read a descriptor for an archive of the given minor version
    pub fn read<R: Read + Seek>(cursor: &mut Cursor<R>, minor_version: u8) -> ParseResult<Self> {
        cursor.atomic(|c| {
            let name_len = read_var_length(c)?;
            let name = c.read_string(usize::from(name_len), Encoding::Ascii)?;
            let comment_len = read_var_length(c)?;
            let comment = c.read_string(usize::from(comment_len), Encoding::Ascii)?;
            let expanded_size = c.read_u32_le()?;
            let time = c.read_u16_le()?;
            let date = c.read_u16_le()?;
            let extra = if minor_version == EXTENDED_MINOR_VERSION {
                Some(c.read_u16_le()?)
            } else {
                None
            };
            Ok(Self {
                name,
                comment,
                expanded_size,
                time,
                date,
                extra,
            })
        })
    }
}

/// Complete archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quantum {
    /// Archive header
    pub header: QuantumHeader,
    /// File descriptors
    pub files: Vec<FileDescriptor>,
    /// Offset of the compressed stream from the start of the archive
    pub compressed_data_offset: u64,
}

impl Format for Quantum {
    const NAME: &'static str = "Quantum";

    fn read<R: Read + Seek>(cursor: &mut Cursor<R>, config: &ReaderConfig) -> ParseResult<Self> {
        let origin = cursor.position();
        gate::expect_signature(Self::NAME, &cursor.peek_array::<2>()?, &SIGNATURE)?;
        let header: QuantumHeader = cursor.read_le()?;

        let files = read_table(
            cursor,
            config,
            "file_count",
            u64::from(header.file_count),
            FileDescriptor::MIN_SIZE,
            |c| FileDescriptor::read(c, header.minor_version),
        )?;
        let compressed_data_offset = cursor.position() - origin;
        trace!(
            version = format_args!("{}.{}", header.major_version, header.minor_version),
            files = files.len(),
            compressed_data_offset,
            "Quantum file list read"
        );

        Ok(Self {
            header,
            files,
            compressed_data_offset,
        })
    }
}

impl Quantum {
    /// Sum of all expanded file sizes
    pub fn total_expanded_size(&self) -> u64 {
        self.files.iter().map(|file| u64::from(file.expanded_size)).sum()
    }
}
