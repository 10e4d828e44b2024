//! Error types for cursor reads and format walkers

use thiserror::Error;

/// Errors raised by individual cursor operations
///
/// A failed read never moves the cursor, so callers may inspect
/// [`Cursor::position`](crate::Cursor::position) after any of these and see
/// the offset of the record that could not be decoded.
#[derive(Error, Debug)]
pub enum ReadError {
    /// Fewer bytes remain than the read requires
    #[error("unexpected end of data at offset {offset}: needed {needed} bytes, {available} available")]
    UnexpectedEof {
        /// Position of the attempted read
        offset: u64,
        /// Bytes the read required
        needed: u64,
        /// Bytes that were left in the source
        available: u64,
    },

    /// A seek target lies outside `[0, length]`
    #[error("seek target {target} outside of source bounds [0, {length}]")]
    SeekOutOfBounds {
        /// Requested position, relative to the start of the view
        target: i128,
        /// Length of the view
        length: u64,
    },

    /// A binrw-derived record ran past the end of data
    #[error("record at offset {offset} runs past end of data")]
    Truncated {
        /// Position the record started at
        offset: u64,
    },

    /// A binrw-derived record rejected its input (assertion or magic failure)
    #[error("binary record rejected: {0}")]
    Decode(binrw::Error),

    /// The underlying device failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReadError {
    /// Whether this error originates from the device rather than the data
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

/// Errors raised by a walker while building a document
#[derive(Error, Debug)]
pub enum ParseError {
    /// The source holds no bytes
    #[error("source is empty")]
    EmptySource,

    /// A start offset or offset field does not lie inside the source
    #[error("offset {offset} outside of source length {length}")]
    OffsetOutOfRange {
        /// Requested offset
        offset: u64,
        /// Length of the source
        length: u64,
    },

    /// The source exceeds the configured size limit
    #[error("source length {length} exceeds configured limit {limit}")]
    SourceTooLarge {
        /// Length of the source
        length: u64,
        /// Configured maximum
        limit: u64,
    },

    /// The magic signature does not match
    #[error("invalid {format} signature: expected {expected}, found {found}")]
    InvalidSignature {
        /// Format that was being parsed
        format: &'static str,
        /// Hex rendering of the accepted signature(s)
        expected: String,
        /// Hex rendering of the bytes that were read
        found: String,
    },

    /// The header declares a version this walker does not understand
    #[error("unsupported {format} version: {version}")]
    UnsupportedVersion {
        /// Format that was being parsed
        format: &'static str,
        /// Declared version
        version: u64,
    },

    /// A field holds a structurally impossible value
    #[error("invalid value for {field}: {value}")]
    InvalidField {
        /// Field name
        field: &'static str,
        /// Offending value
        value: i64,
    },

    /// A declared count or size cannot be satisfied by the source
    #[error("{field} of {count} exceeds limit of {limit}")]
    CountOutOfRange {
        /// Field name
        field: &'static str,
        /// Declared count or size
        count: u64,
        /// Largest value the source or configuration allows
        limit: u64,
    },

    /// A mandatory variant discriminant has no known shape
    #[error("unknown discriminant for {field}: {value:#x}")]
    UnknownDiscriminant {
        /// Field name
        field: &'static str,
        /// Discriminant value
        value: u64,
    },

    /// A cursor operation failed
    #[error(transparent)]
    Read(#[from] ReadError),

    /// Opening or positioning the source failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ParseError {
    /// Whether this error is a device failure
    ///
    /// Everything else means "this is not a valid file of the format".
    pub fn is_io(&self) -> bool {
        match self {
            Self::Io(_) => true,
            Self::Read(err) => err.is_io(),
            _ => false,
        }
    }

    /// Whether this error describes malformed input
    pub fn is_malformed(&self) -> bool {
        !self.is_io()
    }

    /// Build an [`InvalidSignature`](Self::InvalidSignature) from raw bytes
    pub fn signature(format: &'static str, expected: &[u8], found: &[u8]) -> Self {
        Self::InvalidSignature {
            format,
            expected: hex::encode(expected),
            found: hex::encode(found),
        }
    }
}

/// Type alias for cursor operation results
pub type ReadResult<T> = std::result::Result<T, ReadError>;

/// Type alias for walker results
pub type ParseResult<T> = std::result::Result<T, ParseError>;

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_io_classification() {
        let io = ParseError::Io(std::io::Error::other("disk gone"));
        assert!(io.is_io());
        assert!(!io.is_malformed());

        let nested = ParseError::Read(ReadError::Io(std::io::Error::other("disk gone")));
        assert!(nested.is_io());

        let eof = ParseError::Read(ReadError::UnexpectedEof {
            offset: 4,
            needed: 4,
            available: 1,
        });
        assert!(eof.is_malformed());
        assert!(ParseError::EmptySource.is_malformed());
    }

    #[test]
    fn test_signature_rendering() {
        let err = ParseError::signature("BFPK", b"BFPK", &[0xC2, b'F', b'P', b'K']);
        assert_eq!(
            err.to_string(),
            "invalid BFPK signature: expected 4246504b, found c246504b"
        );
    }
}
