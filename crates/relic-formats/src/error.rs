//! Error types for format writers

use thiserror::Error;

/// Errors that can occur when serializing a document
#[derive(Error, Debug)]
pub enum BuildError {
    /// A value does not fit the width of its on-disk field
    #[error("{field} value {value} does not fit its on-disk field")]
    FieldOverflow {
        /// Field name
        field: &'static str,
        /// Offending value
        value: u64,
    },

    /// Records would overlap or point into the header area
    #[error("invalid layout: {0}")]
    InvalidLayout(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// `BinRW` writing error
    #[error("Binary format error: {0}")]
    BinRw(#[from] binrw::Error),
}

/// Type alias for writer results
pub type BuildResult<T> = std::result::Result<T, BuildError>;

/// Narrow a length to an on-disk field, reporting overflow by name
pub(crate) fn narrow<T: TryFrom<u64>>(field: &'static str, value: u64) -> BuildResult<T> {
    T::try_from(value).map_err(|_| BuildError::FieldOverflow { field, value })
}
