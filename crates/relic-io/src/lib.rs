//! Bounds-checked reading primitives for legacy binary formats
//!
#![allow(clippy::cast_possible_truncation)] // Intentional for binary format parsing
#![allow(clippy::cast_possible_wrap)] // Intentional for binary operations
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
#![allow(clippy::return_self_not_must_use)] // Builder patterns
//! This crate holds the pieces every format walker in the workspace is built
//! from:
//!
//! - **Cursor**: a position-tracking reader over a buffer or seekable stream.
//!   Reads are bounds-checked and never advance partially on failure.
//! - **Variants**: peek-then-commit decoding of records whose shape depends on
//!   a sentinel, version word or type byte, including the common
//!   absent / ordinal / string field.
//! - **Gate**: signature, count and offset checks applied before a value is
//!   used to allocate or seek.
//! - **Tables**: exactly-N record loops sized from a checked count.
//! - **Format**: one `read` per format, with buffer, stream and path entry
//!   points derived from it.
//! - **Snapshot**: immutable read-back access to the source after parsing.
//!
//! # Example
//!
//! ```rust
//! use relic_io::{Cursor, Format, ParseResult, ReaderConfig, gate};
//! use std::io::{Read, Seek};
//!
//! struct Tiny {
//!     value: u32,
//! }
//!
//! impl Format for Tiny {
//!     const NAME: &'static str = "tiny";
//!
//!     fn read<R: Read + Seek>(cursor: &mut Cursor<R>, _config: &ReaderConfig) -> ParseResult<Self> {
//!         gate::expect_signature(Self::NAME, &cursor.read_array::<2>()?, b"TY")?;
//!         Ok(Self { value: cursor.read_u32_le()? })
//!     }
//! }
//!
//! assert_eq!(Tiny::from_bytes(b"TY\x2a\0\0\0", 0).map(|t| t.value), Some(42));
//! assert!(Tiny::from_bytes(&[0xFF; 1024], 0).is_none());
//! ```

#![warn(missing_docs)]

/// Reader limits shared by all walkers
pub mod config;
/// Position-tracking cursor and string encodings
pub mod cursor;
/// Error types and their malformed / I/O classification
pub mod error;
/// Walker trait and the derived entry points
pub mod format;
/// Signature, count and offset checks
pub mod gate;
/// Read-back access to parsed sources
pub mod snapshot;
/// Count-driven record tables
pub mod table;
/// Sentinel and discriminant-driven decoding
pub mod variant;

pub use config::ReaderConfig;
pub use cursor::{Cursor, Encoding, SliceCursor};
pub use error::{ParseError, ParseResult, ReadError, ReadResult};
pub use format::Format;
pub use snapshot::Snapshot;
pub use table::{read_table, read_u32_table};
pub use variant::{NameOrOrdinal, Sentinel, Variant, read_var_length};
