//! Walkers and writers for legacy archive, executable and disc image formats
//!
#![allow(clippy::cast_possible_truncation)] // Intentional for binary format parsing
#![allow(clippy::cast_possible_wrap)] // Intentional for binary operations
#![allow(clippy::cast_sign_loss)] // Signed on-disk fields checked before use
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::doc_markdown)] // Format names don't need backticks
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
#![allow(clippy::similar_names)] // Domain-specific naming patterns
#![allow(clippy::return_self_not_must_use)] // Builder patterns
#![allow(clippy::missing_errors_doc)] // Every walker fails the same way
#![allow(clippy::struct_field_names)] // Field names follow the on-disk layouts
//! Every format in this crate is a [`relic_io::Format`]: one `read` walks the
//! structure from the cursor and the buffer, stream and path entry points
//! come for free. Malformed input yields `None` from the `from_*` entry
//! points; `parse_*` keeps the error so I/O failures stay distinguishable.
//!
//! # Supported Formats
//!
//! - **BFPK**: simple packed archives with a flat file table
//! - **PAK**: Half-Life packages with a fixed 64-byte directory entry
//! - **Cabinet**: Microsoft cabinet headers, folders and file entries
//! - **NCF**: Half-Life no-cache file headers and directory trees
//! - **Nintendo 3DS**: NCSD cart images, NCCH partitions, ExeFS and RomFS headers
//! - **BSP**: Half-Life 1 level headers and the texture lump
//! - **VBSP**: Source engine level headers
//! - **Quantum**: Quantum archive file lists
//! - **BD+**: content code (SVM) headers
//! - **AACS**: media key blocks
//! - **MZ**: MS-DOS executable headers and relocation tables
//! - **PE resources**: accelerator, dialog, menu, message, string and version resources
//! - **Catalogs**: SMDB and RomCenter text catalogs
//!
//! BFPK, PAK and MZ also have builders whose output reads back to the same
//! structure.
//!
//! # Example
//!
//! ```rust
//! use relic_formats::pak::{Package, PackageBuilder};
//! use relic_io::Format;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let package = PackageBuilder::new().add_item("maps/c1a0.bsp", 16).build()?;
//! let bytes = package.build()?;
//! assert_eq!(Package::from_bytes(&bytes, 0), Some(package));
//!
//! assert!(Package::from_bytes(&[0xFF; 1024], 0).is_none());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

/// AACS media key blocks
pub mod aacs;
/// BD+ content code headers
pub mod bdplus;
/// BFPK packed archives
///
/// A BFPK archive is a 12-byte header followed by a table of name, size and
/// offset entries. Both reading and building are supported.
pub mod bfpk;
/// Half-Life 1 level files
pub mod bsp;
/// Microsoft cabinet files
pub mod cabinet;
/// Text catalogs (SMDB and RomCenter)
pub mod catalog;
/// Errors raised while building output
pub mod error;
/// MS-DOS executables
pub mod msdos;
/// Nintendo 3DS cart images
pub mod n3ds;
/// Half-Life no-cache files
pub mod ncf;
/// Half-Life packages
pub mod pak;
/// Windows resource payloads
pub mod pe_resource;
/// Quantum archives
pub mod quantum;
/// Source engine level files
pub mod vbsp;

pub use error::{BuildError, BuildResult};
