//! Windows resource payload support
//!
//! These walkers decode the data of individual resources as found in the
//! resource section of a portable executable. Each resource is a separate
//! document: alignment padding inside a resource is counted from the start
//! of that resource, not from the start of the file it was taken from.
//!
//! | resource | document |
//! |---|---|
//! | `RT_DIALOG` | [`DialogTemplate`] |
//! | `RT_MENU` | [`Menu`] |
//! | `RT_VERSION` | [`VersionInfo`] |
//! | `RT_STRING` | [`StringTable`] |
//! | `RT_MESSAGETABLE` | [`MessageTable`] |
//! | `RT_ACCELERATOR` | [`AcceleratorTable`] |
//!
//! ```rust
//! use relic_formats::pe_resource::AcceleratorTable;
//! use relic_io::Format;
//!
//! // Ctrl+S bound to command 100, last entry of the table
//! let data = [0x89, 0x00, 0x53, 0x00, 0x64, 0x00, 0x00, 0x00];
//! let table = AcceleratorTable::from_bytes(&data, 0).expect("valid table");
//! assert_eq!(table.entries[0].id, 100);
//! ```

mod accelerator;
mod dialog;
mod menu;
mod message;
mod strings;
mod version;

pub use accelerator::{AcceleratorEntry, AcceleratorTable};
pub use dialog::{
    DS_SETFONT, DialogFont, DialogItem, DialogShape, DialogTemplate, ExtendedDialogFields,
    FontStyle,
};
pub use menu::{Menu, MenuItem, MF_END, MF_POPUP};
pub use message::{MessageBlock, MessageEntry, MessageTable};
pub use strings::{STRINGS_PER_BLOCK, StringTable};
pub use version::{
    FIXED_FILE_INFO_SIGNATURE, FixedFileInfo, StringFileInfo, StringTableBlock, VarFileInfo,
    VersionInfo,
};

use relic_io::{Cursor, Encoding, NameOrOrdinal, ParseResult};
use std::io::{Read, Seek};

/// Read a name-or-ordinal field and skip to the next word boundary
fn read_name<R: Read + Seek>(cursor: &mut Cursor<R>, origin: u64) -> ParseResult<NameOrOrdinal> {
    let field = NameOrOrdinal::read(cursor)?;
    cursor.align_from(2, origin)?;
    Ok(field)
}

/// Read a zero-terminated UTF-16 string and skip to the next word boundary
fn read_text<R: Read + Seek>(cursor: &mut Cursor<R>, origin: u64) -> ParseResult<String> {
    let text = cursor.read_cstring(Encoding::Utf16Le)?;
    cursor.align_from(2, origin)?;
    Ok(text)
}

/// Encode a zero-terminated UTF-16 string, used by tests
#[cfg(test)]
fn utf16z(text: &str) -> Vec<u8> {
    let mut out = Encoding::Utf16Le.encode(text);
    out.extend_from_slice(&[0, 0]);
    out
}

/// Pad a test buffer to a four-byte boundary
#[cfg(test)]
fn pad4(data: &mut Vec<u8>) {
    while data.len() % 4 != 0 {
        data.push(0);
    }
}
