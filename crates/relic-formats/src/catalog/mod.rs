//! Line-oriented metadata catalogs
//!
//! Unlike the binary walkers, a catalog line that cannot be understood does
//! not fail the document: the next line is a natural resynchronisation
//! point, so such lines are kept verbatim in an `additional` list. The text
//! as a whole must still be UTF-8 without NUL bytes, which keeps binary
//! input from being taken for an empty catalog.

mod romcenter;
mod smdb;

pub use romcenter::{Credits, DatSection, Emulator, Games, RomCenterCatalog, RomEntry};
pub use smdb::{SmdbCatalog, SmdbRow};

use relic_io::{Cursor, ParseError, ParseResult};
use std::io::{Read, Seek};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Read the rest of the source as catalog text
fn read_text<R: Read + Seek>(cursor: &mut Cursor<R>) -> ParseResult<String> {
    let bytes = cursor.read_to_end()?;
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(&bytes);
    let text = std::str::from_utf8(body).map_err(|err| ParseError::InvalidField {
        field: "utf8_text",
        value: err.valid_up_to() as i64,
    })?;
    if let Some(position) = text.find('\0') {
        return Err(ParseError::InvalidField {
            field: "nul_byte",
            value: position as i64,
        });
    }
    Ok(text.to_string())
}
