//! Menu templates
//!
//! The first word of a menu resource is its version: 0 for a standard
//! `MENUITEMTEMPLATE` list, 1 for a `MENUEX_TEMPLATE`. Items form a tree;
//! a popup item is followed by its children and every level ends with an
//! item carrying the end flag.

use super::read_text;
use relic_io::{Cursor, Format, ParseError, ParseResult, ReadResult, ReaderConfig, Variant};
use std::io::{Read, Seek};

/// Standard item opens a submenu
pub const MF_POPUP: u16 = 0x0010;
/// Last item of its level
pub const MF_END: u16 = 0x0080;

/// Extended item opens a submenu
const EXTENDED_POPUP: u16 = 0x0001;

const STANDARD_VERSION: u16 = 0;
const EXTENDED_VERSION: u16 = 1;

/// Deepest submenu nesting accepted
const MAX_DEPTH: u32 = 32;

/// Fields only present in extended items
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtendedItemFields {
    /// Item type flags
    pub item_type: u32,
    /// Item state flags
    pub state: u32,
    /// Context help identifier, popups only
    pub help_id: Option<u32>,
}

/// One menu entry and its submenu
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    /// Option flags (standard) or item flags (extended)
    pub flags: u16,
    /// Command identifier, absent for standard popups
    pub id: Option<u32>,
    /// Extended fields
    pub extended: Option<ExtendedItemFields>,
    /// Item text
    pub text: String,
    /// Submenu items
    pub children: Vec<MenuItem>,
}

impl MenuItem {
    /// Whether the item opens a submenu
    pub fn is_popup(&self) -> bool {
        let popup = if self.extended.is_some() {
            EXTENDED_POPUP
        } else {
            MF_POPUP
        };
        self.flags & popup != 0
    }

    /// Whether the item closes its level
    pub fn is_last(&self) -> bool {
        self.flags & MF_END != 0
    }
}

/// Complete menu template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Menu {
    /// Template version
    pub version: u16,
    /// Context help identifier of an extended menu
    pub help_id: Option<u32>,
    /// Top-level items
    pub items: Vec<MenuItem>,
}

impl Variant for Menu {
    type Discriminant = u16;

    fn peek_discriminant<R: Read + Seek>(cursor: &mut Cursor<R>) -> ReadResult<u16> {
        cursor.peek_u16_le()
    }

    fn decode<R: Read + Seek>(cursor: &mut Cursor<R>, version: u16) -> ParseResult<Self> {
        let origin = cursor.position();
        match version {
            STANDARD_VERSION => {
                cursor.skip(2)?;
                let header_size = cursor.read_u16_le()?;
                cursor.skip(u64::from(header_size))?;
                Ok(Self {
                    version,
                    help_id: None,
                    items: read_level(cursor, origin, false, 0)?,
                })
            }
            EXTENDED_VERSION => {
                cursor.skip(2)?;
                let offset = cursor.read_u16_le()?;
                let items_start = cursor.position() + u64::from(offset);
                let help_id = cursor.read_u32_le()?;
                cursor.set_position(items_start)?;
                Ok(Self {
                    version,
                    help_id: Some(help_id),
                    items: read_level(cursor, origin, true, 0)?,
                })
            }
            other => Err(ParseError::UnsupportedVersion {
                format: Self::NAME,
                version: u64::from(other),
            }),
        }
    }
}

impl Format for Menu {
    const NAME: &'static str = "RT_MENU";

    fn read<R: Read + Seek>(cursor: &mut Cursor<R>, _config: &ReaderConfig) -> ParseResult<Self> {
        <Self as Variant>::read(cursor)
    }
}

impl Menu {
    /// Every item in depth-first order
    pub fn walk(&self) -> Vec<&MenuItem> {
        fn visit<'a>(items: &'a [MenuItem], out: &mut Vec<&'a MenuItem>) {
            for item in items {
                out.push(item);
                visit(&item.children, out);
            }
        }
        let mut out = Vec::new();
        visit(&self.items, &mut out);
        out
    }

    /// Item with command identifier `id`, searched depth-first
    pub fn find(&self, id: u32) -> Option<&MenuItem> {
        self.walk().into_iter().find(|item| item.id == Some(id))
    }
}

/// Read items until one closes the level
///
/// The top level may also end with the data.
fn read_level<R: Read + Seek>(
    cursor: &mut Cursor<R>,
    origin: u64,
    extended: bool,
    depth: u32,
) -> ParseResult<Vec<MenuItem>> {
    if depth > MAX_DEPTH {
        return Err(ParseError::InvalidField {
            field: "menu_depth",
            value: i64::from(depth),
        });
    }

    let mut items = Vec::new();
    loop {
        if depth == 0 && cursor.is_at_end() {
            break;
        }
        let mut item = if extended {
            read_extended_item(cursor, origin)?
        } else {
            read_standard_item(cursor, origin)?
        };
        if item.is_popup() {
            item.children = read_level(cursor, origin, extended, depth + 1)?;
        }
        let last = item.is_last();
        items.push(item);
        if last {
            break;
        }
    }
    Ok(items)
}

fn read_standard_item<R: Read + Seek>(cursor: &mut Cursor<R>, origin: u64) -> ParseResult<MenuItem> {
    let flags = cursor.read_u16_le()?;
    let id = if flags & MF_POPUP == 0 {
        Some(u32::from(cursor.read_u16_le()?))
    } else {
        None
    };
    Ok(MenuItem {
        flags,
        id,
        extended: None,
        text: read_text(cursor, origin)?,
        children: Vec::new(),
    })
}

fn read_extended_item<R: Read + Seek>(cursor: &mut Cursor<R>, origin: u64) -> ParseResult<MenuItem> {
    let item_type = cursor.read_u32_le()?;
    let state = cursor.read_u32_le()?;
    let id = cursor.read_u32_le()?;
    let flags = cursor.read_u16_le()?;
    let text = read_text(cursor, origin)?;
    cursor.align_from(4, origin)?;
    let help_id = if flags & EXTENDED_POPUP != 0 {
        Some(cursor.read_u32_le()?)
    } else {
        None
    };
    Ok(MenuItem {
        flags,
        id: Some(id),
        extended: Some(ExtendedItemFields {
            item_type,
            state,
            help_id,
        }),
        text,
        children: Vec::new(),
    })
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::super::{pad4, utf16z};
    use super::*;
    use pretty_assertions::assert_eq;

    fn standard_item(flags: u16, id: Option<u16>, text: &str) -> Vec<u8> {
        let mut data = flags.to_le_bytes().to_vec();
        if let Some(id) = id {
            data.extend_from_slice(&id.to_le_bytes());
        }
        data.extend(utf16z(text));
        data
    }

    #[test]
    fn test_standard_menu_tree() {
        let mut data = vec![0, 0, 0, 0];
        data.extend(standard_item(MF_POPUP, None, "&File"));
        data.extend(standard_item(0, Some(100), "&Open"));
        data.extend(standard_item(MF_END, Some(101), "E&xit"));
        data.extend(standard_item(MF_POPUP | MF_END, None, "&Help"));
        data.extend(standard_item(MF_END, Some(200), "&About"));

        let menu = Menu::parse_bytes(&data, 0).expect("Operation should succeed");
        assert_eq!(menu.version, 0);
        assert_eq!(menu.items.len(), 2);
        assert_eq!(menu.items[0].text, "&File");
        assert_eq!(menu.items[0].id, None);
        assert_eq!(menu.items[0].children.len(), 2);
        assert_eq!(menu.walk().len(), 5);
        assert_eq!(menu.find(200).map(|item| item.text.as_str()), Some("&About"));
    }

    #[test]
    fn test_unclosed_submenu_fails() {
        let mut data = vec![0, 0, 0, 0];
        data.extend(standard_item(MF_POPUP, None, "&File"));
        data.extend(standard_item(0, Some(100), "&Open"));
        assert!(Menu::from_bytes(&data, 0).is_none());
    }

    #[test]
    fn test_extended_menu() {
        let mut data = 1u16.to_le_bytes().to_vec();
        data.extend_from_slice(&4u16.to_le_bytes());
        data.extend_from_slice(&0x55u32.to_le_bytes());

        let mut item = |flags: u16, id: u32, text: &str, help: Option<u32>| {
            data.extend_from_slice(&0u32.to_le_bytes());
            data.extend_from_slice(&0u32.to_le_bytes());
            data.extend_from_slice(&id.to_le_bytes());
            data.extend_from_slice(&flags.to_le_bytes());
            data.extend(utf16z(text));
            pad4(&mut data);
            if let Some(help) = help {
                data.extend_from_slice(&help.to_le_bytes());
            }
        };
        item(EXTENDED_POPUP | MF_END, 0, "&Edit", Some(9));
        item(0, 300, "Cu&t", None);
        item(MF_END, 301, "&Copy", None);

        let menu = Menu::parse_bytes(&data, 0).expect("Operation should succeed");
        assert_eq!(menu.help_id, Some(0x55));
        let edit = &menu.items[0];
        assert!(edit.is_popup());
        assert_eq!(edit.extended.and_then(|fields| fields.help_id), Some(9));
        assert_eq!(edit.children[1].id, Some(301));
        assert_eq!(edit.children[1].text, "&Copy");
    }

    #[test]
    fn test_unknown_version() {
        assert!(matches!(
            Menu::parse_bytes(&[2, 0, 0, 0], 0),
            Err(ParseError::UnsupportedVersion { version: 2, .. })
        ));
    }

    #[test]
    fn test_nesting_limit() {
        let mut data = vec![0, 0, 0, 0];
        for _ in 0..40 {
            data.extend(standard_item(MF_POPUP, None, "x"));
        }
        assert!(matches!(
            Menu::parse_bytes(&data, 0),
            Err(ParseError::InvalidField { field: "menu_depth", .. })
        ));
    }
}
