//! Dialog box templates
//!
//! A dialog resource is either a standard `DLGTEMPLATE` or an extended
//! `DLGTEMPLATEEX`. The extended form starts with a version word of 1 and a
//! signature word of `0xFFFF`; anything else is a standard template whose
//! first dword is the window style.

use super::{read_name, read_text};
use relic_io::{
    Cursor, Format, NameOrOrdinal, ParseError, ParseResult, ReadResult, ReaderConfig, Variant,
    read_table,
};
use std::io::{Read, Seek};
use tracing::trace;

/// Style bit announcing a font block after the title
pub const DS_SETFONT: u32 = 0x40;

const EXTENDED_SIGNATURE: u16 = 0xFFFF;
const EXTENDED_VERSION: u16 = 1;

/// Smallest standard item: fixed fields, two empty names and a size word
const STANDARD_ITEM_MIN_SIZE: u64 = 24;
/// Smallest extended item
const EXTENDED_ITEM_MIN_SIZE: u64 = 30;

/// Template layout, chosen by the second word of the resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogShape {
    /// `DLGTEMPLATE`
    Standard,
    /// `DLGTEMPLATEEX` with its version word
    Extended(u16),
}

/// Header fields only present in extended templates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtendedDialogFields {
    /// Template version, always 1
    pub version: u16,
    /// Context help identifier
    pub help_id: u32,
}

/// Font attributes only present in extended templates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontStyle {
    /// Font weight
    pub weight: u16,
    /// Italic flag
    pub italic: u8,
    /// Character set
    pub charset: u8,
}

/// Font block, present when the style has [`DS_SETFONT`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogFont {
    /// Point size
    pub point_size: u16,
    /// Extended attributes
    pub style: Option<FontStyle>,
    /// Typeface name
    pub typeface: String,
}

/// One control of a dialog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogItem {
    /// Context help identifier, extended templates only
    pub help_id: Option<u32>,
    /// Window style
    pub style: u32,
    /// Extended window style
    pub extended_style: u32,
    /// Left edge in dialog units
    pub x: i16,
    /// Top edge in dialog units
    pub y: i16,
    /// Width in dialog units
    pub width: i16,
    /// Height in dialog units
    pub height: i16,
    /// Control identifier, 16-bit in standard templates
    pub id: u32,
    /// Window class, predefined classes are ordinals
    pub class: NameOrOrdinal,
    /// Initial text or resource ordinal
    pub title: NameOrOrdinal,
    /// Data passed to the control on creation
    pub creation_data: Vec<u8>,
}

/// Complete dialog template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogTemplate {
    /// Present for extended templates
    pub extended: Option<ExtendedDialogFields>,
    /// Window style
    pub style: u32,
    /// Extended window style
    pub extended_style: u32,
    /// Declared control count
    pub item_count: u16,
    /// Left edge in dialog units
    pub x: i16,
    /// Top edge in dialog units
    pub y: i16,
    /// Width in dialog units
    pub width: i16,
    /// Height in dialog units
    pub height: i16,
    /// Menu resource
    pub menu: NameOrOrdinal,
    /// Window class
    pub class: NameOrOrdinal,
    /// Caption
    pub title: NameOrOrdinal,
    /// Font block
    pub font: Option<DialogFont>,
    /// Controls in template order
    pub items: Vec<DialogItem>,
}

impl Variant for DialogTemplate {
    type Discriminant = DialogShape;

    fn peek_discriminant<R: Read + Seek>(cursor: &mut Cursor<R>) -> ReadResult<DialogShape> {
        let lead = cursor.peek_array::<4>()?;
        let version = u16::from_le_bytes([lead[0], lead[1]]);
        let signature = u16::from_le_bytes([lead[2], lead[3]]);
        Ok(if signature == EXTENDED_SIGNATURE {
            DialogShape::Extended(version)
        } else {
            DialogShape::Standard
        })
    }

    fn decode<R: Read + Seek>(cursor: &mut Cursor<R>, shape: DialogShape) -> ParseResult<Self> {
        Self::decode_with(cursor, shape, &ReaderConfig::default())
    }
}

impl DialogTemplate {
    fn decode_with<R: Read + Seek>(
        cursor: &mut Cursor<R>,
        shape: DialogShape,
        config: &ReaderConfig,
    ) -> ParseResult<Self> {
        let origin = cursor.position();
        let (extended, style, extended_style) = match shape {
            DialogShape::Standard => {
                let style = cursor.read_u32_le()?;
                (None, style, cursor.read_u32_le()?)
            }
            DialogShape::Extended(EXTENDED_VERSION) => {
                cursor.skip(4)?;
                let help_id = cursor.read_u32_le()?;
                let extended_style = cursor.read_u32_le()?;
                let style = cursor.read_u32_le()?;
                let fields = ExtendedDialogFields {
                    version: EXTENDED_VERSION,
                    help_id,
                };
                (Some(fields), style, extended_style)
            }
            DialogShape::Extended(version) => {
                return Err(ParseError::UnsupportedVersion {
                    format: Self::NAME,
                    version: u64::from(version),
                });
            }
        };

        let item_count = cursor.read_u16_le()?;
        let x = cursor.read_i16_le()?;
        let y = cursor.read_i16_le()?;
        let width = cursor.read_i16_le()?;
        let height = cursor.read_i16_le()?;
        let menu = read_name(cursor, origin)?;
        let class = read_name(cursor, origin)?;
        let title = read_name(cursor, origin)?;

        let font = if style & DS_SETFONT != 0 {
            let point_size = cursor.read_u16_le()?;
            let font_style = if extended.is_some() {
                Some(FontStyle {
                    weight: cursor.read_u16_le()?,
                    italic: cursor.read_u8()?,
                    charset: cursor.read_u8()?,
                })
            } else {
                None
            };
            Some(DialogFont {
                point_size,
                style: font_style,
                typeface: read_text(cursor, origin)?,
            })
        } else {
            None
        };
        cursor.align_from(4, origin)?;

        let is_extended = extended.is_some();
        let min_size = if is_extended {
            EXTENDED_ITEM_MIN_SIZE
        } else {
            STANDARD_ITEM_MIN_SIZE
        };
        let items = read_table(cursor, config, "item_count", u64::from(item_count), min_size, |c| {
            read_item(c, origin, is_extended)
        })?;
        trace!(extended = is_extended, items = items.len(), "dialog template read");

        Ok(Self {
            extended,
            style,
            extended_style,
            item_count,
            x,
            y,
            width,
            height,
            menu,
            class,
            title,
            font,
            items,
        })
    }

    /// Whether this is a `DLGTEMPLATEEX`
    pub fn is_extended(&self) -> bool {
        self.extended.is_some()
    }

    /// Control with identifier `id`
    pub fn item(&self, id: u32) -> Option<&DialogItem> {
        self.items.iter().find(|item| item.id == id)
    }
}

fn read_item<R: Read + Seek>(
    cursor: &mut Cursor<R>,
    origin: u64,
    extended: bool,
) -> ParseResult<DialogItem> {
    cursor.atomic(|c| {
        let (help_id, style, extended_style) = if extended {
            let help_id = c.read_u32_le()?;
            let extended_style = c.read_u32_le()?;
            (Some(help_id), c.read_u32_le()?, extended_style)
        } else {
            let style = c.read_u32_le()?;
            (None, style, c.read_u32_le()?)
        };
        let x = c.read_i16_le()?;
        let y = c.read_i16_le()?;
        let width = c.read_i16_le()?;
        let height = c.read_i16_le()?;
        let id = if extended {
            c.read_u32_le()?
        } else {
            u32::from(c.read_u16_le()?)
        };
        let class = read_name(c, origin)?;
        let title = read_name(c, origin)?;
        let creation_size = c.read_u16_le()?;
        let creation_data = c.read_bytes(usize::from(creation_size))?;
        c.align_from(4, origin)?;

        Ok(DialogItem {
            help_id,
            style,
            extended_style,
            x,
            y,
            width,
            height,
            id,
            class,
            title,
            creation_data,
        })
    })
}

impl Format for DialogTemplate {
    const NAME: &'static str = "RT_DIALOG";

    fn read<R: Read + Seek>(cursor: &mut Cursor<R>, config: &ReaderConfig) -> ParseResult<Self> {
        let shape = Self::peek_discriminant(cursor)?;
        cursor.atomic(|c| Self::decode_with(c, shape, config))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::super::{pad4, utf16z};
    use super::*;
    use pretty_assertions::assert_eq;

    const BUTTON: u16 = 0x0080;

    fn standard_dialog() -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&(0x8000_0000u32 | DS_SETFONT).to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes());
        for value in [10i16, 20, 200, 100] {
            data.extend_from_slice(&value.to_le_bytes());
        }
        data.extend(NameOrOrdinal::Ordinal(7).to_bytes());
        data.extend(NameOrOrdinal::Absent.to_bytes());
        data.extend(utf16z("About"));
        data.extend_from_slice(&8u16.to_le_bytes());
        data.extend(utf16z("MS Shell Dlg"));
        pad4(&mut data);

        data.extend_from_slice(&0x5000_0001u32.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        for value in [5i16, 5, 50, 14] {
            data.extend_from_slice(&value.to_le_bytes());
        }
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend(NameOrOrdinal::Ordinal(BUTTON).to_bytes());
        data.extend(utf16z("OK"));
        data.extend_from_slice(&0u16.to_le_bytes());
        pad4(&mut data);
        data
    }

    #[test]
    fn test_standard_template() {
        let data = standard_dialog();
        let dialog = DialogTemplate::parse_bytes(&data, 0).expect("Operation should succeed");
        assert!(!dialog.is_extended());
        assert_eq!(dialog.menu, NameOrOrdinal::Ordinal(7));
        assert!(dialog.class.is_absent());
        assert_eq!(dialog.title.name(), Some("About"));
        let font = dialog.font.as_ref().expect("Operation should succeed");
        assert_eq!(font.point_size, 8);
        assert_eq!(font.style, None);
        assert_eq!(font.typeface, "MS Shell Dlg");

        let ok = dialog.item(1).expect("Operation should succeed");
        assert_eq!(ok.class.ordinal(), Some(BUTTON));
        assert_eq!(ok.title.name(), Some("OK"));
        assert_eq!((ok.width, ok.height), (50, 14));
    }

    #[test]
    fn test_alignment_counts_from_resource_start() {
        let mut data = vec![0xAA; 3];
        data.extend(standard_dialog());
        let mut stream = std::io::Cursor::new(data);
        stream.set_position(3);
        let dialog = DialogTemplate::parse_stream(stream).expect("Operation should succeed");
        assert_eq!(dialog.items.len(), 1);
        assert_eq!(dialog.items[0].title.name(), Some("OK"));
    }

    #[test]
    fn test_extended_template() {
        let mut data = Vec::new();
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&0xFFFFu16.to_le_bytes());
        data.extend_from_slice(&0x1234u32.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&DS_SETFONT.to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes());
        for value in [0i16, 0, 100, 50] {
            data.extend_from_slice(&value.to_le_bytes());
        }
        data.extend(NameOrOrdinal::Absent.to_bytes());
        data.extend(NameOrOrdinal::Name("MyClass".to_string()).to_bytes());
        data.extend(NameOrOrdinal::Absent.to_bytes());
        data.extend_from_slice(&9u16.to_le_bytes());
        data.extend_from_slice(&700u16.to_le_bytes());
        data.extend_from_slice(&[1, 0]);
        data.extend(utf16z("Tahoma"));
        pad4(&mut data);

        data.extend_from_slice(&0x99u32.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&0x5001_0000u32.to_le_bytes());
        for value in [1i16, 2, 3, 4] {
            data.extend_from_slice(&value.to_le_bytes());
        }
        data.extend_from_slice(&0x10000u32.to_le_bytes());
        data.extend(NameOrOrdinal::Name("Custom".to_string()).to_bytes());
        data.extend(NameOrOrdinal::Ordinal(3).to_bytes());
        data.extend_from_slice(&2u16.to_le_bytes());
        data.extend_from_slice(&[0xAB, 0xCD]);

        let dialog = DialogTemplate::parse_bytes(&data, 0).expect("Operation should succeed");
        assert_eq!(
            dialog.extended,
            Some(ExtendedDialogFields { version: 1, help_id: 0x1234 })
        );
        assert_eq!(dialog.class.name(), Some("MyClass"));
        let font = dialog.font.expect("Operation should succeed");
        assert_eq!(font.style, Some(FontStyle { weight: 700, italic: 1, charset: 0 }));

        let item = &dialog.items[0];
        assert_eq!(item.help_id, Some(0x99));
        assert_eq!(item.id, 0x10000);
        assert_eq!(item.class.name(), Some("Custom"));
        assert_eq!(item.title, NameOrOrdinal::Ordinal(3));
        assert_eq!(item.creation_data, vec![0xAB, 0xCD]);
    }

    #[test]
    fn test_unknown_extended_version() {
        let mut data = 2u16.to_le_bytes().to_vec();
        data.extend_from_slice(&[0xFF; 40]);
        assert!(matches!(
            DialogTemplate::parse_bytes(&data, 0),
            Err(ParseError::UnsupportedVersion { version: 2, .. })
        ));
    }

    #[test]
    fn test_item_count_beyond_data() {
        let mut data = standard_dialog();
        data[8] = 40;
        assert!(matches!(
            DialogTemplate::parse_bytes(&data, 0),
            Err(ParseError::CountOutOfRange { field: "item_count", .. })
        ));
    }

    #[test]
    fn test_variant_read_keeps_position_on_failure() {
        let data = standard_dialog();
        let mut cursor = Cursor::over(&data[..30]);
        assert!(<DialogTemplate as Variant>::read(&mut cursor).is_err());
        assert_eq!(cursor.position(), 0);
    }
}
