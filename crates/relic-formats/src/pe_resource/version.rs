//! Version information resources
//!
//! `VS_VERSION_INFO` is a tree of nodes. Every node starts with its total
//! length, the length of its value, a value type and a UTF-16 key, and is
//! padded to a four-byte boundary. The root holds a `VS_FIXEDFILEINFO` and up
//! to two children keyed `StringFileInfo` and `VarFileInfo`.

use super::read_text;
use binrw::BinRead;
use relic_io::{Cursor, Encoding, Format, ParseError, ParseResult, ReaderConfig, gate};
use std::io::{Read, Seek};
use tracing::debug;

/// Signature word of the fixed file info
pub const FIXED_FILE_INFO_SIGNATURE: u32 = 0xFEEF_04BD;

const ROOT_KEY: &str = "VS_VERSION_INFO";
const STRING_FILE_INFO_KEY: &str = "StringFileInfo";
const VAR_FILE_INFO_KEY: &str = "VarFileInfo";
const TRANSLATION_KEY: &str = "Translation";

/// Fixed part of the version resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead)]
#[br(little)]
pub struct FixedFileInfo {
    /// Always [`FIXED_FILE_INFO_SIGNATURE`]
    pub signature: u32,
    /// Structure version
    pub struct_version: u32,
    /// High dword of the file version
    pub file_version_ms: u32,
    /// Low dword of the file version
    pub file_version_ls: u32,
    /// High dword of the product version
    pub product_version_ms: u32,
    /// Low dword of the product version
    pub product_version_ls: u32,
    /// Valid bits of `file_flags`
    pub file_flags_mask: u32,
    /// File attribute flags
    pub file_flags: u32,
    /// Target operating system
    pub file_os: u32,
    /// File type
    pub file_type: u32,
    /// File subtype
    pub file_subtype: u32,
    /// High dword of the file date
    pub file_date_ms: u32,
    /// Low dword of the file date
    pub file_date_ls: u32,
}

fn split_version(ms: u32, ls: u32) -> [u16; 4] {
    [(ms >> 16) as u16, ms as u16, (ls >> 16) as u16, ls as u16]
}

impl FixedFileInfo {
    /// File version as major, minor, build, revision
    pub fn file_version(&self) -> [u16; 4] {
        split_version(self.file_version_ms, self.file_version_ls)
    }

    /// Product version as major, minor, build, revision
    pub fn product_version(&self) -> [u16; 4] {
        split_version(self.product_version_ms, self.product_version_ls)
    }

    /// Flags restricted to the valid mask
    pub fn effective_flags(&self) -> u32 {
        self.file_flags & self.file_flags_mask
    }
}

/// Strings for one language and code page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringTableBlock {
    /// Eight hex digits: language then code page
    pub key: String,
    /// Name and value pairs in stored order
    pub strings: Vec<(String, String)>,
}

impl StringTableBlock {
    /// Language identifier from the key
    pub fn language(&self) -> Option<u16> {
        self.key.get(..4).and_then(|hex| u16::from_str_radix(hex, 16).ok())
    }

    /// Code page from the key
    pub fn code_page(&self) -> Option<u16> {
        self.key.get(4..8).and_then(|hex| u16::from_str_radix(hex, 16).ok())
    }
}

/// `StringFileInfo` child
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringFileInfo {
    /// One block per language
    pub tables: Vec<StringTableBlock>,
}

/// `VarFileInfo` child
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarFileInfo {
    /// Supported language and code page pairs
    pub translations: Vec<(u16, u16)>,
}

/// Complete version resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    /// Fixed file info, absent when the root has no value
    pub fixed: Option<FixedFileInfo>,
    /// Localized strings
    pub string_file_info: Option<StringFileInfo>,
    /// Translations
    pub var_file_info: Option<VarFileInfo>,
}

impl Format for VersionInfo {
    const NAME: &'static str = "RT_VERSION";

    fn read<R: Read + Seek>(cursor: &mut Cursor<R>, _config: &ReaderConfig) -> ParseResult<Self> {
        let origin = cursor.position();
        let root = Node::read(cursor, origin)?;
        gate::expect_signature(Self::NAME, root.key.as_bytes(), ROOT_KEY.as_bytes())?;

        let fixed = if root.value_length > 0 {
            let signature = cursor.peek_u32_le()?;
            gate::expect_signature(
                Self::NAME,
                &signature.to_le_bytes(),
                &FIXED_FILE_INFO_SIGNATURE.to_le_bytes(),
            )?;
            let fixed: FixedFileInfo = cursor.read_le()?;
            cursor.align_from(4, origin)?;
            Some(fixed)
        } else {
            None
        };

        let mut info = Self {
            fixed,
            string_file_info: None,
            var_file_info: None,
        };
        while cursor.position() < root.end {
            let child = Node::read(cursor, origin)?;
            match child.key.as_str() {
                STRING_FILE_INFO_KEY => {
                    info.string_file_info = Some(read_string_file_info(cursor, origin, &child)?);
                }
                VAR_FILE_INFO_KEY => {
                    info.var_file_info = Some(read_var_file_info(cursor, origin, &child)?);
                }
                other => debug!(key = other, "skipping unknown version info child"),
            }
            child.finish(cursor, origin)?;
        }
        Ok(info)
    }
}

impl VersionInfo {
    /// First string named `name`, searched over every language
    pub fn string(&self, name: &str) -> Option<&str> {
        self.string_file_info
            .as_ref()?
            .tables
            .iter()
            .flat_map(|table| &table.strings)
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Header shared by every node of the tree
struct Node {
    value_length: u16,
    key: String,
    end: u64,
}

impl Node {
    /// Read the header and position the cursor at the node value
    fn read<R: Read + Seek>(cursor: &mut Cursor<R>, origin: u64) -> ParseResult<Self> {
        let start = cursor.position();
        let length = cursor.read_u16_le()?;
        let value_length = cursor.read_u16_le()?;
        let _value_type = cursor.read_u16_le()?;
        let key = read_text(cursor, origin)?;
        cursor.align_from(4, origin)?;

        let end = start + u64::from(length);
        if end > cursor.len() {
            return Err(ParseError::CountOutOfRange {
                field: "node_length",
                count: u64::from(length),
                limit: cursor.len() - start,
            });
        }
        if cursor.position() > end {
            return Err(ParseError::InvalidField {
                field: "node_length",
                value: i64::from(length),
            });
        }
        Ok(Self {
            value_length,
            key,
            end,
        })
    }

    /// Move past the node and its padding
    fn finish<R: Read + Seek>(&self, cursor: &mut Cursor<R>, origin: u64) -> ParseResult<()> {
        cursor.set_position(self.end.max(cursor.position()))?;
        cursor.align_from(4, origin)?;
        Ok(())
    }
}

fn read_string_file_info<R: Read + Seek>(
    cursor: &mut Cursor<R>,
    origin: u64,
    node: &Node,
) -> ParseResult<StringFileInfo> {
    let mut tables = Vec::new();
    while cursor.position() < node.end {
        let table = Node::read(cursor, origin)?;
        let mut strings = Vec::new();
        while cursor.position() < table.end {
            let entry = Node::read(cursor, origin)?;
            let available = entry.end - cursor.position();
            let size = (u64::from(entry.value_length) * 2).min(available);
            let value = cursor.read_string(size as usize, Encoding::Utf16Le)?;
            strings.push((entry.key.clone(), value.trim_end_matches('\0').to_string()));
            entry.finish(cursor, origin)?;
        }
        tables.push(StringTableBlock {
            key: table.key.clone(),
            strings,
        });
        table.finish(cursor, origin)?;
    }
    Ok(StringFileInfo { tables })
}

fn read_var_file_info<R: Read + Seek>(
    cursor: &mut Cursor<R>,
    origin: u64,
    node: &Node,
) -> ParseResult<VarFileInfo> {
    let mut translations = Vec::new();
    while cursor.position() < node.end {
        let var = Node::read(cursor, origin)?;
        if var.key == TRANSLATION_KEY {
            let value_end = (cursor.position() + u64::from(var.value_length)).min(var.end);
            while cursor.position() + 4 <= value_end {
                let language = cursor.read_u16_le()?;
                let code_page = cursor.read_u16_le()?;
                translations.push((language, code_page));
            }
        } else {
            debug!(key = %var.key, "skipping unknown var entry");
        }
        var.finish(cursor, origin)?;
    }
    Ok(VarFileInfo { translations })
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::super::{pad4, utf16z};
    use super::*;
    use pretty_assertions::assert_eq;

    fn node(key: &str, value_length: u16, value: &[u8], children: &[Vec<u8>]) -> Vec<u8> {
        let mut data = vec![0, 0];
        data.extend_from_slice(&value_length.to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend(utf16z(key));
        pad4(&mut data);
        data.extend_from_slice(value);
        for child in children {
            pad4(&mut data);
            data.extend_from_slice(child);
        }
        let length = data.len() as u16;
        data[..2].copy_from_slice(&length.to_le_bytes());
        data
    }

    fn text(key: &str, value: &str) -> Vec<u8> {
        let bytes = utf16z(value);
        node(key, (bytes.len() / 2) as u16, &bytes, &[])
    }

    fn fixed() -> Vec<u8> {
        let mut data = Vec::new();
        let words = [
            FIXED_FILE_INFO_SIGNATURE,
            0x0001_0000,
            0x0002_0001,
            0x0003_0004,
            0x0002_0000,
            0,
            0x3F,
            0x41,
            0x0004_0004,
            1,
            0,
            0,
            0,
        ];
        for word in words {
            data.extend_from_slice(&word.to_le_bytes());
        }
        data
    }

    fn sample() -> Vec<u8> {
        let strings = node(
            STRING_FILE_INFO_KEY,
            0,
            &[],
            &[node(
                "040904B0",
                0,
                &[],
                &[text("CompanyName", "Relic"), text("FileVersion", "2.1.3.4")],
            )],
        );
        let mut translation = 0x0409u16.to_le_bytes().to_vec();
        translation.extend_from_slice(&1200u16.to_le_bytes());
        let vars = node(VAR_FILE_INFO_KEY, 0, &[], &[node(TRANSLATION_KEY, 4, &translation, &[])]);
        node(ROOT_KEY, 52, &fixed(), &[strings, vars])
    }

    #[test]
    fn test_full_tree() {
        let info = VersionInfo::parse_bytes(&sample(), 0).expect("Operation should succeed");
        let fixed = info.fixed.expect("Operation should succeed");
        assert_eq!(fixed.file_version(), [2, 1, 3, 4]);
        assert_eq!(fixed.product_version(), [2, 0, 0, 0]);
        assert_eq!(fixed.effective_flags(), 0x01);

        let strings = info.string_file_info.as_ref().expect("Operation should succeed");
        assert_eq!(strings.tables[0].language(), Some(0x0409));
        assert_eq!(strings.tables[0].code_page(), Some(0x04B0));
        assert_eq!(info.string("FileVersion"), Some("2.1.3.4"));
        assert_eq!(info.string("CompanyName"), Some("Relic"));
        assert_eq!(
            info.var_file_info,
            Some(VarFileInfo { translations: vec![(0x0409, 1200)] })
        );
    }

    #[test]
    fn test_children_are_optional() {
        let data = node(ROOT_KEY, 52, &fixed(), &[]);
        let info = VersionInfo::parse_bytes(&data, 0).expect("Operation should succeed");
        assert!(info.fixed.is_some());
        assert_eq!(info.string_file_info, None);
        assert_eq!(info.var_file_info, None);
    }

    #[test]
    fn test_unknown_child_skipped() {
        let data = node(ROOT_KEY, 0, &[], &[text("Comments", "x"), node(VAR_FILE_INFO_KEY, 0, &[], &[])]);
        let info = VersionInfo::parse_bytes(&data, 0).expect("Operation should succeed");
        assert_eq!(info.fixed, None);
        assert_eq!(info.var_file_info, Some(VarFileInfo { translations: vec![] }));
    }

    #[test]
    fn test_wrong_root_key() {
        let data = node("VS_VERSIONINFO", 0, &[], &[]);
        assert!(matches!(
            VersionInfo::parse_bytes(&data, 0),
            Err(ParseError::InvalidSignature { .. })
        ));
    }

    #[test]
    fn test_bad_fixed_signature() {
        let mut value = fixed();
        value[0] = 0;
        let data = node(ROOT_KEY, 52, &value, &[]);
        assert!(VersionInfo::from_bytes(&data, 0).is_none());
    }

    #[test]
    fn test_node_longer_than_data() {
        let mut data = sample();
        data.truncate(data.len() - 4);
        assert!(matches!(
            VersionInfo::parse_bytes(&data, 0),
            Err(ParseError::CountOutOfRange { field: "node_length", .. })
        ));
    }
}
