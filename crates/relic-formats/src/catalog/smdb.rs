//! Everdrive SMDB catalogs
//!
//! One tab-separated row per file: SHA-256, path, SHA-1, MD5 and CRC-32,
//! optionally followed by the size and further fields.

use super::read_text;
use relic_io::{Cursor, Format, ParseError, ParseResult, ReaderConfig};
use std::io::{Read, Seek};
use tracing::{trace, warn};

/// Fields every row must carry
const REQUIRED_FIELDS: usize = 5;

/// One catalogued file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmdbRow {
    /// SHA-256 digest
    pub sha256: String,
    /// Path of the file
    pub name: String,
    /// SHA-1 digest
    pub sha1: String,
    /// MD5 digest
    pub md5: String,
    /// CRC-32
    pub crc32: String,
    /// Size in bytes, when given
    pub size: Option<String>,
    /// Fields after the size
    pub additional: Vec<String>,
}

/// Complete SMDB catalog
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SmdbCatalog {
    /// Rows in file order
    pub rows: Vec<SmdbRow>,
    /// Lines that were not rows
    pub additional: Vec<String>,
}

impl Format for SmdbCatalog {
    const NAME: &'static str = "SMDB";

    fn read<R: Read + Seek>(cursor: &mut Cursor<R>, config: &ReaderConfig) -> ParseResult<Self> {
        let text = read_text(cursor)?;
        let mut catalog = Self::default();
        for (number, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < REQUIRED_FIELDS {
                warn!(line = number + 1, fields = fields.len(), "SMDB line is not a row");
                catalog.additional.push(line.to_string());
                continue;
            }
            if catalog.rows.len() as u64 >= config.max_table_entries {
                return Err(ParseError::CountOutOfRange {
                    field: "rows",
                    count: catalog.rows.len() as u64 + 1,
                    limit: config.max_table_entries,
                });
            }
            catalog.rows.push(SmdbRow {
                sha256: fields[0].to_string(),
                name: fields[1].to_string(),
                sha1: fields[2].to_string(),
                md5: fields[3].to_string(),
                crc32: fields[4].to_string(),
                size: fields.get(5).map(|size| (*size).to_string()),
                additional: fields.iter().skip(6).map(|field| (*field).to_string()).collect(),
            });
        }
        trace!(rows = catalog.rows.len(), additional = catalog.additional.len(), "SMDB catalog read");
        Ok(catalog)
    }
}

impl SmdbCatalog {
    /// Row for the file at `name`
    pub fn find(&self, name: &str) -> Option<&SmdbRow> {
        self.rows.iter().find(|row| row.name == name)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn test_rows_and_stray_lines() {
        let text = format!(
            "{SHA256}\tGenesis/Sonic.md\tda39a3ee5e6b4b0d3255bfef95601890afd80709\td41d8cd98f00b204e9800998ecf8427e\t00000000\n\
             garbage line\n\
             \n\
             {SHA256}\tSNES/Mario.sfc\tsha1\tmd5\tcrc\t524288\tx\ty\r\n"
        );
        let catalog = SmdbCatalog::parse_bytes(text.as_bytes(), 0).expect("Operation should succeed");
        assert_eq!(catalog.rows.len(), 2);
        assert_eq!(catalog.additional, vec!["garbage line".to_string()]);

        let sonic = catalog.find("Genesis/Sonic.md").expect("Operation should succeed");
        assert_eq!(sonic.crc32, "00000000");
        assert_eq!(sonic.size, None);

        let mario = catalog.find("SNES/Mario.sfc").expect("Operation should succeed");
        assert_eq!(mario.size.as_deref(), Some("524288"));
        assert_eq!(mario.additional, vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn test_row_limit() {
        let line = format!("{SHA256}\ta\tb\tc\td\n");
        let text = line.repeat(3);
        let config = ReaderConfig::default().with_max_table_entries(2);
        assert!(matches!(
            SmdbCatalog::parse_bytes_with(text.as_bytes(), 0, &config),
            Err(ParseError::CountOutOfRange { field: "rows", .. })
        ));
    }

    #[test]
    fn test_binary_input() {
        assert!(SmdbCatalog::from_bytes(&[0xFF; 64], 0).is_none());
    }
}
