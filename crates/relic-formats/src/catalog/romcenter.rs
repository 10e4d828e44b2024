//! RomCenter INI catalogs
//!
//! Sections `[CREDITS]`, `[DAT]` and `[EMULATOR]` hold `key=value` pairs;
//! `[GAMES]` holds one `¬`-separated rom per line. Section and key names are
//! matched without regard to case. Comments start with `;`.

use super::read_text;
use relic_io::{Cursor, Format, ParseError, ParseResult, ReaderConfig};
use std::io::{Read, Seek};
use tracing::{trace, warn};

const ROM_SEPARATOR: char = '¬';

/// Separated fields a rom line needs, the leading empty one included
const ROM_FIELDS: usize = 10;

/// `[CREDITS]` section
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Credits {
    /// Author
    pub author: Option<String>,
    /// Catalog version
    pub version: Option<String>,
    /// Contact address
    pub email: Option<String>,
    /// Homepage
    pub homepage: Option<String>,
    /// Download location
    pub url: Option<String>,
    /// Release date
    pub date: Option<String>,
    /// Free-form comment
    pub comment: Option<String>,
    /// Unrecognized lines
    pub additional: Vec<String>,
}

/// `[DAT]` section
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DatSection {
    /// Format version
    pub version: Option<String>,
    /// Plugin used to produce the catalog
    pub plugin: Option<String>,
    /// Split set flag
    pub split: Option<String>,
    /// Merged set flag
    pub merge: Option<String>,
    /// Unrecognized lines
    pub additional: Vec<String>,
}

/// `[EMULATOR]` section
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Emulator {
    /// Reference name
    pub ref_name: Option<String>,
    /// Emulator version
    pub version: Option<String>,
    /// Unrecognized lines
    pub additional: Vec<String>,
}

/// One rom of the `[GAMES]` section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RomEntry {
    /// Parent set name
    pub parent_name: String,
    /// Parent set description
    pub parent_description: String,
    /// Game name
    pub game_name: String,
    /// Game description
    pub game_description: String,
    /// Rom file name
    pub rom_name: String,
    /// Rom CRC-32
    pub rom_crc: String,
    /// Rom size
    pub rom_size: String,
    /// Set the rom is taken from
    pub rom_of: String,
    /// Name in the merged set
    pub merge_name: String,
    /// Fields after the trailing empty one
    pub additional: Vec<String>,
}

impl RomEntry {
    fn parse(line: &str) -> Option<Self> {
        let fields: Vec<&str> = line.split(ROM_SEPARATOR).collect();
        if fields.len() < ROM_FIELDS {
            return None;
        }
        let field = |index: usize| fields[index].to_string();
        Some(Self {
            parent_name: field(1),
            parent_description: field(2),
            game_name: field(3),
            game_description: field(4),
            rom_name: field(5),
            rom_crc: field(6),
            rom_size: field(7),
            rom_of: field(8),
            merge_name: field(9),
            additional: fields.iter().skip(11).map(|extra| (*extra).to_string()).collect(),
        })
    }
}

/// `[GAMES]` section
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Games {
    /// Roms in file order
    pub roms: Vec<RomEntry>,
    /// Lines that were not roms
    pub additional: Vec<String>,
}

/// Complete RomCenter catalog
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RomCenterCatalog {
    /// Credits, when the section exists
    pub credits: Option<Credits>,
    /// Catalog settings, when the section exists
    pub dat: Option<DatSection>,
    /// Emulator reference, when the section exists
    pub emulator: Option<Emulator>,
    /// Roms, when the section exists
    pub games: Option<Games>,
    /// Lines outside the known sections
    pub additional: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Credits,
    Dat,
    Emulator,
    Games,
    Unknown,
}

fn key_value(line: &str) -> Option<(String, String)> {
    let (key, value) = line.split_once('=')?;
    Some((key.trim().to_ascii_lowercase(), value.trim().to_string()))
}

impl Format for RomCenterCatalog {
    const NAME: &'static str = "RomCenter";

    fn read<R: Read + Seek>(cursor: &mut Cursor<R>, config: &ReaderConfig) -> ParseResult<Self> {
        let text = read_text(cursor)?;
        let mut catalog = Self::default();
        let mut section = Section::None;

        for (number, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with(';') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
                section = match name.trim().to_ascii_lowercase().as_str() {
                    "credits" => {
                        catalog.credits.get_or_insert_with(Credits::default);
                        Section::Credits
                    }
                    "dat" => {
                        catalog.dat.get_or_insert_with(DatSection::default);
                        Section::Dat
                    }
                    "emulator" => {
                        catalog.emulator.get_or_insert_with(Emulator::default);
                        Section::Emulator
                    }
                    "games" => {
                        catalog.games.get_or_insert_with(Games::default);
                        Section::Games
                    }
                    _ => {
                        catalog.additional.push(raw.to_string());
                        Section::Unknown
                    }
                };
                continue;
            }

            let known = match section {
                Section::Credits => catalog.credits.as_mut().is_some_and(|credits| credits.apply(raw)),
                Section::Dat => catalog.dat.as_mut().is_some_and(|dat| dat.apply(raw)),
                Section::Emulator => catalog.emulator.as_mut().is_some_and(|emulator| emulator.apply(raw)),
                Section::Games => {
                    let games = catalog.games.get_or_insert_with(Games::default);
                    match RomEntry::parse(raw) {
                        Some(rom) => {
                            if games.roms.len() as u64 >= config.max_table_entries {
                                return Err(ParseError::CountOutOfRange {
                                    field: "roms",
                                    count: games.roms.len() as u64 + 1,
                                    limit: config.max_table_entries,
                                });
                            }
                            games.roms.push(rom);
                        }
                        None => games.additional.push(raw.to_string()),
                    }
                    continue;
                }
                Section::None | Section::Unknown => {
                    catalog.additional.push(raw.to_string());
                    continue;
                }
            };
            if !known {
                warn!(line = number + 1, "RomCenter line not recognized");
            }
        }

        trace!(
            roms = catalog.games.as_ref().map_or(0, |games| games.roms.len()),
            additional = catalog.additional.len(),
            "RomCenter catalog read"
        );
        Ok(catalog)
    }
}

impl Credits {
    fn apply(&mut self, raw: &str) -> bool {
        let Some((key, value)) = key_value(raw) else {
            self.additional.push(raw.to_string());
            return false;
        };
        let slot = match key.as_str() {
            "author" => &mut self.author,
            "version" => &mut self.version,
            "email" => &mut self.email,
            "homepage" => &mut self.homepage,
            "url" => &mut self.url,
            "date" => &mut self.date,
            "comment" => &mut self.comment,
            _ => {
                self.additional.push(raw.to_string());
                return false;
            }
        };
        *slot = Some(value);
        true
    }
}

impl DatSection {
    fn apply(&mut self, raw: &str) -> bool {
        let Some((key, value)) = key_value(raw) else {
            self.additional.push(raw.to_string());
            return false;
        };
        let slot = match key.as_str() {
            "version" => &mut self.version,
            "plugin" => &mut self.plugin,
            "split" => &mut self.split,
            "merge" => &mut self.merge,
            _ => {
                self.additional.push(raw.to_string());
                return false;
            }
        };
        *slot = Some(value);
        true
    }

    /// Whether the catalog describes split sets
    pub fn is_split(&self) -> bool {
        self.split.as_deref() == Some("1")
    }

    /// Whether the catalog describes merged sets
    pub fn is_merged(&self) -> bool {
        self.merge.as_deref() == Some("1")
    }
}

impl Emulator {
    fn apply(&mut self, raw: &str) -> bool {
        let Some((key, value)) = key_value(raw) else {
            self.additional.push(raw.to_string());
            return false;
        };
        let slot = match key.as_str() {
            "refname" => &mut self.ref_name,
            "version" => &mut self.version,
            _ => {
                self.additional.push(raw.to_string());
                return false;
            }
        };
        *slot = Some(value);
        true
    }
}

impl RomCenterCatalog {
    /// Roms belonging to the game `name`
    pub fn roms_of(&self, name: &str) -> Vec<&RomEntry> {
        self.games
            .iter()
            .flat_map(|games| &games.roms)
            .filter(|rom| rom.game_name == name)
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "\
[CREDITS]
author=Someone
Version=20240101
; generated
contact me
[DAT]
version=2.50
split=0
merge=1
[EMULATOR]
refname=MAME
[GAMES]
¬pacman¬Pac-Man¬pacman¬Pac-Man¬pacman.6e¬c1e6ab10¬4096¬¬¬
¬pacman¬Pac-Man¬puckman¬Puck Man¬pacman.6f¬1a6fb2d4¬4096¬pacman¬pacman.6f¬¬extra
not a rom
[SOMETHING]
key=value
";

    #[test]
    fn test_sections() {
        let catalog = RomCenterCatalog::parse_bytes(SAMPLE.as_bytes(), 0).expect("Operation should succeed");

        let credits = catalog.credits.as_ref().expect("Operation should succeed");
        assert_eq!(credits.author.as_deref(), Some("Someone"));
        assert_eq!(credits.version.as_deref(), Some("20240101"));
        assert_eq!(credits.additional, vec!["contact me".to_string()]);

        let dat = catalog.dat.as_ref().expect("Operation should succeed");
        assert!(!dat.is_split());
        assert!(dat.is_merged());
        assert_eq!(
            catalog.emulator.as_ref().and_then(|emulator| emulator.ref_name.as_deref()),
            Some("MAME")
        );

        let games = catalog.games.as_ref().expect("Operation should succeed");
        assert_eq!(games.roms.len(), 2);
        assert_eq!(games.additional, vec!["not a rom".to_string()]);
        assert_eq!(games.roms[0].rom_crc, "c1e6ab10");
        assert_eq!(games.roms[1].additional, vec!["extra".to_string()]);
        assert_eq!(catalog.roms_of("puckman").len(), 1);

        assert_eq!(
            catalog.additional,
            vec!["[SOMETHING]".to_string(), "key=value".to_string()]
        );
    }

    #[test]
    fn test_missing_sections_stay_absent() {
        let catalog = RomCenterCatalog::parse_bytes(b"[DAT]\nversion=1\n", 0).expect("Operation should succeed");
        assert!(catalog.credits.is_none());
        assert!(catalog.games.is_none());
        assert_eq!(catalog.dat.and_then(|dat| dat.version), Some("1".to_string()));
    }
}
