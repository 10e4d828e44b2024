//! Microsoft Cabinet (CAB) support
//!
//! A cabinet starts with a CFHEADER whose flags decide which optional blocks
//! follow it: a reserved area, and links to the previous and next cabinet of
//! a spanning set. The folder table comes next; each folder points at its
//! chain of data blocks elsewhere in the file. The file table lives at an
//! offset stored in the header.
//!
//! Only the structure is decoded. Data blocks keep their compressed payload
//! as-is.

mod file;
mod folder;
mod header;

pub use file::{
    ATTR_ARCHIVE, ATTR_EXECUTE, ATTR_HIDDEN, ATTR_NAME_IS_UTF, ATTR_READ_ONLY, ATTR_SYSTEM,
    CabinetFile, FolderRef,
};
pub use folder::{CompressionType, DataBlock, Folder};
pub use header::{
    CabinetHeader, CabinetLink, FLAG_NEXT_CABINET, FLAG_PREV_CABINET, FLAG_RESERVE_PRESENT,
    MAX_HEADER_RESERVE, ReserveArea, SIGNATURE,
};

use binrw::Endian;
use relic_io::{Cursor, Format, ParseError, ParseResult, ReaderConfig, gate, read_table};
use std::io::{Read, Seek};
use tracing::trace;

/// Complete cabinet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cabinet {
    /// Cabinet header
    pub header: CabinetHeader,
    /// Folder table with each folder's data blocks
    pub folders: Vec<Folder>,
    /// File table
    pub files: Vec<CabinetFile>,
}

impl Format for Cabinet {
    const NAME: &'static str = "MSCF";

    fn read<R: Read + Seek>(cursor: &mut Cursor<R>, config: &ReaderConfig) -> ParseResult<Self> {
        let origin = cursor.position();
        gate::expect_signature(Self::NAME, &cursor.peek_array::<4>()?, &SIGNATURE)?;
        let header: CabinetHeader = cursor.read_le()?;

        if config.strict_declared_size {
            let available = cursor.len() - origin;
            if u64::from(header.cabinet_size) > available {
                return Err(ParseError::CountOutOfRange {
                    field: "cabinet_size",
                    count: u64::from(header.cabinet_size),
                    limit: available,
                });
            }
        }

        let folder_record = Folder::FIXED_SIZE + u64::from(header.folder_reserved_size());
        let folders = read_table(
            cursor,
            config,
            "folder_count",
            u64::from(header.folder_count),
            folder_record,
            |c| read_folder(c, config, &header, origin),
        )?;

        let files_offset = origin + u64::from(header.files_offset);
        if files_offset > cursor.len() {
            return Err(ParseError::OffsetOutOfRange {
                offset: files_offset,
                length: cursor.len(),
            });
        }
        cursor.set_position(files_offset)?;

        let files = read_table(
            cursor,
            config,
            "file_count",
            u64::from(header.file_count),
            CabinetFile::MIN_SIZE,
            |c| Ok(CabinetFile::read(c)?),
        )?;
        trace!(
            folders = folders.len(),
            files = files.len(),
            "cabinet tables read"
        );

        Ok(Self {
            header,
            folders,
            files,
        })
    }
}

/// Read a folder entry, then visit its data blocks and come back
fn read_folder<R: Read + Seek>(
    cursor: &mut Cursor<R>,
    config: &ReaderConfig,
    header: &CabinetHeader,
    origin: u64,
) -> ParseResult<Folder> {
    cursor.atomic(|c| {
        let mut folder: Folder =
            c.read_type(Endian::Little, (header.folder_reserved_size(),))?;
        if folder.cab_start_offset == 0 {
            return Ok(folder);
        }

        let reserved = header.data_reserved_size();
        let target = origin + u64::from(folder.cab_start_offset);
        let data_count = u64::from(folder.data_count);
        folder.data_blocks = c.at(target, |blocks| -> ParseResult<Vec<DataBlock>> {
            read_table(
                blocks,
                config,
                "data_count",
                data_count,
                DataBlock::FIXED_SIZE + u64::from(reserved),
                |b| Ok(b.read_type(Endian::Little, (reserved,))?),
            )
        })?;
        Ok(folder)
    })
}

impl Cabinet {
    /// Files whose data lives in the folder at `index`
    pub fn files_in_folder(&self, index: u16) -> impl Iterator<Item = &CabinetFile> {
        self.files
            .iter()
            .filter(move |file| file.folder() == FolderRef::Index(index))
    }

    /// Whether this cabinet is part of a multi-cabinet set
    pub fn is_spanned(&self) -> bool {
        self.header.previous.is_some() || self.header.next.is_some()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Assemble a cabinet with one stored folder holding `payload`
    fn sample(flags: u16, payload: &[u8]) -> Vec<u8> {
        let mut optional = Vec::new();
        if flags & FLAG_RESERVE_PRESENT != 0 {
            optional.extend_from_slice(&4u16.to_le_bytes());
            optional.push(2); // folder reserve
            optional.push(1); // data reserve
            optional.extend_from_slice(&[0xAB; 4]);
        }
        if flags & FLAG_PREV_CABINET != 0 {
            optional.extend_from_slice(b"disk0.cab\0Disk 0\0");
        }
        if flags & FLAG_NEXT_CABINET != 0 {
            optional.extend_from_slice(b"disk2.cab\0Disk 2\0");
        }
        let folder_reserve = usize::from(flags & FLAG_RESERVE_PRESENT != 0) * 2;
        let data_reserve = usize::from(flags & FLAG_RESERVE_PRESENT != 0);

        let folder_at = 36 + optional.len();
        let files_at = folder_at + 8 + folder_reserve;
        let file_entry = {
            let mut entry = Vec::new();
            entry.extend_from_slice(&(payload.len() as u32).to_le_bytes());
            entry.extend_from_slice(&0u32.to_le_bytes());
            entry.extend_from_slice(&0u16.to_le_bytes());
            entry.extend_from_slice(&0x3A21u16.to_le_bytes());
            entry.extend_from_slice(&0u16.to_le_bytes());
            entry.extend_from_slice(&ATTR_ARCHIVE.to_le_bytes());
            entry.extend_from_slice(b"readme.txt\0");
            entry
        };
        let data_at = files_at + file_entry.len();
        let total = data_at + 8 + data_reserve + payload.len();

        let mut data = Vec::new();
        data.extend_from_slice(&SIGNATURE);
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&(total as u32).to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&(files_at as u32).to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&[3, 1]);
        data.extend_from_slice(&1u16.to_le_bytes()); // folders
        data.extend_from_slice(&1u16.to_le_bytes()); // files
        data.extend_from_slice(&flags.to_le_bytes());
        data.extend_from_slice(&0x1234u16.to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&optional);

        data.extend_from_slice(&(data_at as u32).to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&0u16.to_le_bytes());
        data.extend(std::iter::repeat_n(0xCD, folder_reserve));

        data.extend_from_slice(&file_entry);

        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&(payload.len() as u16).to_le_bytes());
        data.extend_from_slice(&(payload.len() as u16).to_le_bytes());
        data.extend(std::iter::repeat_n(0xEF, data_reserve));
        data.extend_from_slice(payload);
        assert_eq!(data.len(), total);
        data
    }

    #[test]
    fn test_plain_cabinet() {
        let data = sample(0, b"hello");
        let cabinet = Cabinet::parse_bytes(&data, 0).expect("Operation should succeed");

        assert_eq!(cabinet.header.reserve, None);
        assert_eq!(cabinet.header.previous, None);
        assert!(!cabinet.is_spanned());
        assert_eq!(cabinet.folders.len(), 1);
        assert_eq!(cabinet.folders[0].compression_type(), CompressionType::None);
        assert_eq!(cabinet.folders[0].data_blocks.len(), 1);
        assert_eq!(cabinet.folders[0].data_blocks[0].data, b"hello");
        assert_eq!(cabinet.folders[0].uncompressed_size(), 5);
        assert_eq!(cabinet.files.len(), 1);
        assert_eq!(cabinet.files[0].name, "readme.txt");
        assert_eq!(cabinet.files_in_folder(0).count(), 1);
    }

    #[test]
    fn test_optional_blocks_follow_flags() {
        let flags = FLAG_RESERVE_PRESENT | FLAG_PREV_CABINET | FLAG_NEXT_CABINET;
        let data = sample(flags, b"abc");
        let cabinet = Cabinet::parse_bytes(&data, 0).expect("Operation should succeed");

        let reserve = cabinet.header.reserve.as_ref().expect("Operation should succeed");
        assert_eq!(reserve.data, vec![0xAB; 4]);
        assert_eq!(cabinet.folders[0].reserved, vec![0xCD; 2]);
        assert_eq!(cabinet.folders[0].data_blocks[0].reserved, vec![0xEF]);
        assert_eq!(
            cabinet.header.previous,
            Some(CabinetLink {
                cabinet: "disk0.cab".to_string(),
                disk: "Disk 0".to_string()
            })
        );
        assert_eq!(
            cabinet.header.next.as_ref().map(|link| link.cabinet.as_str()),
            Some("disk2.cab")
        );
        assert!(cabinet.is_spanned());
    }

    #[test]
    fn test_oversized_reserve_rejected() {
        let mut data = sample(FLAG_RESERVE_PRESENT, b"x");
        data[36..38].copy_from_slice(&60_001u16.to_le_bytes());
        assert!(Cabinet::from_bytes(&data, 0).is_none());
    }

    #[test]
    fn test_embedded_cabinet() {
        let mut data = vec![0u8; 32];
        data.extend(sample(FLAG_NEXT_CABINET, b"payload"));
        let cabinet = Cabinet::parse_bytes(&data, 32).expect("Operation should succeed");
        assert_eq!(cabinet.folders[0].data_blocks[0].data, b"payload");
    }

    #[test]
    fn test_truncated_data_block_rejected() {
        let mut data = sample(0, b"hello world");
        data.truncate(data.len() - 3);
        assert!(Cabinet::from_bytes(&data, 0).is_none());
    }

    #[test]
    fn test_strict_cabinet_size() {
        let mut data = sample(0, b"abc");
        let declared = data.len() as u32 + 100;
        data[8..12].copy_from_slice(&declared.to_le_bytes());

        assert!(Cabinet::parse_bytes(&data, 0).is_ok());
        let strict = ReaderConfig::default().strict();
        assert!(matches!(
            Cabinet::parse_bytes_with(&data, 0, &strict),
            Err(ParseError::CountOutOfRange {
                field: "cabinet_size",
                ..
            })
        ));
    }
    #[test]
    fn test_utf16_name_keeps_later_entries_aligned() {
        fn file_entry(size: u32, start: u32, attributes: u16, name: &[u8]) -> Vec<u8> {
            let mut entry = Vec::new();
            entry.extend_from_slice(&size.to_le_bytes());
            entry.extend_from_slice(&start.to_le_bytes());
            entry.extend_from_slice(&0u16.to_le_bytes());
            entry.extend_from_slice(&0x3A21u16.to_le_bytes());
            entry.extend_from_slice(&0u16.to_le_bytes());
            entry.extend_from_slice(&attributes.to_le_bytes());
            entry.extend_from_slice(name);
            entry
        }

        let mut wide = relic_io::Encoding::Utf16Le.encode("ab");
        wide.extend_from_slice(&[0, 0]);
        let mut files = file_entry(5, 0, ATTR_NAME_IS_UTF, &wide);
        files.extend(file_entry(2, 5, ATTR_ARCHIVE, b"b.txt\0"));

        let payload = b"hello12";
        let files_at = 36 + 8;
        let data_at = files_at + files.len();
        let total = data_at + 8 + payload.len();

        let mut data = Vec::new();
        data.extend_from_slice(&SIGNATURE);
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&(total as u32).to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&(files_at as u32).to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&[3, 1]);
        data.extend_from_slice(&1u16.to_le_bytes()); // folders
        data.extend_from_slice(&2u16.to_le_bytes()); // files
        data.extend_from_slice(&0u16.to_le_bytes());
        data.extend_from_slice(&0x1234u16.to_le_bytes());
        data.extend_from_slice(&0u16.to_le_bytes());

        data.extend_from_slice(&(data_at as u32).to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&0u16.to_le_bytes());
        data.extend_from_slice(&files);

        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&(payload.len() as u16).to_le_bytes());
        data.extend_from_slice(&(payload.len() as u16).to_le_bytes());
        data.extend_from_slice(payload);
        assert_eq!(data.len(), total);

        let cabinet = Cabinet::parse_bytes(&data, 0).expect("Operation should succeed");
        assert_eq!(cabinet.files.len(), 2);
        assert_eq!(cabinet.files[0].name, "ab");
        assert_eq!(cabinet.files[0].file_size, 5);
        assert_eq!(cabinet.files[1].name, "b.txt");
        assert_eq!(cabinet.files[1].file_size, 2);
        assert_eq!(cabinet.files[1].folder_start_offset, 5);
        assert_eq!(cabinet.files[1].attributes, ATTR_ARCHIVE);
        assert_eq!(cabinet.folders[0].data_blocks[0].data, payload);
    }
}
