//! Nintendo 3DS cart image (NCSD) support
//!
//! A cart image opens with a signed NCSD header, a card info header and a
//! development card info block. The partition table in the NCSD header
//! points at up to eight NCCH partitions, measured in media units whose size
//! comes from the header's partition flags.
//!
//! Each partition starts with an NCCH header. Readable, unencrypted
//! partitions additionally expose an extended header right after the NCCH
//! header, and ExeFS and RomFS headers at unit offsets stored in it.
//! Partitions that are missing, out of range, or carry a bad magic are
//! skipped rather than failing the whole image.

mod fs;
mod ncch;
mod ncsd;

pub use fs::{ExeFsFile, ExeFsHeader, HashLevel, ROMFS_MAGIC, ROMFS_VERSION, RomFsHeader};
pub use ncch::{
    AccessControlInfo, BITMASK_NO_CRYPTO, CodeSetInfo, EXTENDED_HEADER_SIZE, ExtendedHeader,
    NCCH_HEADER_SIZE, NCCH_MAGIC, NcchFlags, NcchHeader, SystemControlInfo,
};
pub use ncsd::{
    BASE_MEDIA_UNIT, CardInfoHeader, CartLayout, DevelopmentCardInfo, FS_TYPE_FIRM,
    FS_TYPE_NONE, FS_TYPE_NORMAL, HeaderLayout, MEDIA_UNIT_SIZE_INDEX, NCSD_MAGIC,
    NcsdHeader, PartitionEntry,
};

use binrw::Endian;
use relic_io::{Cursor, Encoding, Format, ParseError, ParseResult, ReadResult, ReaderConfig, gate};
use std::io::{Read, Seek};
use tracing::{trace, warn};

/// Decode a NUL-padded ASCII field
fn fixed_ascii(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    Encoding::Ascii.decode(&bytes[..end])
}

/// One readable partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    /// NCCH header
    pub header: NcchHeader,
    /// Extended header, when present and readable
    pub extended_header: Option<ExtendedHeader>,
    /// ExeFS header, when present and readable
    pub exefs: Option<ExeFsHeader>,
    /// RomFS header, when present and readable
    pub romfs: Option<RomFsHeader>,
}

/// Complete cart image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cart {
    /// NCSD header
    pub header: NcsdHeader,
    /// Card info header
    pub card_info: CardInfoHeader,
    /// Development card info
    pub development_card_info: DevelopmentCardInfo,
    /// One slot per partition table entry; `None` for skipped partitions
    pub partitions: Vec<Option<Partition>>,
}

impl Format for Cart {
    const NAME: &'static str = "NCSD";

    fn read<R: Read + Seek>(cursor: &mut Cursor<R>, _config: &ReaderConfig) -> ParseResult<Self> {
        let origin = cursor.position();
        let lead = cursor.peek_array::<0x104>()?;
        gate::expect_signature(Self::NAME, &lead[0x100..], &NCSD_MAGIC)?;

        let header: NcsdHeader = cursor.read_le()?;
        let media_unit = header
            .media_unit_size()
            .ok_or(ParseError::InvalidField {
                field: "media_unit_size",
                value: i64::from(partition_flag(&header)),
            })?;
        let card_info: CardInfoHeader = cursor.read_le()?;
        let development_card_info: DevelopmentCardInfo = cursor.read_le()?;

        let mut partitions = Vec::with_capacity(header.partition_table.len());
        for (index, entry) in header.partition_table.iter().enumerate() {
            partitions.push(read_partition(cursor, origin, media_unit, index, entry)?);
        }
        trace!(
            media_unit,
            readable = partitions.iter().flatten().count(),
            "N3DS partitions read"
        );

        Ok(Self {
            header,
            card_info,
            development_card_info,
            partitions,
        })
    }
}

fn partition_flag(header: &NcsdHeader) -> u8 {
    match &header.layout {
        HeaderLayout::Cart(cart) => cart.partition_flags[MEDIA_UNIT_SIZE_INDEX],
        HeaderLayout::Firm { .. } => 0,
    }
}

/// Byte position of a unit offset, if it lies inside the view
fn unit_position(units: u64, media_unit: u64, origin: u64, len: u64) -> Option<u64> {
    units
        .checked_mul(media_unit)?
        .checked_add(origin)
        .filter(|&position| position < len)
}

/// Keep I/O failures, turn malformed optional blocks into `None`
fn optional<T>(result: ReadResult<T>) -> ParseResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_io() => Err(err.into()),
        Err(_) => Ok(None),
    }
}

fn read_partition<R: Read + Seek>(
    cursor: &mut Cursor<R>,
    origin: u64,
    media_unit: u64,
    index: usize,
    entry: &PartitionEntry,
) -> ParseResult<Option<Partition>> {
    if entry.length == 0 {
        return Ok(None);
    }
    let Some(start) = unit_position(u64::from(entry.offset), media_unit, origin, cursor.len())
    else {
        warn!(index, offset = entry.offset, "N3DS partition outside the image, skipped");
        return Ok(None);
    };

    let header = optional(cursor.at(start, |c| {
        c.read_type::<NcchHeader>(Endian::Little, (true,))
    }))?;
    let Some(header) = header.filter(NcchHeader::is_valid) else {
        warn!(index, start, "N3DS partition without a readable NCCH header, skipped");
        return Ok(None);
    };

    if header.is_encrypted() {
        trace!(index, "N3DS partition encrypted, sub-headers not read");
        return Ok(Some(Partition {
            header,
            extended_header: None,
            exefs: None,
            romfs: None,
        }));
    }

    let extended_header = if header.extended_header_size > 0 {
        optional(cursor.at(start + NCCH_HEADER_SIZE, |c| c.read_le::<ExtendedHeader>()))?
    } else {
        None
    };

    let partition_units = u64::from(entry.offset);
    let len = cursor.len();
    let exefs = match unit_position(
        partition_units + u64::from(header.exefs_offset),
        media_unit,
        origin,
        len,
    ) {
        Some(position) if header.exefs_size > 0 => {
            optional(cursor.at(position, |c| c.read_le::<ExeFsHeader>()))?
        }
        _ => None,
    };
    let romfs = match unit_position(
        partition_units + u64::from(header.romfs_offset),
        media_unit,
        origin,
        len,
    ) {
        Some(position) if header.romfs_size > 0 => {
            optional(cursor.at(position, |c| c.read_le::<RomFsHeader>()))?
        }
        _ => None,
    };

    Ok(Some(Partition {
        header,
        extended_header,
        exefs,
        romfs,
    }))
}

impl Cart {
    /// Size of one media unit in bytes
    pub fn media_unit_size(&self) -> u64 {
        self.header.media_unit_size().unwrap_or(BASE_MEDIA_UNIT)
    }

    /// Byte offset and length of the partition at `index`
    pub fn partition_range(&self, index: usize) -> Option<(u64, u64)> {
        let entry = self.header.partition_table.get(index)?;
        let unit = self.media_unit_size();
        Some((
            u64::from(entry.offset).checked_mul(unit)?,
            u64::from(entry.length).checked_mul(unit)?,
        ))
    }

    /// Partitions that were read, with their table index
    pub fn readable_partitions(&self) -> impl Iterator<Item = (usize, &Partition)> {
        self.partitions
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|partition| (index, partition)))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PARTITION: usize = 0x4000;
    const NCCH: usize = PARTITION + 0x100;

    fn put(data: &mut [u8], at: usize, bytes: &[u8]) {
        data[at..at + bytes.len()].copy_from_slice(bytes);
    }

    /// Image with one readable partition and two broken table entries
    fn sample() -> Vec<u8> {
        let mut data = vec![0u8; 0x4E00];
        put(&mut data, 0x100, &NCSD_MAGIC);
        put(&mut data, 0x104, &0x27u32.to_le_bytes());
        put(&mut data, 0x110, &FS_TYPE_NORMAL.to_le_bytes());
        // Partition 0 at 0x4000, 1 past the end, 2 on top of the RomFS
        put(&mut data, 0x120, &0x20u32.to_le_bytes());
        put(&mut data, 0x124, &0x07u32.to_le_bytes());
        put(&mut data, 0x128, &0x30u32.to_le_bytes());
        put(&mut data, 0x12C, &0x01u32.to_le_bytes());
        put(&mut data, 0x130, &0x26u32.to_le_bytes());
        put(&mut data, 0x134, &0x01u32.to_le_bytes());

        put(&mut data, NCCH, &NCCH_MAGIC);
        put(&mut data, NCCH + 0x50, b"CTR-P-RELC");
        put(&mut data, NCCH + 0x80, &0x400u32.to_le_bytes());
        put(&mut data, NCCH + 0x8F, &[BITMASK_NO_CRYPTO]);
        put(&mut data, NCCH + 0xA0, &5u32.to_le_bytes());
        put(&mut data, NCCH + 0xA4, &1u32.to_le_bytes());
        put(&mut data, NCCH + 0xB0, &6u32.to_le_bytes());
        put(&mut data, NCCH + 0xB4, &1u32.to_le_bytes());

        put(&mut data, PARTITION + 0x200, b"RELICAPP");
        put(&mut data, PARTITION + 0xA00, b"code\0\0\0\0");
        put(&mut data, PARTITION + 0xA0C, &0x100u32.to_le_bytes());

        put(&mut data, PARTITION + 0xC00, &ROMFS_MAGIC);
        put(&mut data, PARTITION + 0xC04, &ROMFS_VERSION.to_le_bytes());
        put(&mut data, PARTITION + 0xC08, &0x20u32.to_le_bytes());
        data
    }

    #[test]
    fn test_cart_partitions() {
        let data = sample();
        let cart = Cart::parse_bytes(&data, 0).expect("Operation should succeed");

        assert_eq!(cart.media_unit_size(), 0x200);
        assert_eq!(cart.partitions.len(), 8);
        assert_eq!(cart.partition_range(0), Some((0x4000, 0xE00)));

        let partition = cart.partitions[0].as_ref().expect("Operation should succeed");
        assert_eq!(partition.header.product_code, "CTR-P-RELC");
        assert!(!partition.header.is_encrypted());
        let extended = partition.extended_header.as_ref().expect("Operation should succeed");
        assert_eq!(extended.system_control.application_title, "RELICAPP");
        let exefs = partition.exefs.as_ref().expect("Operation should succeed");
        assert_eq!(exefs.used_files().count(), 1);
        assert_eq!(exefs.files[0].size, 0x100);
        let romfs = partition.romfs.as_ref().expect("Operation should succeed");
        assert_eq!(romfs.master_hash_size, 0x20);

        assert!(cart.partitions[1].is_none());
        assert!(cart.partitions[2].is_none());
        assert_eq!(cart.readable_partitions().count(), 1);
    }

    #[test]
    fn test_encrypted_partition_keeps_only_its_header() {
        let mut data = sample();
        data[NCCH + 0x8F] = 0;
        let cart = Cart::parse_bytes(&data, 0).expect("Operation should succeed");
        let partition = cart.partitions[0].as_ref().expect("Operation should succeed");
        assert!(partition.header.is_encrypted());
        assert_eq!(partition.extended_header, None);
        assert_eq!(partition.exefs, None);
    }

    #[test]
    fn test_bad_romfs_magic_skips_romfs() {
        let mut data = sample();
        data[PARTITION + 0xC00] = b'X';
        let cart = Cart::parse_bytes(&data, 0).expect("Operation should succeed");
        let partition = cart.partitions[0].as_ref().expect("Operation should succeed");
        assert_eq!(partition.romfs, None);
        assert!(partition.exefs.is_some());
    }

    #[test]
    fn test_firm_layout() {
        let mut data = sample();
        put(&mut data, 0x110, &FS_TYPE_FIRM.to_le_bytes());
        let cart = Cart::parse_bytes(&data, 0).expect("Operation should succeed");
        assert!(matches!(cart.header.layout, HeaderLayout::Firm { .. }));
        assert!(cart.partitions[0].is_some());
    }

    #[test]
    fn test_unknown_filesystem_type_rejected() {
        let mut data = sample();
        put(&mut data, 0x110, &2u64.to_le_bytes());
        assert!(Cart::from_bytes(&data, 0).is_none());
    }

    #[test]
    fn test_media_unit_scaling() {
        let mut data = sample();
        // Doubling the unit moves partition 0 past the end of the image
        data[0x188 + MEDIA_UNIT_SIZE_INDEX] = 1;
        let cart = Cart::parse_bytes(&data, 0).expect("Operation should succeed");
        assert_eq!(cart.media_unit_size(), 0x400);
        assert!(cart.partitions[0].is_none());

        data[0x188 + MEDIA_UNIT_SIZE_INDEX] = 0xC8;
        assert!(matches!(
            Cart::parse_bytes(&data, 0),
            Err(ParseError::InvalidField { field: "media_unit_size", value: 200 })
        ));
    }

    #[test]
    fn test_truncated_card_info_rejected() {
        let mut data = sample();
        data.truncate(0x3000);
        assert!(Cart::from_bytes(&data, 0).is_none());
    }
}
