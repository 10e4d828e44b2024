#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
//! End-to-end walks through the public entry points

use pretty_assertions::assert_eq;
use relic_formats::{
    bfpk::{Archive, ArchiveBuilder},
    msdos::{Executable, ExecutableBuilder},
    pak::{Package, PackageBuilder},
    quantum::Quantum,
};
use relic_io::{Cursor, Format, ParseError, ReaderConfig, Snapshot, read_var_length};
use std::io::{Cursor as IoCursor, Seek, SeekFrom, Write};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

const EMPTY_BFPK: [u8; 12] = *b"BFPK\x01\0\0\0\0\0\0\0";

#[test]
fn minimal_bfpk_header() {
    init_tracing();
    let archive = Archive::parse_bytes(&EMPTY_BFPK, 0).expect("Operation should succeed");
    assert_eq!(archive.header.version, 1);
    assert!(archive.files.is_empty());

    let mut flipped = EMPTY_BFPK;
    flipped[0] ^= 0xFF;
    assert!(Archive::from_bytes(&flipped, 0).is_none());
    assert!(matches!(
        Archive::parse_bytes(&flipped, 0),
        Err(ParseError::InvalidSignature { format: "BFPK", .. })
    ));
}

#[test]
fn bfpk_through_every_entry_point() {
    init_tracing();
    let archive = ArchiveBuilder::new(3)
        .add_file("maps/e1m1.bsp", 9000, 4000)
        .add_file("sound/door.wav", 120, 120)
        .build()
        .expect("Operation should succeed");
    let bytes = archive.build().expect("Operation should succeed");

    // Embedded at an offset inside a larger buffer
    let mut host = vec![0x5A; 100];
    host.extend_from_slice(&bytes);
    assert_eq!(Archive::from_bytes(&host, 100).as_ref(), Some(&archive));

    // A stream keeps its current position as the document start
    let mut stream = IoCursor::new(host.clone());
    stream.seek(SeekFrom::Start(100)).expect("Operation should succeed");
    assert_eq!(Archive::from_stream(stream).as_ref(), Some(&archive));

    let mut file = tempfile::NamedTempFile::new().expect("Operation should succeed");
    file.write_all(&bytes).expect("Operation should succeed");
    file.flush().expect("Operation should succeed");
    assert_eq!(Archive::from_file(file.path()), Some(archive));
}

#[test]
fn table_counts_are_honored_in_order() {
    let names: Vec<String> = (0..40).map(|index| format!("item{index:02}")).collect();
    let package = names
        .iter()
        .fold(PackageBuilder::new(), |builder, name| builder.add_item(name.clone(), 4))
        .build()
        .expect("Operation should succeed");
    let bytes = package.build().expect("Operation should succeed");

    let parsed = Package::parse_bytes(&bytes, 0).expect("Operation should succeed");
    assert_eq!(parsed.items.len(), 40);
    let parsed_names: Vec<&str> = parsed.items.iter().map(|item| item.name.as_str()).collect();
    assert_eq!(parsed_names, names.iter().map(String::as_str).collect::<Vec<_>>());
}

#[test]
fn table_entry_limit_applies() {
    let package = (0..10)
        .fold(PackageBuilder::new(), |builder, index| builder.add_item(format!("f{index}"), 1))
        .build()
        .expect("Operation should succeed");
    let bytes = package.build().expect("Operation should succeed");

    let config = ReaderConfig::default().with_max_table_entries(9);
    assert!(matches!(
        Package::parse_bytes_with(&bytes, 0, &config),
        Err(ParseError::CountOutOfRange { count: 10, limit: 9, .. })
    ));
    let config = ReaderConfig::default().with_max_table_entries(10);
    assert!(Package::parse_bytes_with(&bytes, 0, &config).is_ok());
}

#[test]
fn source_length_limit_applies() {
    let config = ReaderConfig::default().with_max_source_length(11);
    assert!(matches!(
        Archive::parse_bytes_with(&EMPTY_BFPK, 0, &config),
        Err(ParseError::SourceTooLarge { length: 12, limit: 11 })
    ));
}

#[test]
fn quantum_length_prefixes() {
    let mut short = Cursor::over(&[0x05]);
    assert_eq!(read_var_length(&mut short).expect("Operation should succeed"), 5);
    assert!(short.is_at_end());

    let mut long = Cursor::over(&[0x85, 0x2A]);
    assert_eq!(read_var_length(&mut long).expect("Operation should succeed"), 1322);
    assert!(long.is_at_end());

    // A two-byte prefix cut short consumes nothing
    let mut cut = Cursor::over(&[0x85]);
    assert!(read_var_length(&mut cut).is_err());
    assert_eq!(cut.position(), 0);

    let mut data = b"DS\x00\x03\x01\x00\x07\x00".to_vec();
    data.push(0x05);
    data.extend_from_slice(b"a.txt");
    data.push(0x00);
    data.extend_from_slice(&100u32.to_le_bytes());
    data.extend_from_slice(&[0; 4]);
    let archive = Quantum::parse_bytes(&data, 0).expect("Operation should succeed");
    assert_eq!(archive.files[0].name, "a.txt");
    assert_eq!(archive.compressed_data_offset, data.len() as u64);
}

#[test]
fn snapshot_reads_item_bytes_back() {
    let package = PackageBuilder::new()
        .add_item("readme.txt", 5)
        .build()
        .expect("Operation should succeed");
    let mut bytes = package.build().expect("Operation should succeed");
    let start = package.items[0].offset as usize;
    bytes[start..start + 5].copy_from_slice(b"hello");

    let snapshot = Snapshot::<Package>::parse(bytes, 0).expect("Operation should succeed");
    let item = &snapshot.document().items[0];
    assert_eq!(
        snapshot.read_range(u64::from(item.offset), u64::from(item.length)),
        Some(&b"hello"[..])
    );
    assert_eq!(snapshot.read_range(u64::from(item.offset), u64::MAX), None);

    let shared = snapshot.clone();
    let handle = std::thread::spawn(move || shared.document().items.len());
    assert_eq!(handle.join().expect("Operation should succeed"), 1);
}

mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    fn name() -> impl Strategy<Value = String> {
        "[a-z0-9_/]{1,40}\\.[a-z]{3}"
    }

    proptest! {
        /// Built archives parse back to the same document
        #[test]
        fn bfpk_round_trip(
            version in any::<i32>(),
            files in prop::collection::vec((name(), 0i32..100_000, 0i32..2048), 0..12),
        ) {
            let archive = files
                .into_iter()
                .fold(ArchiveBuilder::new(version), |builder, (name, size, packed)| {
                    builder.add_file(name, size, packed)
                })
                .build()
                .expect("Operation should succeed");
            let bytes = archive.build().expect("Operation should succeed");
            prop_assert_eq!(Archive::parse_bytes(&bytes, 0).expect("Operation should succeed"), archive);
        }

        /// Built packages parse back to the same document
        #[test]
        fn pak_round_trip(items in prop::collection::vec((name(), 0u32..4096), 0..16)) {
            let package = items
                .into_iter()
                .fold(PackageBuilder::new(), |builder, (name, length)| builder.add_item(name, length))
                .build()
                .expect("Operation should succeed");
            let bytes = package.build().expect("Operation should succeed");
            prop_assert_eq!(Package::parse_bytes(&bytes, 0).expect("Operation should succeed"), package);
        }

        /// Executables with extension and relocations survive a round trip
        #[test]
        fn msdos_round_trip(
            cs in any::<u16>(),
            ip in any::<u16>(),
            new_exe in 0x40u32..0x10000,
            relocations in prop::collection::vec((any::<u16>(), any::<u16>()), 0..24),
        ) {
            let exe = relocations
                .into_iter()
                .fold(
                    ExecutableBuilder::new().entry_point(cs, ip).new_exe_header(new_exe),
                    |builder, (segment, offset)| builder.add_relocation(segment, offset),
                )
                .build()
                .expect("Operation should succeed");
            let bytes = exe.build().expect("Operation should succeed");
            prop_assert_eq!(Executable::parse_bytes(&bytes, 0).expect("Operation should succeed"), exe);
        }
    }
}
