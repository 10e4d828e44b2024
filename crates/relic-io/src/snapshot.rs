//! Immutable read-back access to a parsed source
//!
//! Parsed documents only describe where things are. When a caller later needs
//! the raw bytes behind a record, it goes through a [`Snapshot`]: a shared,
//! read-only copy of the source kept next to the document. Snapshots are
//! cheap to clone and can be read from several threads at once.

use crate::config::ReaderConfig;
use crate::cursor::{Cursor, SliceCursor};
use crate::error::ParseResult;
use crate::format::Format;
use std::path::Path;
use std::sync::Arc;

/// A parsed document together with the bytes it was parsed from
#[derive(Debug)]
pub struct Snapshot<T> {
    source: Arc<[u8]>,
    origin: usize,
    document: Arc<T>,
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            origin: self.origin,
            document: Arc::clone(&self.document),
        }
    }
}

impl<T: Format> Snapshot<T> {
    /// Parse `data[origin..]` and keep the bytes
    pub fn parse(data: impl Into<Arc<[u8]>>, origin: usize) -> ParseResult<Self> {
        Self::parse_with(data, origin, &ReaderConfig::default())
    }

    /// Parse with explicit limits and keep the bytes
    pub fn parse_with(
        data: impl Into<Arc<[u8]>>,
        origin: usize,
        config: &ReaderConfig,
    ) -> ParseResult<Self> {
        let source = data.into();
        let document = T::parse_bytes_with(&source, origin, config)?;
        Ok(Self {
            source,
            origin,
            document: Arc::new(document),
        })
    }

    /// Read a whole file into memory and parse it
    pub fn open(path: impl AsRef<Path>) -> ParseResult<Self> {
        let data = std::fs::read(path)?;
        Self::parse(data, 0)
    }
}

impl<T> Snapshot<T> {
    /// The parsed document
    pub fn document(&self) -> &T {
        &self.document
    }

    /// Bytes of the document, starting at its first byte
    pub fn bytes(&self) -> &[u8] {
        &self.source[self.origin..]
    }

    /// Raw bytes at `offset` relative to the document start
    ///
    /// Returns `None` when the range does not lie inside the source.
    pub fn read_range(&self, offset: u64, len: u64) -> Option<&[u8]> {
        let start = usize::try_from(offset).ok()?;
        let end = start.checked_add(usize::try_from(len).ok()?)?;
        self.bytes().get(start..end)
    }

    /// A fresh cursor over the document bytes
    pub fn cursor(&self) -> SliceCursor<'_> {
        Cursor::over(self.bytes())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::{Read, Seek};

    #[derive(Debug)]
    struct Blob {
        len: u8,
    }

    impl Format for Blob {
        const NAME: &'static str = "blob";

        fn read<R: Read + Seek>(cursor: &mut Cursor<R>, _config: &ReaderConfig) -> ParseResult<Self> {
            let len = cursor.read_u8()?;
            cursor.skip(u64::from(len))?;
            Ok(Self { len })
        }
    }

    #[test]
    fn test_read_back() {
        let data = vec![0xEE, 3, b'a', b'b', b'c'];
        let snapshot = Snapshot::<Blob>::parse(data, 1).expect("Operation should succeed");
        assert_eq!(snapshot.document().len, 3);
        assert_eq!(snapshot.read_range(1, 3), Some(&b"abc"[..]));
        assert_eq!(snapshot.read_range(2, 3), None);
        assert_eq!(snapshot.read_range(u64::MAX, 1), None);

        let mut cursor = snapshot.cursor();
        assert_eq!(cursor.read_u8().expect("Operation should succeed"), 3);
    }

    #[test]
    fn test_shared_across_threads() {
        let snapshot = Snapshot::<Blob>::parse(vec![2, 7, 9], 0).expect("Operation should succeed");
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let snapshot = snapshot.clone();
                std::thread::spawn(move || snapshot.read_range(1, 2).map(<[u8]>::to_vec))
            })
            .collect();
        for handle in handles {
            assert_eq!(
                handle.join().expect("Operation should succeed"),
                Some(vec![7, 9])
            );
        }
    }
}
