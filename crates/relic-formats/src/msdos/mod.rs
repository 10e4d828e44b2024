//! MS-DOS executable (MZ) header support
//!
//! The walker reads the 28-byte MZ header, the new-executable extension when
//! at least 36 bytes follow the header, and the relocation table the header
//! points at. A table address at or past the end of data means the
//! executable carries no table.

mod builder;
mod header;

pub use builder::ExecutableBuilder;
pub use header::{
    EXTENSION_SIZE, ExecutableHeader, HEADER_SIZE, HeaderExtension, RELOCATION_SIZE,
    RelocationEntry, SIGNATURE,
};

use crate::error::{BuildError, BuildResult};
use binrw::{BinWrite, io::Cursor as WriteCursor};
use relic_io::{Cursor, Format, ParseResult, ReaderConfig, gate, read_table};
use std::io::{Read, Seek};
use tracing::trace;

/// Complete MZ executable header area
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Executable {
    /// Standard header
    pub header: ExecutableHeader,
    /// New-executable extension, when enough data follows the header
    pub extension: Option<HeaderExtension>,
    /// Relocation table, when its address lies inside the data
    pub relocations: Option<Vec<RelocationEntry>>,
}

impl Format for Executable {
    const NAME: &'static str = "MZ";

    fn read<R: Read + Seek>(cursor: &mut Cursor<R>, config: &ReaderConfig) -> ParseResult<Self> {
        let origin = cursor.position();
        gate::expect_signature(Self::NAME, &cursor.peek_array::<2>()?, &SIGNATURE)?;
        let header: ExecutableHeader = cursor.read_le()?;

        let extension = if cursor.remaining() >= EXTENSION_SIZE {
            Some(cursor.read_le::<HeaderExtension>()?)
        } else {
            None
        };

        let table = origin + u64::from(header.relocation_table_addr);
        let relocations = if table >= cursor.len() {
            trace!(table, "MZ relocation table outside the data");
            None
        } else {
            cursor.set_position(table)?;
            Some(read_table(
                cursor,
                config,
                "relocation_items",
                u64::from(header.relocation_items),
                RELOCATION_SIZE,
                |c| Ok(c.read_le::<RelocationEntry>()?),
            )?)
        };

        Ok(Self {
            header,
            extension,
            relocations,
        })
    }
}

impl Executable {
    /// Offset of the new executable header, when the extension is present
    pub fn new_exe_header_addr(&self) -> Option<u32> {
        self.extension.map(|extension| extension.new_exe_header_addr)
    }

    /// Size of the load image described by the page fields
    pub fn image_size(&self) -> u64 {
        let pages = u64::from(self.header.pages);
        match self.header.last_page_bytes {
            0 => pages * 512,
            last => pages.saturating_sub(1) * 512 + u64::from(last),
        }
    }

    /// Serialize the header, extension and relocation table
    pub fn build(&self) -> BuildResult<Vec<u8>> {
        self.validate()?;

        let mut buffer = Vec::new();
        let mut cursor = WriteCursor::new(&mut buffer);
        self.header.write(&mut cursor)?;
        if let Some(extension) = &self.extension {
            extension.write(&mut cursor)?;
        }

        if let Some(relocations) = &self.relocations {
            let table = usize::from(self.header.relocation_table_addr);
            if buffer.len() < table {
                buffer.resize(table, 0);
            }
            let mut cursor = WriteCursor::new(&mut buffer);
            cursor.set_position(table as u64);
            for entry in relocations {
                entry.write(&mut cursor)?;
            }
        }
        Ok(buffer)
    }

    /// Check that the written bytes read back as this document
    pub fn validate(&self) -> BuildResult<()> {
        let header_end = HEADER_SIZE + self.extension.map_or(0, |_| EXTENSION_SIZE);
        let table = u64::from(self.header.relocation_table_addr);

        let end = match &self.relocations {
            Some(relocations) => {
                if relocations.len() != usize::from(self.header.relocation_items) {
                    return Err(BuildError::InvalidLayout(format!(
                        "header declares {} relocations, table holds {}",
                        self.header.relocation_items,
                        relocations.len()
                    )));
                }
                if table < header_end {
                    return Err(BuildError::InvalidLayout(
                        "relocation table overlaps the header".to_string(),
                    ));
                }
                let end = table + relocations.len() as u64 * RELOCATION_SIZE;
                if table >= end {
                    return Err(BuildError::InvalidLayout(
                        "empty relocation table would read back as absent".to_string(),
                    ));
                }
                end
            }
            None => {
                if table < header_end {
                    return Err(BuildError::InvalidLayout(
                        "absent relocation table must point past the end".to_string(),
                    ));
                }
                header_end
            }
        };

        if self.extension.is_none() && end - HEADER_SIZE >= EXTENSION_SIZE {
            return Err(BuildError::InvalidLayout(
                "data after the header would read back as an extension".to_string(),
            ));
        }
        Ok(())
    }
}
