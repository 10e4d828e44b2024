//! Builder pattern for creating MZ executables

use crate::error::{BuildError, BuildResult, narrow};
use crate::msdos::{
    EXTENSION_SIZE, Executable, ExecutableHeader, HEADER_SIZE, HeaderExtension, RELOCATION_SIZE,
    RelocationEntry,
};

/// Builder for MZ executables
///
/// The relocation table is placed directly after the header. Without an
/// extension the table must stay shorter than the extension, otherwise a
/// reader would take the table for extension fields.
#[derive(Debug, Clone, Default)]
pub struct ExecutableBuilder {
    header: ExecutableHeader,
    extension: Option<HeaderExtension>,
    relocations: Vec<RelocationEntry>,
}

impl ExecutableBuilder {
    /// Start from a header with only the signature set
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial CS:IP
    #[must_use]
    pub fn entry_point(mut self, cs: u16, ip: u16) -> Self {
        self.header.initial_cs = cs;
        self.header.initial_ip = ip;
        self
    }

    /// Set the initial SS:SP
    #[must_use]
    pub fn stack(mut self, ss: u16, sp: u16) -> Self {
        self.header.initial_ss = ss;
        self.header.initial_sp = sp;
        self
    }

    /// Add the extension pointing at a new executable header
    #[must_use]
    pub fn new_exe_header(mut self, addr: u32) -> Self {
        self.extension = Some(HeaderExtension {
            new_exe_header_addr: addr,
            ..HeaderExtension::default()
        });
        self
    }

    /// Add a relocation entry
    #[must_use]
    pub fn add_relocation(mut self, segment: u16, offset: u16) -> Self {
        self.relocations.push(RelocationEntry { offset, segment });
        self
    }

    /// Lay out the header and relocation table
    pub fn build(self) -> BuildResult<Executable> {
        let table_addr = HEADER_SIZE + self.extension.map_or(0, |_| EXTENSION_SIZE);
        let table_size = self.relocations.len() as u64 * RELOCATION_SIZE;
        if self.extension.is_none() && table_size >= EXTENSION_SIZE {
            return Err(BuildError::InvalidLayout(format!(
                "{} relocations need a header extension",
                self.relocations.len()
            )));
        }

        let end = table_addr + table_size;
        let mut header = self.header;
        header.relocation_items = narrow("relocation_items", self.relocations.len() as u64)?;
        header.relocation_table_addr = narrow("relocation_table_addr", table_addr)?;
        header.header_paragraph_size = narrow("header_paragraph_size", end.div_ceil(16))?;
        header.pages = narrow("pages", end.div_ceil(512))?;
        header.last_page_bytes = (end % 512) as u16;

        // A table that starts at the end of the file reads back as absent
        let relocations = (!self.relocations.is_empty()).then_some(self.relocations);
        if relocations.is_none() {
            header.relocation_table_addr = narrow("relocation_table_addr", end)?;
        }

        Ok(Executable {
            header,
            extension: self.extension,
            relocations,
        })
    }
}
