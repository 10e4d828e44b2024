//! Builder pattern for creating packages

use crate::error::{BuildResult, narrow};
use crate::pak::{DirectoryItem, HEADER_SIZE, ITEM_SIZE, Package, PakHeader, SIGNATURE};

/// Builder for packages
///
/// Item data is laid out back to back after the header and the directory is
/// placed after the last item.
#[derive(Debug, Clone, Default)]
pub struct PackageBuilder {
    items: Vec<(String, u32)>,
}

impl PackageBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item of `length` bytes
    #[must_use]
    pub fn add_item(mut self, name: impl Into<String>, length: u32) -> Self {
        self.items.push((name.into(), length));
        self
    }

    /// Assign offsets and produce the package
    pub fn build(self) -> BuildResult<Package> {
        let mut next = HEADER_SIZE;
        let mut items = Vec::with_capacity(self.items.len());
        for (name, length) in self.items {
            items.push(DirectoryItem {
                name,
                offset: narrow("offset", next)?,
                length,
            });
            next += u64::from(length);
        }

        Ok(Package {
            header: PakHeader {
                magic: SIGNATURE,
                directory_offset: narrow("directory_offset", next)?,
                directory_length: narrow("directory_length", items.len() as u64 * ITEM_SIZE)?,
            },
            items,
        })
    }
}
