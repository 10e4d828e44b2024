//! Reader limits shared by every walker

use serde::{Deserialize, Serialize};

/// Default cap on any declared table length
pub const DEFAULT_MAX_TABLE_ENTRIES: u64 = 1 << 20;

/// Limits applied while parsing untrusted input
///
/// Loaded from JSON with missing keys falling back to the defaults:
///
/// ```rust
/// use relic_io::ReaderConfig;
///
/// let config = ReaderConfig::from_json(r#"{ "max_source_length": 1048576 }"#).unwrap();
/// assert_eq!(config.max_source_length, Some(1_048_576));
/// assert!(!config.strict_declared_size);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Reject sources longer than this before any read happens
    pub max_source_length: Option<u64>,
    /// Largest record count any table may declare
    pub max_table_entries: u64,
    /// Require the final position to agree with declared total sizes
    pub strict_declared_size: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            max_source_length: None,
            max_table_entries: DEFAULT_MAX_TABLE_ENTRIES,
            strict_declared_size: false,
        }
    }
}

impl ReaderConfig {
    /// Parse a configuration from JSON
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Set the source size limit
    #[must_use]
    pub fn with_max_source_length(mut self, limit: u64) -> Self {
        self.max_source_length = Some(limit);
        self
    }

    /// Set the table length limit
    #[must_use]
    pub fn with_max_table_entries(mut self, limit: u64) -> Self {
        self.max_table_entries = limit;
        self
    }

    /// Enable declared-size checks
    #[must_use]
    pub fn strict(mut self) -> Self {
        self.strict_declared_size = true;
        self
    }
}
