use std::collections::HashMap;
use std::path::Path;

use polars::prelude::*;
use thiserror::Error;

/// Display fallback for hotkeys the names file does not cover.
pub const UNKNOWN_NAME: &str = "Unknown";

#[derive(Debug, Error)]
pub enum NameError {
    #[error("failed to read hotkey names: {0}")]
    Table(#[from] PolarsError),
}

/// Optional hotkey -> human-readable name mapping.
#[derive(Clone, Debug, Default)]
pub struct NameTable {
    names: HashMap<String, String>,
}

impl NameTable {
    /// A missing file yields an empty table; a present but unreadable file
    /// is an error. Whether absence is fatal is the caller's decision.
    pub fn load(path: &Path) -> Result<NameTable, NameError> {
        if !path.exists() {
            return Ok(NameTable::default());
        }
        let df = CsvReader::from_path(path)?.has_header(true).finish()?;
        let keys = df.column("hotkey")?.cast(&DataType::Utf8)?;
        let keys = keys.utf8()?;
        let labels = df.column("hotkey_name")?.cast(&DataType::Utf8)?;
        let labels = labels.utf8()?;

        let mut names = HashMap::with_capacity(df.height());
        for (key, label) in keys.into_iter().zip(labels) {
            if let (Some(key), Some(label)) = (key, label) {
                names.insert(key.to_string(), label.to_string());
            }
        }
        Ok(NameTable { names })
    }

    pub fn get(&self, hotkey: &str) -> Option<&str> {
        self.names.get(hotkey).map(String::as_str)
    }

    /// Purely-for-display resolution; unnamed hotkeys show as "Unknown".
    pub fn display_name(&self, hotkey: &str) -> &str {
        self.get(hotkey).unwrap_or(UNKNOWN_NAME)
    }

    /// Resolution for sorting and legends; falls back to the hotkey itself
    /// so the result is always distinct and ordering stays total.
    pub fn sort_name<'a>(&'a self, hotkey: &'a str) -> &'a str {
        self.get(hotkey).unwrap_or(hotkey)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl FromIterator<(String, String)> for NameTable {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        NameTable {
            names: iter.into_iter().collect(),
        }
    }
}
