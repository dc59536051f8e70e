use serde::{Deserialize, Serialize};

use crate::sort::SortOptions;

/// Contents of `gdsort.toml`.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Path fragments to leave alone when walking directories.
    pub exclude: Vec<String>,
    pub sort: SortOptions,
}

impl Config {
    pub fn is_excluded(&self, path: &str) -> bool {
        self.exclude
            .iter()
            .any(|pattern| path.contains(pattern.trim_matches('*')))
    }
}
