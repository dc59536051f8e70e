use serde::{Deserialize, Serialize};

use super::traverse::TraversalOrder;

/// Sorting options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOptions {
    /// Whether members of the same kind are ordered by name.
    #[serde(default)]
    pub alphabetize: bool,

    /// Whether to ensure a trailing newline at end of file.
    #[serde(default = "default_true")]
    pub trailing_newline: bool,

    /// Walk order used when emitting tracked offsets.
    #[serde(default)]
    pub emission_order: TraversalOrder,
}

fn default_true() -> bool {
    true
}

impl Default for SortOptions {
    fn default() -> Self {
        Self {
            alphabetize: false,
            trailing_newline: true,
            emission_order: TraversalOrder::default(),
        }
    }
}

impl SortOptions {
    /// Create options that also order members by name.
    pub fn alphabetized() -> Self {
        Self {
            alphabetize: true,
            ..Default::default()
        }
    }
}
