use once_cell::sync::Lazy;
use regex::Regex;

static OFF_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"#\s*(fmt|sort):\s*off").unwrap());
static ON_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"#\s*(fmt|sort):\s*on").unwrap());

/// Tracks regions that must keep their order (`# fmt: off/on` or `# sort: off/on`).
#[derive(Debug, Default)]
pub struct SkipRegions {
    /// Ranges of lines to skip (start, end) - both inclusive, 1-indexed.
    ranges: Vec<(usize, usize)>,
}

impl SkipRegions {
    pub fn parse(source: &str) -> Self {
        let mut ranges = Vec::new();
        let mut current_start: Option<usize> = None;

        for (idx, line) in source.lines().enumerate() {
            let line_num = idx + 1;

            if OFF_REGEX.is_match(line) {
                if current_start.is_none() {
                    current_start = Some(line_num);
                }
            } else if ON_REGEX.is_match(line) {
                if let Some(start) = current_start.take() {
                    ranges.push((start, line_num));
                }
            }
        }

        // An unclosed region runs to the end of the file
        if let Some(start) = current_start {
            ranges.push((start, source.lines().count()));
        }

        Self { ranges }
    }

    /// Check if a line (1-indexed) is in a skip region.
    pub fn is_skipped(&self, line: usize) -> bool {
        self.ranges.iter().any(|(start, end)| line >= *start && line <= *end)
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}
