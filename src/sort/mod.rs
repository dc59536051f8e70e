//! Member reordering with offset tracking.
//!
//! [`sort_source`] runs the whole pipeline for one file: build a [`SortNode`] tree,
//! capture the tracked offsets, sort, render, then emit the remapped offsets.

pub mod builder;
pub mod comparator;
pub mod node;
mod options;
pub mod positions;
pub mod render;
mod skip_regions;
pub mod traverse;

use std::collections::HashMap;
use std::hash::Hash;

use miette::Diagnostic;
use thiserror::Error;
use tracing::{debug, trace};

pub use builder::TreeBuilder;
pub use comparator::{MemberComparator, MemberKind, StyleGuideComparator};
pub use node::{Kind, Signature, SortNode, TypeKind};
pub use options::SortOptions;
pub use positions::{capture_positions, emit_positions};
pub use render::render;
pub use skip_regions::SkipRegions;
pub use traverse::{traverse, TraversalOrder};

use crate::parser;

#[derive(Debug, Error, Diagnostic)]
pub enum SortError {
    #[error("Parse error: {0}")]
    #[diagnostic(code(gdsort::parse))]
    Parse(String),

    #[error("members changed while sorting: {0}")]
    #[diagnostic(code(gdsort::members_changed), help("please report this file as a bug"))]
    MembersChanged(String),

    #[error("invalid configuration: {0}")]
    #[diagnostic(code(gdsort::config))]
    Config(String),

    #[error(transparent)]
    #[diagnostic(code(gdsort::io))]
    Io(#[from] std::io::Error),
}

/// Result of sorting one source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortedSource {
    pub text: String,
    /// Remapped offsets, in emission order.
    pub offsets: Vec<usize>,
    /// Number of requested offsets that fell outside the file.
    pub unmatched: usize,
    /// Whether any member moved.
    pub reordered: bool,
}

impl SortedSource {
    fn unchanged(source: &str, offsets: &[usize]) -> Self {
        let kept: Vec<usize> = offsets.iter().copied().filter(|&o| o <= source.len()).collect();
        Self {
            text: source.to_string(),
            unmatched: offsets.len() - kept.len(),
            offsets: kept,
            reordered: false,
        }
    }
}

/// Reorder the members of `source` and map `offsets` into the result.
pub fn sort_source(
    source: &str,
    offsets: &[usize],
    options: &SortOptions,
) -> Result<SortedSource, SortError> {
    if source.trim().is_empty() {
        return Ok(SortedSource {
            text: source.to_string(),
            offsets: Vec::new(),
            unmatched: offsets.len(),
            reordered: false,
        });
    }

    let tree = parser::parse(source).map_err(SortError::Parse)?;
    let file = tree.root_node();
    let skip_regions = SkipRegions::parse(source);

    // Check if any top-level declaration is in a skip region
    let mut cursor = file.walk();
    let has_skipped = file
        .children(&mut cursor)
        .any(|child| skip_regions.is_skipped(child.start_position().row + 1));
    if has_skipped {
        debug!("top-level skip region found, leaving source untouched");
        return Ok(SortedSource::unchanged(source, offsets));
    }

    let mut root = TreeBuilder::new(source, &skip_regions).build(&tree);
    trace!("built tree:\n{}", root);

    let mut slots: Vec<Option<usize>> = offsets.iter().copied().map(Some).collect();
    let claimed = capture_positions(&mut root, &mut slots);

    root.sort(&StyleGuideComparator::from(options));
    let reordered = root.is_reordered();

    let text = if reordered {
        render(&mut root, source, options)
    } else {
        root.keep_original_starts();
        source.to_string()
    };
    debug!(reordered, members = root.children().len(), "sorted source");

    let mapped = emit_positions(&mut root, options.emission_order);
    debug_assert_eq!(mapped.len(), claimed);

    Ok(SortedSource {
        text,
        offsets: mapped,
        unmatched: offsets.len() - claimed,
        reordered,
    })
}

/// Verify that `sorted` holds exactly the members of `original`, in any order,
/// and that no other non-blank line was lost or added.
pub fn check_members_preserved(original: &str, sorted: &str) -> Result<(), SortError> {
    let before = member_texts(original)?;
    let after = member_texts(sorted)?;
    if let Some(text) = first_difference(&before, &after) {
        return Err(SortError::MembersChanged(format!("'{}' differs", text)));
    }

    // Comments between members are not part of any declaration node.
    let before = content_lines(original);
    let after = content_lines(sorted);
    if let Some(line) = first_difference(&before, &after) {
        return Err(SortError::MembersChanged(format!("line '{}' differs", line)));
    }

    Ok(())
}

/// Count every leaf member text in `source`, trimmed of surrounding whitespace.
fn member_texts(source: &str) -> Result<HashMap<String, usize>, SortError> {
    let tree = parser::parse(source).map_err(SortError::Parse)?;
    let skip_regions = SkipRegions::parse(source);
    let mut root = TreeBuilder::new(source, &skip_regions).build(&tree);

    let mut counts = HashMap::new();
    traverse(&mut root, TraversalOrder::ChildrenLast, &mut |node: &mut SortNode| {
        if node.kind == Kind::CompilationUnit || !node.children().is_empty() {
            return;
        }
        let text = source[node.source_start..node.source_end].trim().to_string();
        *counts.entry(text).or_insert(0) += 1;
    });
    Ok(counts)
}

/// Count every non-blank line in `source`, trimmed.
fn content_lines(source: &str) -> HashMap<&str, usize> {
    let mut counts = HashMap::new();
    for line in source.lines().map(str::trim).filter(|l| !l.is_empty()) {
        *counts.entry(line).or_insert(0) += 1;
    }
    counts
}

/// First entry whose count differs between `before` and `after`.
fn first_difference<K>(before: &HashMap<K, usize>, after: &HashMap<K, usize>) -> Option<String>
where
    K: AsRef<str> + Eq + Hash,
{
    before
        .iter()
        .find(|&(text, count)| after.get(text) != Some(count))
        .or_else(|| after.iter().find(|&(text, count)| before.get(text) != Some(count)))
        .map(|(text, _)| text.as_ref().lines().next().unwrap_or("").trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_source_is_untouched() {
        let sorted = sort_source("  \n", &[1], &SortOptions::default()).unwrap();
        assert_eq!(sorted.text, "  \n");
        assert!(sorted.offsets.is_empty());
        assert_eq!(sorted.unmatched, 1);
    }

    #[test]
    fn test_sorted_source_maps_offsets_identically() {
        let source = "extends Node\n\nvar x = 1\n";
        let sorted = sort_source(source, &[20, 3], &SortOptions::default()).unwrap();
        assert!(!sorted.reordered);
        assert_eq!(sorted.text, source);
        assert_eq!(sorted.offsets, vec![3, 20]);
    }

    #[test]
    fn test_members_preserved_detects_loss() {
        let original = "var a = 1\nvar b = 2\n";
        assert!(check_members_preserved(original, "var b = 2\nvar a = 1\n").is_ok());
        let err = check_members_preserved(original, "var a = 1\n").unwrap_err();
        assert!(matches!(err, SortError::MembersChanged(_)));
    }

    #[test]
    fn test_members_preserved_detects_lost_comment() {
        let original = "var a = 1\n\n# closing note\n";
        let err = check_members_preserved(original, "var a = 1\n").unwrap_err();
        assert!(matches!(err, SortError::MembersChanged(_)));
    }

    #[test]
    fn test_text_between_members_is_kept() {
        let source = "extends Node\n\nfunc f():\n\tpass\n\n# ---- Section ----\n\nvar x = 1\n\n# trailing note\n";
        // 'S' of "Section".
        assert_eq!(&source[38..39], "S");

        let sorted = sort_source(source, &[38], &SortOptions::default()).unwrap();

        assert_eq!(
            sorted.text,
            "extends Node\n\n# ---- Section ----\n\nvar x = 1\n\n\nfunc f():\n\tpass\n\n# trailing note\n"
        );
        assert_eq!(sorted.offsets, vec![21]);
        assert_eq!(&sorted.text[21..22], "S");
        check_members_preserved(source, &sorted.text).expect("nothing lost");
    }
}
