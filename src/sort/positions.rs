//! Offset tracking across a reorder.
//!
//! Tracking happens in two passes over the same tree:
//!
//! 1. [`capture_positions`] runs on the freshly built tree and hands each offset to
//!    the innermost node whose original range contains it, stored relative to that
//!    node's start.
//! 2. [`emit_positions`] runs after the sorted tree was rendered and rebases every
//!    captured offset onto its node's new start.
//!
//! The emitted offsets come out in traversal order of the sorted tree, not in the
//! order they were supplied. Offsets no node claimed are dropped, so callers
//! detect misses by comparing counts.

use tracing::trace;

use super::node::SortNode;
use super::traverse::{traverse, TraversalOrder};

/// Output buffer and write cursor shared by every node of one emission walk.
#[derive(Debug)]
pub struct MappedPositions {
    output: Vec<usize>,
    cursor: usize,
}

impl MappedPositions {
    pub fn with_capacity(count: usize) -> Self {
        Self {
            output: vec![0; count],
            cursor: 0,
        }
    }

    fn collect(&mut self, node: &SortNode) {
        node.retrieve_mapped_positions(&mut self.output, &mut self.cursor);
    }

    pub fn into_positions(mut self) -> Vec<usize> {
        self.output.truncate(self.cursor);
        self.output
    }
}

/// Assign each offset to the innermost node containing it.
///
/// Claimed entries are replaced by `None`; entries outside the tree stay as they
/// were. Returns the number of offsets claimed.
pub fn capture_positions(root: &mut SortNode, offsets: &mut [Option<usize>]) -> usize {
    let mut claimed = 0;
    traverse(root, TraversalOrder::ChildrenFirst, &mut |node: &mut SortNode| {
        for slot in offsets.iter_mut() {
            if let Some(offset) = *slot {
                if node.contains(offset) {
                    node.record_position(offset);
                    *slot = None;
                    claimed += 1;
                }
            }
        }
    });
    trace!(claimed, requested = offsets.len(), "captured positions");
    claimed
}

/// Rebase every captured offset onto the rendered output.
///
/// Every node must have been given its new start by the renderer.
pub fn emit_positions(root: &mut SortNode, order: TraversalOrder) -> Vec<usize> {
    let mut mapped = MappedPositions::with_capacity(root.tracked_count());
    traverse(root, order, &mut |node: &mut SortNode| mapped.collect(node));
    mapped.into_positions()
}
