use serde::{Deserialize, Serialize};

use super::node::SortNode;

/// Whole-tree walk order.
///
/// In both orders the inner fields of a node are walked before its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TraversalOrder {
    /// Visit inner fields and children, then the node itself (post-order).
    #[default]
    ChildrenFirst,
    /// Visit the node itself, then inner fields and children (pre-order).
    ChildrenLast,
}

/// Walk `node` and its whole subtree, calling `visit` once per node.
pub fn traverse<F>(node: &mut SortNode, order: TraversalOrder, visit: &mut F)
where
    F: FnMut(&mut SortNode),
{
    if order == TraversalOrder::ChildrenLast {
        visit(node);
    }
    for field in node.inner_fields_mut() {
        traverse(field, order, visit);
    }
    for child in node.children_mut() {
        traverse(child, order, visit);
    }
    if order == TraversalOrder::ChildrenFirst {
        visit(node);
    }
}
