//! The sortable declaration tree.
//!
//! A [`SortNode`] is one declaration of the source (the compilation unit, an
//! inner class, a variable, a method, ...). Besides its children it carries the
//! tracked offsets captured for it and, once rendered, the offset where its text
//! starts in the regenerated output.

use std::fmt::{self, Write};

use super::comparator::{MemberComparator, MemberKind};

/// Flavour of a type declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Class,
    Interface,
}

/// Kind of a declaration node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    CompilationUnit,
    Type(TypeKind),
    /// File-level statements such as `@tool`, `class_name`, `extends` or a doc comment.
    Directive,
    Field,
    Initializer,
    Method,
    Constructor,
    MultipleFieldGroup,
}

impl Kind {
    /// Only containers reorder their own children.
    pub fn is_container(&self) -> bool {
        matches!(self, Kind::CompilationUnit | Kind::Type(_))
    }

    fn label(&self) -> &'static str {
        match self {
            Kind::CompilationUnit => "COMPILATION UNIT",
            Kind::Type(TypeKind::Class) => "CLASS",
            Kind::Type(TypeKind::Interface) => "INTERFACE",
            Kind::Directive => "DIRECTIVE",
            Kind::Field => "FIELD",
            Kind::Initializer => "INITIALIZER",
            Kind::Method => "METHOD",
            Kind::Constructor => "CONSTRUCTOR",
            Kind::MultipleFieldGroup => "MULTIPLE FIELD",
        }
    }
}

/// Shape metadata carried for the comparator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    pub name: Option<String>,
    /// Annotations and keywords such as `export`, `onready` or `static`.
    pub modifiers: Vec<String>,
    pub superclass: Option<String>,
    pub parameter_names: Vec<String>,
    pub parameter_types: Vec<Option<String>>,
    /// Return type of a function or declared type of a variable.
    pub declared_type: Option<String>,
    /// Style-guide classification, if the builder could derive one.
    pub member: Option<MemberKind>,
}

impl Signature {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_member(mut self, member: MemberKind) -> Self {
        self.member = Some(member);
        self
    }
}

#[derive(Debug, Clone)]
pub struct SortNode {
    pub kind: Kind,
    /// First byte of the original range.
    pub source_start: usize,
    /// Last byte of the original range (inclusive).
    pub source_end: usize,
    /// Start of the member body, for type declarations.
    pub body_start: Option<usize>,
    pub signature: Signature,
    ordinal: usize,
    new_start: Option<usize>,
    children: Vec<SortNode>,
    inner_fields: Vec<SortNode>,
    positions: Vec<usize>,
}

impl SortNode {
    pub fn new(kind: Kind, source_start: usize, source_end: usize) -> Self {
        debug_assert!(source_start <= source_end);
        Self {
            kind,
            source_start,
            source_end,
            body_start: None,
            signature: Signature::default(),
            ordinal: 0,
            new_start: None,
            children: Vec::new(),
            inner_fields: Vec::new(),
            positions: Vec::new(),
        }
    }

    pub fn with_signature(mut self, signature: Signature) -> Self {
        self.signature = signature;
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.signature.name.as_deref()
    }

    /// Position of this node among its siblings before any sorting.
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn children(&self) -> &[SortNode] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut [SortNode] {
        &mut self.children
    }

    pub fn inner_fields(&self) -> &[SortNode] {
        &self.inner_fields
    }

    pub(crate) fn inner_fields_mut(&mut self) -> &mut [SortNode] {
        &mut self.inner_fields
    }

    /// Node-relative offsets captured for this node.
    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    pub fn new_start(&self) -> Option<usize> {
        self.new_start
    }

    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.source_start && offset <= self.source_end
    }

    pub fn add_child(&mut self, mut child: SortNode) {
        child.ordinal = self.children.len();
        self.children.push(child);
    }

    /// Attach one declaration of a multi-field statement.
    pub fn add_inner_field(&mut self, mut field: SortNode) {
        field.ordinal = self.inner_fields.len();
        self.inner_fields.push(field);
    }

    /// Release spare capacity once the tree is fully built.
    pub fn close_collections(&mut self) {
        self.children.shrink_to_fit();
        self.inner_fields.shrink_to_fit();
        for field in &mut self.inner_fields {
            field.close_collections();
        }
        for child in &mut self.children {
            child.close_collections();
        }
    }

    /// Store `offset` relative to this node's original start.
    pub fn record_position(&mut self, offset: usize) {
        debug_assert!(self.contains(offset));
        self.positions.push(offset - self.source_start);
    }

    /// Renderer hook: called once, right before this node's text is written.
    pub fn mark_new_start(&mut self, offset: usize) {
        debug_assert!(self.new_start.is_none(), "node rendered twice");
        self.new_start = Some(offset);
    }

    /// Map every node back onto its original offset, for output that was not regenerated.
    pub fn keep_original_starts(&mut self) {
        self.new_start = Some(self.source_start);
        for field in &mut self.inner_fields {
            field.keep_original_starts();
        }
        for child in &mut self.children {
            child.keep_original_starts();
        }
    }

    /// Write this node's positions, rebased onto its new start, at `*cursor`.
    pub fn retrieve_mapped_positions(&self, output: &mut [usize], cursor: &mut usize) {
        debug_assert!(self.new_start.is_some(), "positions retrieved before rendering");
        let base = self.new_start.unwrap_or(self.source_start);
        for relative in &self.positions {
            output[*cursor] = relative + base;
            *cursor += 1;
        }
    }

    /// Number of positions captured in this subtree.
    pub fn tracked_count(&self) -> usize {
        self.positions.len()
            + self.inner_fields.iter().map(SortNode::tracked_count).sum::<usize>()
            + self.children.iter().map(SortNode::tracked_count).sum::<usize>()
    }

    /// Reorder the children of container nodes, then recurse into every child.
    ///
    /// The comparator must be consistent and transitive over the children of one
    /// container; it is not checked here.
    pub fn sort(&mut self, comparator: &dyn MemberComparator) {
        if self.children.is_empty() {
            return;
        }

        if self.kind.is_container() {
            let order = self.sorted_order(comparator);
            let mut slots: Vec<Option<SortNode>> =
                std::mem::take(&mut self.children).into_iter().map(Some).collect();
            self.children = order
                .into_iter()
                .filter_map(|index| slots[index].take())
                .collect();
        }

        for child in &mut self.children {
            child.sort(comparator);
        }
    }

    /// Sort comparable views of the children and return their original indices.
    fn sorted_order(&self, comparator: &dyn MemberComparator) -> Vec<usize> {
        let mut comparables: Vec<Comparable<'_>> = self
            .children
            .iter()
            .enumerate()
            .map(|(index, node)| Comparable { node, index })
            .collect();
        comparables.sort_by(|a, b| comparator.compare(a.node, b.node));
        comparables.into_iter().map(|c| c.index).collect()
    }

    /// True if sorting moved any child of this node or of its descendants.
    pub fn is_reordered(&self) -> bool {
        self.children
            .iter()
            .enumerate()
            .any(|(index, child)| child.ordinal != index || child.is_reordered())
    }

    /// Append an indented dump of this node and its subtree to `buffer`.
    pub fn display(&self, buffer: &mut String, depth: usize) {
        let tabs = "\t".repeat(depth);
        let _ = write!(
            buffer,
            "{}{} {} [{}..{}]",
            tabs,
            self.kind.label(),
            self.name().unwrap_or("<anonymous>"),
            self.source_start,
            self.source_end
        );
        if let Some(member) = self.signature.member {
            let _ = write!(buffer, " ({})", member.name());
        }
        if !self.positions.is_empty() {
            let _ = write!(buffer, " positions={:?}", self.positions);
        }
        buffer.push('\n');

        if !self.inner_fields.is_empty() {
            let _ = writeln!(buffer, "{}FIELDS ------------------------------", tabs);
            for field in &self.inner_fields {
                field.display(buffer, depth + 1);
            }
        }
        if !self.children.is_empty() {
            let _ = writeln!(buffer, "{}CHILDREN ------------------------------", tabs);
            for child in &self.children {
                child.display(buffer, depth + 1);
            }
        }
    }
}

impl fmt::Display for SortNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buffer = String::new();
        self.display(&mut buffer, 0);
        f.write_str(&buffer)
    }
}

/// A child paired with its index in the unsorted children list.
struct Comparable<'a> {
    node: &'a SortNode,
    index: usize,
}
