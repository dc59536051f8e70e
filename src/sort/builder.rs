//! Builds a [`SortNode`] tree from a parsed GDScript file.
//!
//! Every recognised statement of a scope becomes one node covering whole lines:
//! from the first line of the statement to the end of its last line. The range end
//! is the offset of that line's line break, so a cursor placed at the end of the
//! line still belongs to the declaration.
//!
//! No text is left without an owner. The first declaration of a scope is pulled up
//! over directly preceding comments and `@export_group`-style annotations; the rest
//! of the scope preamble stays with the file or class header. Any later declaration
//! owns every non-blank line between it and the previous declaration. Whatever
//! follows the last top-level declaration becomes a trailing node.

use tree_sitter::{Node, Tree};

use super::comparator::{classify_virtual_method, MemberKind};
use super::node::{Kind, Signature, SortNode, TypeKind};
use super::skip_regions::SkipRegions;

pub struct TreeBuilder<'a> {
    source: &'a str,
    lines: Vec<&'a str>,
    line_starts: Vec<usize>,
    skip_regions: &'a SkipRegions,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(source: &'a str, skip_regions: &'a SkipRegions) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            source,
            lines: source.lines().collect(),
            line_starts,
            skip_regions,
        }
    }

    /// Convert the whole file into a compilation unit node.
    pub fn build(&self, tree: &Tree) -> SortNode {
        let file = tree.root_node();
        let mut root = SortNode::new(Kind::CompilationUnit, 0, self.source.len())
            .with_signature(self.file_signature(file));

        let (declarations, free_row) = self.extract_declarations(file, 0);
        for declaration in declarations {
            root.add_child(declaration);
        }
        if let Some(trailing) = self.trailing_segment(free_row) {
            root.add_child(trailing);
        }
        root.body_start = root.children().first().map(|c| c.source_start);
        root.close_collections();
        root
    }

    /// Extract the member declarations of a scope, in source order.
    ///
    /// `free_row` is the first row a declaration may claim when pulling up comments.
    /// Returns the declarations and the first row after the last one.
    fn extract_declarations(&self, scope: Node<'_>, mut free_row: usize) -> (Vec<SortNode>, usize) {
        let mut declarations = Vec::new();
        let mut cursor = scope.walk();

        for child in scope.children(&mut cursor) {
            let start_row = child.start_position().row;
            if self.skip_regions.is_skipped(start_row + 1) {
                continue;
            }

            let Some((kind, signature)) = self.classify(child) else {
                continue;
            };

            let absorbs_comments = !matches!(
                signature.member,
                Some(MemberKind::DocComment | MemberKind::Tool | MemberKind::Icon | MemberKind::StaticUnload)
            );
            let first_row = if !declarations.is_empty() {
                self.first_content_row(free_row, start_row)
            } else if absorbs_comments {
                self.leading_row(start_row, free_row)
            } else {
                start_row
            };
            let last_row = last_row(child);

            let mut node = SortNode::new(kind, self.line_starts[first_row], self.line_end(last_row))
                .with_signature(signature);

            if kind == Kind::Type(TypeKind::Class) {
                self.add_class_members(&mut node, child);
            }

            declarations.push(node);
            free_row = last_row + 1;
        }

        (declarations, free_row)
    }

    /// Text after the last top-level declaration, such as a closing comment.
    ///
    /// It carries no member kind, so it sorts after every declaration.
    fn trailing_segment(&self, free_row: usize) -> Option<SortNode> {
        let mut rows = (free_row..self.lines.len()).filter(|&r| !self.is_blank(r));
        let first = rows.next()?;
        let last = rows.last().unwrap_or(first);
        let node = SortNode::new(Kind::Directive, self.line_starts[first], self.line_end(last))
            .with_signature(Signature::named("trailing"));
        Some(node)
    }

    /// Attach the members of an inner class body.
    ///
    /// A body with members inside a skip region is left as an opaque leaf so the
    /// skipped text is emitted untouched.
    fn add_class_members(&self, class: &mut SortNode, node: Node<'_>) {
        let Some(body) = node.child_by_field_name("body") else {
            return;
        };

        let mut cursor = body.walk();
        let has_skipped = body
            .children(&mut cursor)
            .any(|c| self.skip_regions.is_skipped(c.start_position().row + 1));
        if has_skipped {
            return;
        }

        let (members, _) = self.extract_declarations(body, body.start_position().row);
        for member in members {
            class.add_child(member);
        }
        class.body_start = class.children().first().map(|c| c.source_start);
    }

    /// Walk up from `row` over lines that belong to the declaration below them.
    fn leading_row(&self, row: usize, floor: usize) -> usize {
        let mut first = row;
        while first > floor {
            let Some(prev) = self.lines.get(first - 1).map(|l| l.trim()) else {
                break;
            };
            let is_comment = prev.starts_with('#');
            let is_group_annotation = prev.starts_with("@export_category")
                || prev.starts_with("@export_group")
                || prev.starts_with("@export_subgroup");
            if !(is_comment || is_group_annotation) || self.skip_regions.is_skipped(first) {
                break;
            }
            first -= 1;
        }
        first
    }

    /// First non-blank row in `from..row`, or `row` when the gap is blank.
    fn first_content_row(&self, from: usize, row: usize) -> usize {
        (from..row).find(|&r| !self.is_blank(r)).unwrap_or(row)
    }

    fn is_blank(&self, row: usize) -> bool {
        self.lines.get(row).map_or(true, |l| l.trim().is_empty())
    }

    /// Whether the `##` block holding `row` stands alone instead of documenting
    /// the declaration right below it.
    fn is_detached_doc(&self, row: usize) -> bool {
        let mut next = row + 1;
        while self
            .lines
            .get(next)
            .is_some_and(|l| l.trim_start().starts_with("##"))
        {
            next += 1;
        }
        self.is_blank(next)
    }

    /// Offset of the line break ending `row`, or the end of the source.
    fn line_end(&self, row: usize) -> usize {
        let start = self.line_starts.get(row).copied().unwrap_or(self.source.len());
        match self.source[start..].find('\n') {
            Some(i) if self.source[..start + i].ends_with('\r') => start + i - 1,
            Some(i) => start + i,
            None => self.source.len(),
        }
    }

    fn classify(&self, node: Node<'_>) -> Option<(Kind, Signature)> {
        match node.kind() {
            "annotation" => {
                let member = match get_annotation_name(node, self.source)? {
                    "tool" => MemberKind::Tool,
                    "icon" => MemberKind::Icon,
                    "static_unload" => MemberKind::StaticUnload,
                    _ => return None,
                };
                Some((Kind::Directive, Signature::named(member.name()).with_member(member)))
            }
            "class_name_statement" => {
                let name = self.name_of(node).unwrap_or_default();
                Some((Kind::Directive, Signature::named(name).with_member(MemberKind::ClassName)))
            }
            "extends_statement" => {
                let signature = Signature {
                    superclass: self.extends_target(node),
                    member: Some(MemberKind::Extends),
                    ..Default::default()
                };
                Some((Kind::Directive, signature))
            }
            "comment" => {
                let text = node_text(node, self.source)?;
                let detached = self.is_detached_doc(node.start_position().row);
                (text.starts_with("##") && detached).then(|| {
                    (Kind::Directive, Signature::default().with_member(MemberKind::DocComment))
                })
            }
            "signal_statement" => Some((Kind::Field, self.member_signature(node, MemberKind::Signal))),
            "enum_definition" => Some((Kind::Field, self.member_signature(node, MemberKind::Enum))),
            "const_statement" => {
                let mut signature = self.member_signature(node, MemberKind::Const);
                signature.declared_type = self.field_text(node, "type");
                Some((Kind::Field, signature))
            }
            "variable_statement" => {
                let modifiers = get_node_modifiers(node, self.source);
                let member = classify_variable(&modifiers);
                let mut signature = self.member_signature(node, member);
                signature.modifiers = modifiers;
                signature.declared_type = self.field_text(node, "type");
                Some((Kind::Field, signature))
            }
            "function_definition" => {
                let name = self.name_of(node).unwrap_or_default();
                let is_static = is_static_function(node);
                let (kind, member) = match (is_static, name.as_str()) {
                    (true, "_static_init") => (Kind::Initializer, MemberKind::StaticInit),
                    (true, _) => (Kind::Method, MemberKind::StaticMethod),
                    (false, name) => (Kind::Method, classify_virtual_method(name)),
                };
                Some((kind, self.function_signature(node, name, member, is_static)))
            }
            // _init() is parsed as constructor_definition, not function_definition
            "constructor_definition" => Some((
                Kind::Constructor,
                self.function_signature(node, "_init".to_string(), MemberKind::VirtualInit, false),
            )),
            "class_definition" => {
                let mut signature = self.member_signature(node, MemberKind::InnerClass);
                signature.superclass = self.field_text(node, "extends");
                Some((Kind::Type(TypeKind::Class), signature))
            }
            _ => None,
        }
    }

    fn member_signature(&self, node: Node<'_>, member: MemberKind) -> Signature {
        Signature {
            name: self.name_of(node),
            member: Some(member),
            ..Default::default()
        }
    }

    fn function_signature(
        &self,
        node: Node<'_>,
        name: String,
        member: MemberKind,
        is_static: bool,
    ) -> Signature {
        let mut signature = Signature::named(name).with_member(member);
        if is_static {
            signature.modifiers.push("static".to_string());
        }
        if let Some(params) = node.child_by_field_name("parameters") {
            let mut cursor = params.walk();
            for param in params.named_children(&mut cursor) {
                if let Some((name, ty)) = self.parameter(param) {
                    signature.parameter_names.push(name);
                    signature.parameter_types.push(ty);
                }
            }
        }
        signature.declared_type = self.field_text(node, "return_type");
        signature
    }

    fn parameter(&self, node: Node<'_>) -> Option<(String, Option<String>)> {
        let name_node = match node.kind() {
            "identifier" => Some(node),
            "typed_parameter" | "typed_identifier" | "default_parameter"
            | "typed_default_parameter" | "parameter" => node
                .child_by_field_name("name")
                .or_else(|| first_child_of_kind(node, "identifier")),
            _ => None,
        }?;
        let name = node_text(name_node, self.source)?.to_string();
        let ty = node
            .child_by_field_name("type")
            .or_else(|| first_child_of_kind(node, "type"))
            .and_then(|t| node_text(t, self.source))
            .map(str::to_string);
        Some((name, ty))
    }

    fn name_of(&self, node: Node<'_>) -> Option<String> {
        node.child_by_field_name("name")
            .or_else(|| first_child_of_kind(node, "name"))
            .or_else(|| first_child_of_kind(node, "identifier"))
            .and_then(|n| node_text(n, self.source))
            .map(str::to_string)
    }

    fn field_text(&self, node: Node<'_>, field: &str) -> Option<String> {
        node.child_by_field_name(field)
            .and_then(|n| node_text(n, self.source))
            .map(|t| t.trim().to_string())
    }

    fn extends_target(&self, node: Node<'_>) -> Option<String> {
        let text = node_text(node, self.source)?;
        let target = text.trim().strip_prefix("extends")?.trim();
        (!target.is_empty()).then(|| target.to_string())
    }

    /// Name and superclass of the file-level script class.
    fn file_signature(&self, file: Node<'_>) -> Signature {
        let mut signature = Signature::default();
        let mut cursor = file.walk();
        for child in file.children(&mut cursor) {
            match child.kind() {
                "class_name_statement" => signature.name = self.name_of(child),
                "extends_statement" => signature.superclass = self.extends_target(child),
                _ => {}
            }
        }
        signature
    }
}

/// Last row holding code of `node`.
///
/// Trailing comments count only when indented deeper than `node` itself: the
/// grammar may fold a dedented comment that follows a block into that block, but
/// it belongs to the next declaration.
fn last_row(node: Node<'_>) -> usize {
    let column = node.start_position().column;
    let mut current = node;
    while let Some(last) = (0..current.child_count())
        .rev()
        .filter_map(move |i| current.child(i))
        .find(|c| c.kind() != "comment" || c.start_position().column > column)
    {
        current = last;
    }

    let start = node.start_position();
    let end = current.end_position();
    // A node ending at column 0 stopped on the previous line's newline.
    if end.column == 0 && end.row > start.row {
        end.row - 1
    } else {
        end.row
    }
}

/// Variable kind by modifiers (priority: onready > export > static > regular).
fn classify_variable(modifiers: &[String]) -> MemberKind {
    if modifiers.iter().any(|m| m == "onready") {
        MemberKind::OnreadyVar
    } else if modifiers.iter().any(|m| is_export_annotation(m)) {
        MemberKind::ExportVar
    } else if modifiers.iter().any(|m| m == "static") {
        MemberKind::StaticVar
    } else {
        MemberKind::Var
    }
}

/// Check if an annotation is an export variant.
fn is_export_annotation(name: &str) -> bool {
    name == "export" || name.starts_with("export_")
}

fn first_child_of_kind<'t>(node: Node<'t>, kind: &str) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).find(|c| c.kind() == kind);
    found
}

/// Extract the annotation name from an annotation node.
fn get_annotation_name<'s>(node: Node<'_>, source: &'s str) -> Option<&'s str> {
    first_child_of_kind(node, "identifier").and_then(|n| node_text(n, source))
}

fn node_text<'s>(node: Node<'_>, source: &'s str) -> Option<&'s str> {
    source.get(node.start_byte()..node.end_byte())
}

fn is_static_function(node: Node<'_>) -> bool {
    first_child_of_kind(node, "static_keyword").is_some()
}

/// Annotations (like @export, @onready) and modifiers (like static) inside a node.
fn get_node_modifiers(node: Node<'_>, source: &str) -> Vec<String> {
    let mut modifiers = Vec::new();
    let mut cursor = node.walk();

    for child in node.children(&mut cursor) {
        match child.kind() {
            "annotations" => {
                let mut ann_cursor = child.walk();
                for ann in child.children(&mut ann_cursor) {
                    if ann.kind() == "annotation" {
                        if let Some(name) = get_annotation_name(ann, source) {
                            modifiers.push(name.to_string());
                        }
                    }
                }
            }
            "annotation" => {
                if let Some(name) = get_annotation_name(child, source) {
                    modifiers.push(name.to_string());
                }
            }
            "static_keyword" => modifiers.push("static".to_string()),
            _ => {}
        }
    }

    modifiers
}
