//! Writes a sorted [`SortNode`] tree back out as GDScript.
//!
//! Declaration text is copied verbatim from the original source; only the order
//! and the blank lines between members change. Separators use the line ending of
//! the source. Each node reports where its text starts through
//! [`SortNode::mark_new_start`].

use super::comparator::MemberKind;
use super::node::{Kind, SortNode};
use super::options::SortOptions;

pub struct Renderer<'a> {
    source: &'a str,
    line_ending: &'static str,
    output: String,
}

impl<'a> Renderer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            line_ending: line_ending(source),
            output: String::with_capacity(source.len()),
        }
    }

    /// Render the compilation unit `root`.
    pub fn render(mut self, root: &mut SortNode, options: &SortOptions) -> String {
        root.mark_new_start(self.output.len());
        if let Some(body_start) = root.body_start {
            self.output.push_str(&self.source[root.source_start..body_start]);
        }
        self.write_members(root.children_mut());

        let eol = self.line_ending;
        if options.trailing_newline {
            let blank_line = eol.repeat(2);
            while self.output.ends_with(&blank_line) {
                self.output.truncate(self.output.len() - eol.len());
            }
            if !self.output.is_empty() && !self.output.ends_with(eol) {
                self.output.push_str(eol);
            }
        } else {
            // Keep whatever line breaks ended the original file.
            let content = self.source.trim_end_matches(|c| c == '\n' || c == '\r');
            self.output.push_str(&self.source[content.len()..]);
        }

        self.output
    }

    /// Write sibling members separated by style-guide blank lines.
    fn write_members(&mut self, members: &mut [SortNode]) {
        let mut prev: Option<Option<MemberKind>> = None;
        for member in members {
            let kind = member.signature.member;
            if let Some(prev_kind) = prev {
                for _ in 0..=blank_lines_between(prev_kind, kind) {
                    self.output.push_str(self.line_ending);
                }
            }
            self.write_node(member);
            prev = Some(kind);
        }
    }

    fn write_node(&mut self, node: &mut SortNode) {
        node.mark_new_start(self.output.len());

        if node.kind == Kind::MultipleFieldGroup && !node.inner_fields().is_empty() {
            for (i, field) in node.inner_fields_mut().iter_mut().enumerate() {
                if i > 0 {
                    self.output.push_str(self.line_ending);
                }
                self.write_node(field);
            }
            return;
        }

        match node.body_start {
            Some(body_start) if !node.children().is_empty() => {
                self.output.push_str(&self.source[node.source_start..body_start]);
                self.write_members(node.children_mut());
            }
            _ => self.output.push_str(&self.source[node.source_start..node.source_end]),
        }
    }
}

/// Render `root` from `source`, recording every node's new start.
pub fn render(root: &mut SortNode, source: &str, options: &SortOptions) -> String {
    Renderer::new(source).render(root, options)
}

fn line_ending(source: &str) -> &'static str {
    if source.contains("\r\n") {
        "\r\n"
    } else {
        "\n"
    }
}

/// Determine blank lines needed between two member kinds.
fn blank_lines_between(prev: Option<MemberKind>, next: Option<MemberKind>) -> usize {
    let (Some(prev), Some(next)) = (prev, next) else {
        return 1;
    };

    // Header items have no blank lines between them
    if prev.is_header() && next.is_header() {
        return 0;
    }

    // Two blank lines before/after functions and classes
    if prev.is_function_like() || next.is_function_like() {
        return 2;
    }

    // Doc comments have 1 blank line after header but before other sections
    if prev == MemberKind::DocComment || next == MemberKind::DocComment {
        return if prev == next { 0 } else { 1 };
    }

    // Same category: no blank line
    if prev == next {
        return 0;
    }

    1
}
