//! Thin wrapper over the tree-sitter GDScript grammar.

use tree_sitter::{Language, Parser, Tree};

pub fn language() -> Language {
    tree_sitter_gdscript::LANGUAGE.into()
}

/// Parse GDScript source into a syntax tree.
///
/// Syntax errors do not fail the parse; tree-sitter recovers and marks them in the
/// tree. Only a missing grammar or an aborted parse is reported.
pub fn parse(source: &str) -> Result<Tree, String> {
    let mut parser = Parser::new();
    parser
        .set_language(&language())
        .map_err(|e| format!("Failed to set language: {}", e))?;
    parser
        .parse(source, None)
        .ok_or_else(|| "Failed to parse source".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_script() {
        let tree = parse("extends Node\n\nvar x = 1\n").unwrap();
        let root = tree.root_node();
        assert!(!root.has_error());
        assert_eq!(root.named_child_count(), 2);
    }
}
