//! Language parsing wrapper used by extraction passes.
//!
//! One `tree_sitter::Parser` is created per call, so callers can parse from
//! several rayon workers without sharing state.

use std::path::Path;

use crate::errors::{ReviewError, ReviewResult};
use crate::indexer::filesystem::is_tsx;

/// Parsed source unit: the raw text plus its syntax tree.
pub struct ParsedUnit {
    pub path: String,
    pub source: String,
    pub tree: tree_sitter::Tree,
}

impl ParsedUnit {
    pub fn root(&self) -> tree_sitter::Node<'_> {
        self.tree.root_node()
    }

    pub fn text(&self, node: tree_sitter::Node<'_>) -> &str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }
}

pub fn parse_file(path: &Path) -> ReviewResult<ParsedUnit> {
    let source = std::fs::read_to_string(path)?;
    parse_source(path, source)
}

/// Parse `source` with the grammar selected by `path`'s extension. Any syntax
/// error in the tree is a parse failure for the whole unit.
pub fn parse_source(path: &Path, source: String) -> ReviewResult<ParsedUnit> {
    let display = path.to_string_lossy().to_string();
    let language = if is_tsx(path) {
        tree_sitter_typescript::LANGUAGE_TSX
    } else {
        tree_sitter_typescript::LANGUAGE_TYPESCRIPT
    };

    let mut parser = tree_sitter::Parser::new();
    parser
        .set_language(&language.into())
        .map_err(|e| ReviewError::parse(&display, format!("failed to set language: {e}")))?;

    let tree = parser
        .parse(source.as_bytes(), None)
        .ok_or_else(|| ReviewError::parse(&display, "parser produced no tree"))?;

    if tree.root_node().has_error() {
        let line = first_error_line(tree.root_node()).unwrap_or(1);
        return Err(ReviewError::parse(
            &display,
            format!("syntax error near line {line}"),
        ));
    }

    Ok(ParsedUnit {
        path: display,
        source,
        tree,
    })
}

fn first_error_line(root: tree_sitter::Node<'_>) -> Option<usize> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node.start_position().row + 1);
        }
        if node.has_error() {
            let mut cursor = node.walk();
            let children: Vec<_> = node.children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
    }
    None
}
