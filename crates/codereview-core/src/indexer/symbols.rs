//! Structural extraction of functions, classes and imports from a source unit.
//!
//! Only top-level declarations are reported: `function` declarations (plain,
//! exported or default-exported), class declarations with their method names,
//! and `import ... from` statements.

use std::path::Path;

use tree_sitter::Node;

use crate::errors::ReviewResult;
use crate::indexer::complexity::{function_complexity, statement_count};
use crate::indexer::parser::{parse_file, parse_source, ParsedUnit};
use crate::models::{ClassDescriptor, FunctionDescriptor, ImportDescriptor, SourceUnitMetadata};

const FUNCTION_DECLARATIONS: &[&str] = &[
    "function_declaration",
    "generator_function_declaration",
];

const ANONYMOUS_FUNCTIONS: &[&str] = &["function_expression", "function", "generator_function"];

const CLASS_DECLARATIONS: &[&str] = &["class_declaration", "abstract_class_declaration"];

/// Parses one source unit into [`SourceUnitMetadata`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SourceAnalyzer;

impl SourceAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Read and analyse `path`. Unreadable files surface as I/O errors, files
    /// with syntax errors as parse failures.
    pub fn analyze(&self, path: &Path) -> ReviewResult<SourceUnitMetadata> {
        let unit = parse_file(path)?;
        Ok(extract_metadata(&unit))
    }

    /// Analyse in-memory text as if it were the content of `path`.
    pub fn analyze_source(&self, path: &Path, source: &str) -> ReviewResult<SourceUnitMetadata> {
        let unit = parse_source(path, source.to_string())?;
        Ok(extract_metadata(&unit))
    }

    /// Like [`analyze`](Self::analyze) but also hands back the source text,
    /// so callers that slice code do not read the file twice.
    pub fn analyze_with_source(&self, path: &Path) -> ReviewResult<(SourceUnitMetadata, String)> {
        let unit = parse_file(path)?;
        let metadata = extract_metadata(&unit);
        Ok((metadata, unit.source))
    }
}

/// Build metadata from an already parsed unit.
pub fn extract_metadata(unit: &ParsedUnit) -> SourceUnitMetadata {
    let root = unit.root();
    let mut functions = Vec::new();
    let mut classes = Vec::new();
    let mut imports = Vec::new();

    let mut cursor = root.walk();
    for node in root.named_children(&mut cursor) {
        match node.kind() {
            "import_statement" => {
                if let Some(import) = import_descriptor(unit, node) {
                    imports.push(import);
                }
            }
            "export_statement" => collect_exported(unit, node, &mut functions, &mut classes),
            kind if FUNCTION_DECLARATIONS.contains(&kind) => {
                if let Some(function) = function_descriptor(unit, node) {
                    functions.push(function);
                }
            }
            kind if CLASS_DECLARATIONS.contains(&kind) => {
                classes.push(class_descriptor(unit, node, false));
            }
            _ => {}
        }
    }

    let complexity = functions.iter().map(|f| f.complexity).sum();
    SourceUnitMetadata {
        file_path: unit.path.clone(),
        functions,
        classes,
        imports,
        complexity,
        line_count: unit.source.split('\n').count(),
    }
}

fn collect_exported(
    unit: &ParsedUnit,
    export: Node<'_>,
    functions: &mut Vec<FunctionDescriptor>,
    classes: &mut Vec<ClassDescriptor>,
) {
    if let Some(declaration) = export.child_by_field_name("declaration") {
        let kind = declaration.kind();
        if FUNCTION_DECLARATIONS.contains(&kind) {
            if let Some(function) = function_descriptor(unit, declaration) {
                functions.push(function);
            }
        } else if CLASS_DECLARATIONS.contains(&kind) {
            classes.push(class_descriptor(unit, declaration, true));
        }
        return;
    }
    // `export default function () {}` and `export default class {}`
    if let Some(value) = export.child_by_field_name("value") {
        if ANONYMOUS_FUNCTIONS.contains(&value.kind()) {
            if let Some(function) = function_descriptor(unit, value) {
                functions.push(function);
            }
        } else if value.kind() == "class" {
            classes.push(class_descriptor(unit, value, true));
        }
    }
}

fn function_descriptor(unit: &ParsedUnit, node: Node<'_>) -> Option<FunctionDescriptor> {
    // Overload signatures and ambient declarations have no body.
    let body = node.child_by_field_name("body")?;
    let name = node
        .child_by_field_name("name")
        .map(|n| unit.text(n).to_string())
        .unwrap_or_else(|| "anonymous".to_string());

    Some(FunctionDescriptor {
        name,
        start_line: node.start_position().row + 1,
        end_line: node.end_position().row + 1,
        parameters: parameter_names(unit, node),
        return_type: node
            .child_by_field_name("return_type")
            .and_then(|annotation| normalize_type_annotation(unit.text(annotation))),
        is_async: has_async_keyword(node),
        statement_count: statement_count(Some(body)),
        complexity: function_complexity(node),
    })
}

fn has_async_keyword(node: Node<'_>) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|child| child.kind() == "async");
    found
}

fn parameter_names(unit: &ParsedUnit, node: Node<'_>) -> Vec<String> {
    let Some(params) = node.child_by_field_name("parameters") else {
        return Vec::new();
    };
    let mut cursor = params.walk();
    let names = params
        .named_children(&mut cursor)
        .filter(|p| p.kind() != "comment")
        .filter_map(|p| {
            let pattern = p.child_by_field_name("pattern").unwrap_or(p);
            let text = unit.text(pattern).trim_start_matches("...").trim();
            if text.is_empty() {
                None
            } else {
                Some(text.to_string())
            }
        })
        .collect();
    names
}

/// Strip the leading `:` of a type annotation. `None` when nothing remains.
pub fn normalize_type_annotation(raw: &str) -> Option<String> {
    let normalized = raw.trim().trim_start_matches(':').trim();
    if normalized.is_empty() {
        None
    } else {
        Some(normalized.to_string())
    }
}

fn class_descriptor(unit: &ParsedUnit, node: Node<'_>, is_exported: bool) -> ClassDescriptor {
    let name = node
        .child_by_field_name("name")
        .map(|n| unit.text(n).to_string())
        .unwrap_or_else(|| "Anonymous".to_string());

    let mut methods = Vec::new();
    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for member in body.named_children(&mut cursor) {
            if member.kind() == "method_definition" {
                if let Some(method_name) = member.child_by_field_name("name") {
                    methods.push(unit.text(method_name).to_string());
                }
            }
        }
    }

    ClassDescriptor {
        name,
        start_line: node.start_position().row + 1,
        methods,
        is_exported,
    }
}

fn import_descriptor(unit: &ParsedUnit, node: Node<'_>) -> Option<ImportDescriptor> {
    // `import x = require('y')` has no source field and is not an import declaration.
    let source = node.child_by_field_name("source")?;
    let module_specifier = unit
        .text(source)
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string();

    let mut named_imports = Vec::new();
    let mut default_import = None;

    let mut cursor = node.walk();
    let clauses: Vec<Node<'_>> = node
        .named_children(&mut cursor)
        .filter(|n| n.kind() == "import_clause")
        .collect();
    for clause in clauses {
        let mut clause_cursor = clause.walk();
        for part in clause.named_children(&mut clause_cursor) {
            match part.kind() {
                "identifier" => default_import = Some(unit.text(part).to_string()),
                "named_imports" => {
                    let mut spec_cursor = part.walk();
                    for specifier in part.named_children(&mut spec_cursor) {
                        if specifier.kind() != "import_specifier" {
                            continue;
                        }
                        if let Some(name) = specifier.child_by_field_name("name") {
                            named_imports.push(unit.text(name).to_string());
                        }
                    }
                }
                _ => {}
            }
        }
    }

    Some(ImportDescriptor {
        module_specifier,
        named_imports,
        default_import,
        line: node.start_position().row + 1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ReviewError;

    fn analyze(src: &str) -> SourceUnitMetadata {
        SourceAnalyzer::new()
            .analyze_source(Path::new("src/sample.ts"), src)
            .unwrap()
    }

    #[test]
    fn test_normalize_type_annotation() {
        assert_eq!(
            normalize_type_annotation(": Promise<User>"),
            Some("Promise<User>".to_string())
        );
        assert_eq!(normalize_type_annotation("  :  "), None);
    }

    #[test]
    fn test_async_function_metadata() {
        let src = "\
interface User {
  id: string;
  name: string;
}

async function fetchUser(id: string, ...rest: unknown[]): Promise<User> {
  const res = await fetch(`/api/users/${id}`);
  return res.json();
}
";
        let metadata = analyze(src);
        assert_eq!(metadata.functions.len(), 1);
        let f = &metadata.functions[0];
        assert_eq!(f.name, "fetchUser");
        assert!(f.is_async);
        assert_eq!(f.parameters, vec!["id", "rest"]);
        assert_eq!(f.return_type.as_deref(), Some("Promise<User>"));
        assert_eq!(f.start_line, 6);
        assert_eq!(f.end_line, 9);
        assert_eq!(f.statement_count, 2);
        assert_eq!(f.complexity, 1);
    }

    #[test]
    fn test_exported_and_default_functions() {
        let src = "\
export function named() { return 1; }
export default function () { return 2; }
function plain(): void {}
declare function ambient(x: number): void;
const arrow = () => 3;
";
        let metadata = analyze(src);
        let names: Vec<&str> = metadata.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["named", "anonymous", "plain"]);
        assert!(!metadata.functions[0].is_async);
        assert_eq!(metadata.functions[2].return_type.as_deref(), Some("void"));
        assert_eq!(metadata.functions[0].return_type, None);
    }

    #[test]
    fn test_class_metadata() {
        let src = "\
import { Order } from './types';

export class OrderService {
  private total = 0;
  constructor(private readonly repo: unknown) {}
  async processOrder(order: Order) { return order; }
  cancel() {}
}

class Internal {
  run() {}
}
";
        let metadata = analyze(src);
        assert_eq!(metadata.classes.len(), 2);
        let service = &metadata.classes[0];
        assert_eq!(service.name, "OrderService");
        assert_eq!(service.start_line, 3);
        assert!(service.is_exported);
        assert_eq!(service.methods, vec!["constructor", "processOrder", "cancel"]);
        assert!(!metadata.classes[1].is_exported);
        // Methods are not top-level functions.
        assert!(metadata.functions.is_empty());
    }

    #[test]
    fn test_import_metadata() {
        let src = "\
import express, { Router, Request as Req } from 'express';
import * as fs from \"node:fs\";
import './polyfills';
import type { Config } from '../config';
";
        let metadata = analyze(src);
        assert_eq!(metadata.imports.len(), 4);

        let first = &metadata.imports[0];
        assert_eq!(first.module_specifier, "express");
        assert_eq!(first.default_import.as_deref(), Some("express"));
        assert_eq!(first.named_imports, vec!["Router", "Request"]);
        assert_eq!(first.line, 1);

        assert_eq!(metadata.imports[1].module_specifier, "node:fs");
        assert!(metadata.imports[1].named_imports.is_empty());
        assert_eq!(metadata.imports[1].default_import, None);

        assert_eq!(metadata.imports[2].module_specifier, "./polyfills");
        assert_eq!(metadata.imports[3].named_imports, vec!["Config"]);
        assert_eq!(metadata.imports[3].line, 4);
    }

    #[test]
    fn test_aggregate_complexity_and_line_count() {
        let src = "\
function a(x: number) { if (x) { return 1; } return 0; }
function b(x: boolean, y: boolean) { return x && y; }
function c() { return 0; }";
        let metadata = analyze(src);
        assert_eq!(metadata.complexity, 2 + 2 + 1);
        assert_eq!(metadata.line_count, 3);
        assert_eq!(metadata.file_path, "src/sample.ts");
    }

    #[test]
    fn test_analyze_reads_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("a.ts");
        std::fs::write(&path, "export async function go() {\n  await run();\n}\n").unwrap();
        let (metadata, source) = SourceAnalyzer::new().analyze_with_source(&path).unwrap();
        assert_eq!(metadata.functions.len(), 1);
        assert!(source.contains("await run()"));
        assert_eq!(metadata.line_count, 4);
    }

    #[test]
    fn test_parse_failure_signal() {
        let err = SourceAnalyzer::new()
            .analyze_source(Path::new("bad.ts"), "export function ( {")
            .unwrap_err();
        assert!(matches!(err, ReviewError::Parse { .. }));
    }
}
