//! Structural approximation of cyclomatic complexity and body size.
//!
//! Counting is per function: nested function-like nodes are not descended
//! into, so their branches never inflate the enclosing function.

use tree_sitter::Node;

/// Node kinds that start a separate function scope.
const FUNCTION_SCOPES: &[&str] = &[
    "function_declaration",
    "generator_function_declaration",
    "function_expression",
    "function",
    "generator_function",
    "arrow_function",
    "method_definition",
];

/// Node kinds that add one decision point each.
const BRANCH_KINDS: &[&str] = &[
    "if_statement",
    "for_statement",
    // for-in and for-of share this node kind.
    "for_in_statement",
    "while_statement",
    "switch_case",
    "ternary_expression",
];

const SHORT_CIRCUIT_OPERATORS: &[&str] = &["&&", "||"];

pub fn is_function_scope(kind: &str) -> bool {
    FUNCTION_SCOPES.contains(&kind)
}

/// 1 plus one for every branch node and short-circuit operator inside
/// `function`, excluding nested functions.
pub fn function_complexity(function: Node<'_>) -> u32 {
    let mut complexity = 1;
    let mut stack: Vec<Node<'_>> = Vec::new();
    let mut cursor = function.walk();
    stack.extend(function.children(&mut cursor));

    while let Some(node) = stack.pop() {
        let kind = node.kind();
        if is_function_scope(kind) {
            continue;
        }
        if BRANCH_KINDS.contains(&kind) || is_short_circuit(node) {
            complexity += 1;
        }
        let mut cursor = node.walk();
        stack.extend(node.children(&mut cursor));
    }
    complexity
}

fn is_short_circuit(node: Node<'_>) -> bool {
    node.kind() == "binary_expression"
        && node
            .child_by_field_name("operator")
            .map(|op| SHORT_CIRCUIT_OPERATORS.contains(&op.kind()))
            .unwrap_or(false)
}

/// Direct statements of a `statement_block`; comments are not statements.
pub fn statement_count(body: Option<Node<'_>>) -> usize {
    let Some(body) = body else {
        return 0;
    };
    if body.kind() != "statement_block" {
        return 0;
    }
    let mut cursor = body.walk();
    let count = body
        .named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .count();
    count
}
