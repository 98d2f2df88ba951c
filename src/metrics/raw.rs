//! Raw line metrics
//!
//! Every physical line is put in exactly one bucket, checked in this order:
//! part of a multi-line string statement, blank, comment-only, source.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tree_sitter::Node;

use crate::parse::SyntaxTree;
use crate::slice::count_lines;

/// Line counts for one source file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMetrics {
    /// Total physical lines
    pub loc: usize,
    /// Logical lines (statements and clause headers)
    pub lloc: usize,
    /// Source lines: not blank, not comment-only, not inside a multi-line string
    pub sloc: usize,
    /// Lines carrying a `#` comment, inline ones included
    pub comments: usize,
    /// Lines belonging to multi-line string statements (docstrings)
    pub multi: usize,
    /// Blank lines outside multi-line strings
    pub blank: usize,
}

/// Node kinds that close a logical line besides `*_statement`
const LOGICAL_LINE_KINDS: &[&str] = &[
    "function_definition",
    "class_definition",
    "elif_clause",
    "else_clause",
    "except_clause",
    "except_group_clause",
    "finally_clause",
    "case_clause",
];

pub fn compute(tree: &SyntaxTree) -> RawMetrics {
    let source = tree.source();
    let loc = count_lines(source);

    let mut comment_rows: HashSet<usize> = HashSet::new();
    let mut comment_only_rows: HashSet<usize> = HashSet::new();
    let mut multi_rows: HashSet<usize> = HashSet::new();
    let mut lloc = 0;

    let lines: Vec<&str> = source.lines().collect();

    visit(&tree.root(), &mut |node| {
        let kind = node.kind();
        if kind == "comment" {
            let pos = node.start_position();
            comment_rows.insert(pos.row);
            let line = lines.get(pos.row).copied().unwrap_or("");
            let indent = line.len() - line.trim_start().len();
            if indent == pos.column {
                comment_only_rows.insert(pos.row);
            }
        } else if is_multiline_string_statement(node) {
            multi_rows.extend(node.start_position().row..=node.end_position().row);
        }

        if kind.ends_with("_statement") || LOGICAL_LINE_KINDS.contains(&kind) {
            lloc += 1;
        }
    });

    let mut metrics = RawMetrics {
        loc,
        lloc,
        comments: comment_rows.len(),
        multi: multi_rows.len(),
        ..Default::default()
    };

    for (row, line) in lines.iter().enumerate() {
        if multi_rows.contains(&row) {
            continue;
        }
        if line.trim().is_empty() {
            metrics.blank += 1;
        } else if !comment_only_rows.contains(&row) {
            metrics.sloc += 1;
        }
    }

    metrics
}

/// A bare string expression spanning more than one line, e.g. a docstring
fn is_multiline_string_statement(node: &Node) -> bool {
    if node.kind() != "expression_statement" || node.named_child_count() != 1 {
        return false;
    }
    let Some(expr) = node.named_child(0) else {
        return false;
    };
    matches!(expr.kind(), "string" | "concatenated_string")
        && expr.end_position().row > expr.start_position().row
}

pub(crate) fn visit<F>(node: &Node, f: &mut F)
where
    F: FnMut(&Node),
{
    f(node);
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        visit(&child, f);
    }
}
