//! Halstead measures over operator expressions

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tree_sitter::Node;

use crate::metrics::raw::visit;
use crate::parse::SyntaxTree;

/// Operator/operand counts and derived volume
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Halstead {
    /// Distinct operators (n1)
    pub distinct_operators: usize,
    /// Distinct operands (n2)
    pub distinct_operands: usize,
    /// Total operators (N1)
    pub total_operators: usize,
    /// Total operands (N2)
    pub total_operands: usize,
}

impl Halstead {
    pub fn vocabulary(&self) -> usize {
        self.distinct_operators + self.distinct_operands
    }

    pub fn length(&self) -> usize {
        self.total_operators + self.total_operands
    }

    /// `N * log2(n)`, zero for an empty vocabulary
    pub fn volume(&self) -> f64 {
        let n = self.vocabulary();
        if n == 0 {
            return 0.0;
        }
        self.length() as f64 * (n as f64).log2()
    }
}

#[derive(Default)]
struct Counter<'s> {
    operators: Vec<&'s str>,
    operands: Vec<&'s str>,
}

pub fn compute(tree: &SyntaxTree) -> Halstead {
    let source = tree.source();
    let mut counter = Counter::default();

    visit(&tree.root(), &mut |node| match node.kind() {
        "binary_operator" | "boolean_operator" | "augmented_assignment" => {
            push_field(&mut counter.operators, node, "operator", source);
            push_field(&mut counter.operands, node, "left", source);
            push_field(&mut counter.operands, node, "right", source);
        }
        "unary_operator" => {
            push_field(&mut counter.operators, node, "operator", source);
            push_field(&mut counter.operands, node, "argument", source);
        }
        "not_operator" => {
            counter.operators.push("not");
            push_field(&mut counter.operands, node, "argument", source);
        }
        "comparison_operator" => {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                if child.kind() == "comment" {
                    continue;
                }
                if child.is_named() {
                    counter.operands.push(text(&child, source));
                } else {
                    counter.operators.push(text(&child, source));
                }
            }
        }
        _ => {}
    });

    let distinct_operators = counter.operators.iter().collect::<HashSet<_>>().len();
    let distinct_operands = counter.operands.iter().collect::<HashSet<_>>().len();

    Halstead {
        distinct_operators,
        distinct_operands,
        total_operators: counter.operators.len(),
        total_operands: counter.operands.len(),
    }
}

fn push_field<'s>(into: &mut Vec<&'s str>, node: &Node, field: &str, source: &'s str) {
    if let Some(child) = node.child_by_field_name(field) {
        into.push(text(&child, source));
    }
}

fn text<'s>(node: &Node, source: &'s str) -> &'s str {
    &source[node.start_byte()..node.end_byte()]
}
