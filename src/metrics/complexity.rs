//! Cyclomatic complexity per function, method and class
//!
//! Scoring follows radon: every block starts at 1 and gains 1 per decision
//! point found in its own body. Bodies of nested functions and classes are
//! scored separately and do not leak into the enclosing block.

use serde::{Deserialize, Serialize};
use tree_sitter::Node;

use crate::parse::{code_end, SyntaxTree};

/// Complexity above this is flagged as high
pub const HIGH_COMPLEXITY_THRESHOLD: usize = 10;

/// What kind of block a complexity entry scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Function,
    Method,
    Class,
}

/// Cyclomatic complexity of one block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexityEntry {
    /// Dotted name, e.g. `Parser.parse`
    pub name: String,
    pub kind: BlockKind,
    pub start_line: usize,
    pub end_line: usize,
    pub score: usize,
}

impl ComplexityEntry {
    pub fn is_high(&self) -> bool {
        self.score > HIGH_COMPLEXITY_THRESHOLD
    }

    /// Radon's letter rank for a block score
    pub fn rank(&self) -> char {
        match self.score {
            0..=5 => 'A',
            6..=10 => 'B',
            11..=20 => 'C',
            21..=30 => 'D',
            31..=40 => 'E',
            _ => 'F',
        }
    }
}

/// Score every function, method and class, in source order
pub fn compute(tree: &SyntaxTree) -> Vec<ComplexityEntry> {
    let mut entries = Vec::new();
    collect_blocks(&tree.root(), tree.source(), "", false, &mut entries);
    entries
}

/// Sum used by the maintainability index: module-level decisions, top-level
/// function scores and the full (undivided) complexity of top-level classes
pub fn total_complexity(tree: &SyntaxTree) -> usize {
    let root = tree.root();
    let mut entries = Vec::new();
    let top = collect_blocks(&root, tree.source(), "", false, &mut entries);
    decision_points(&root) + top.function_scores.iter().sum::<usize>() + top.class_complexity
}

/// Blocks reached from one scope without crossing another definition
#[derive(Default)]
struct ScopeBlocks {
    function_scores: Vec<usize>,
    class_complexity: usize,
}

/// Walk `node`, pushing an entry per block; functions found directly in a
/// class body are methods
fn collect_blocks(
    node: &Node,
    source: &str,
    scope: &str,
    in_class: bool,
    out: &mut Vec<ComplexityEntry>,
) -> ScopeBlocks {
    let mut found = ScopeBlocks::default();
    let mut cursor = node.walk();

    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "function_definition" => {
                let name = qualify(scope, block_name(&child, source));
                let score = 1 + body_decision_points(&child);
                out.push(ComplexityEntry {
                    name: name.clone(),
                    kind: if in_class {
                        BlockKind::Method
                    } else {
                        BlockKind::Function
                    },
                    start_line: child.start_position().row + 1,
                    end_line: code_end(child).end_position().row + 1,
                    score,
                });
                found.function_scores.push(score);
                collect_blocks(&child, source, &name, false, out);
            }
            "class_definition" => {
                let name = qualify(scope, block_name(&child, source));
                let index = out.len();
                out.push(ComplexityEntry {
                    name: name.clone(),
                    kind: BlockKind::Class,
                    start_line: child.start_position().row + 1,
                    end_line: code_end(child).end_position().row + 1,
                    score: 1,
                });
                let methods = collect_blocks(&child, source, &name, true, out).function_scores;
                let real = 1 + body_decision_points(&child) + methods.iter().sum::<usize>();
                out[index].score = class_score(real, methods.len());
                found.class_complexity += real;
            }
            _ => {
                let inner = collect_blocks(&child, source, scope, in_class, out);
                found.function_scores.extend(inner.function_scores);
                found.class_complexity += inner.class_complexity;
            }
        }
    }

    found
}

/// A class with methods scores its total over the method count, plus one
/// when there is more than one method
fn class_score(real: usize, methods: usize) -> usize {
    match methods {
        0 | 1 => real,
        n => real / n + 1,
    }
}

fn body_decision_points(definition: &Node) -> usize {
    definition
        .child_by_field_name("body")
        .map(|b| decision_points(&b))
        .unwrap_or(0)
}

/// Count decision points under `node` without entering nested definitions
pub(crate) fn decision_points(node: &Node) -> usize {
    let mut count = 0;
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        count += match child.kind() {
            "function_definition" | "class_definition" => continue,
            "if_statement" | "elif_clause" | "for_statement" | "while_statement"
            | "except_clause" | "except_group_clause" | "with_statement" | "assert_statement"
            | "conditional_expression" | "for_in_clause" | "if_clause" | "case_clause"
            | "boolean_operator" => 1,
            // loop and try `else`, not the `if` one
            "else_clause"
                if matches!(
                    node.kind(),
                    "for_statement" | "while_statement" | "try_statement"
                ) =>
            {
                1
            }
            _ => 0,
        };
        count += decision_points(&child);
    }
    count
}

fn block_name<'s>(node: &Node, source: &'s str) -> &'s str {
    node.child_by_field_name("name")
        .map(|n| &source[n.start_byte()..n.end_byte()])
        .unwrap_or("<anonymous>")
}

fn qualify(scope: &str, name: &str) -> String {
    if scope.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", scope, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse;

    fn scores(src: &str) -> Vec<(String, usize)> {
        compute(&parse(src).unwrap())
            .into_iter()
            .map(|e| (e.name, e.score))
            .collect()
    }

    #[test]
    fn test_straight_line_function_is_one() {
        assert_eq!(scores("def f():\n    return 1\n"), vec![("f".to_string(), 1)]);
    }

    #[test]
    fn test_if_elif_else() {
        let src = "def f(x):\n    if x > 0:\n        return 1\n    elif x < 0:\n        return -1\n    else:\n        return 0\n";
        assert_eq!(scores(src), vec![("f".to_string(), 3)]);
    }

    #[test]
    fn test_boolean_operators_and_comprehensions() {
        let src = "def f(xs, a, b, c):\n    if a and b or c:\n        pass\n    return [x for x in xs if x]\n";
        // if +1, two boolean operators +2, for clause +1, if clause +1
        assert_eq!(scores(src), vec![("f".to_string(), 6)]);
    }

    #[test]
    fn test_loops_try_with_assert() {
        let src = "\
def f(items):
    for i in items:
        while i:
            i -= 1
    try:
        with open('x') as fh:
            pass
    except ValueError:
        pass
    except KeyError:
        pass
    assert items
    return 1 if items else 0
";
        // for, while, with, 2 excepts, assert, ternary
        assert_eq!(scores(src), vec![("f".to_string(), 8)]);
    }

    #[test]
    fn test_nested_function_scored_separately() {
        let src = "def outer(x):\n    def inner(y):\n        if y:\n            return y\n    return inner(x)\n";
        assert_eq!(
            scores(src),
            vec![("outer".to_string(), 1), ("outer.inner".to_string(), 2)]
        );
    }

    #[test]
    fn test_class_score_divides_by_method_count() {
        let src = "\
class K:
    def a(self):
        return 1

    @property
    def b(self):
        if self:
            return 1
        return 2
";
        let entries = compute(&parse(src).unwrap());
        let kinds: Vec<BlockKind> = entries.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![BlockKind::Class, BlockKind::Method, BlockKind::Method]
        );
        // methods 1 + 2 plus the class's own 1, over two methods, plus one
        assert_eq!(entries[0].score, 3);
        assert_eq!(entries[2].name, "K.b");
    }

    #[test]
    fn test_total_includes_module_level_branches() {
        let tree = parse("if x:\n    pass\n\ndef f():\n    return 1\n").unwrap();
        assert_eq!(total_complexity(&tree), 2);
    }

    #[test]
    fn test_loop_and_try_else_branches() {
        let src = "\
def f(items):
    for i in items:
        pass
    else:
        pass
    try:
        pass
    except ValueError:
        pass
    else:
        pass
    finally:
        pass
";
        // for, for-else, except, try-else; `finally` adds nothing
        assert_eq!(scores(src), vec![("f".to_string(), 5)]);
    }

    #[test]
    fn test_class_body_branches_count_toward_class() {
        let src = "\
class C:
    if DEBUG:
        level = 1

    def m(self):
        return 1

    class Inner:
        def n(self):
            if self:
                return 1
";
        let tree = parse(src).unwrap();
        let entries = compute(&tree);
        assert_eq!(entries[0].name, "C");
        assert_eq!(entries[0].score, 3);
        assert_eq!(entries[2].name, "C.Inner");
        assert_eq!(entries[2].score, 3);
        // nested classes stay out of their parent's total
        assert_eq!(total_complexity(&tree), 3);
    }

    #[test]
    fn test_end_line_ignores_trailing_comment() {
        let src = "def f():\n    pass\n    # trailing comment\nx = 1\n";
        let entries = compute(&parse(src).unwrap());
        assert_eq!((entries[0].start_line, entries[0].end_line), (1, 2));
    }

    #[test]
    fn test_high_threshold() {
        let entry = ComplexityEntry {
            name: "f".to_string(),
            kind: BlockKind::Function,
            start_line: 1,
            end_line: 2,
            score: 11,
        };
        assert!(entry.is_high());
        assert_eq!(entry.rank(), 'C');
    }
}
