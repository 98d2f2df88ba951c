//! Python 3 rules the tree-sitter grammar does not enforce
//!
//! The grammar still accepts Python 2 statements, bodies with no statements,
//! inconsistent indentation, misordered parameters and comma-separated
//! iterables in comprehensions. Each of these is a `SyntaxError` for the
//! interpreter, so a tree containing one is rejected here.

use std::ops::Range;

use tree_sitter::Node;

use crate::error::{CodeSightError, Result};

/// Check a parsed tree, returning the first violation in document order
pub(crate) fn check(root: &Node, source: &str) -> Result<()> {
    let mut literals = Vec::new();
    visit(root, source, &mut literals)?;
    check_backticks(source, &literals)
}

fn visit(node: &Node, source: &str, literals: &mut Vec<Range<usize>>) -> Result<()> {
    match node.kind() {
        "string" | "comment" => {
            literals.push(node.byte_range());
            return Ok(());
        }
        "print_statement" => return Err(invalid(node, "Python 2 print statement")),
        "exec_statement" => return Err(invalid(node, "Python 2 exec statement")),
        "module" => check_indentation(node, source, Some(0), None)?,
        "block" => {
            let owner = node.parent().unwrap_or(*node);
            if !node.named_children(&mut node.walk()).any(|c| c.kind() != "comment") {
                return Err(invalid(&owner, "expected an indented block"));
            }
            let header = line_indent(source, owner.start_byte());
            check_indentation(node, source, None, Some(header))?;
        }
        "function_definition" | "class_definition" => {
            if node.child_by_field_name("body").is_none() {
                return Err(invalid(node, "expected an indented block"));
            }
        }
        "parameters" | "lambda_parameters" => check_parameter_order(node)?,
        "for_in_clause" => {
            if node.children(&mut node.walk()).any(|c| c.kind() == ",") {
                return Err(invalid(node, "comprehension iterable must be parenthesized"));
            }
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        visit(&child, source, literals)?;
    }
    Ok(())
}

/// Statements that start a line in one body must share a column
///
/// A block's column must also be deeper than the line of its header.
fn check_indentation(
    body: &Node,
    source: &str,
    expected: Option<usize>,
    header: Option<usize>,
) -> Result<()> {
    let mut column = expected;
    let mut cursor = body.walk();
    for stmt in body.named_children(&mut cursor) {
        if matches!(stmt.kind(), "comment" | "line_continuation") || !starts_line(&stmt, source) {
            continue;
        }
        let col = stmt.start_position().column;
        match column {
            None if header.is_some_and(|h| col <= h) => {
                return Err(invalid(&stmt, "expected an indented block"))
            }
            None => column = Some(col),
            Some(c) if c == col => {}
            Some(c) if col > c => return Err(invalid(&stmt, "unexpected indent")),
            Some(_) => {
                return Err(invalid(
                    &stmt,
                    "unindent does not match any outer indentation level",
                ))
            }
        }
    }
    Ok(())
}

fn starts_line(node: &Node, source: &str) -> bool {
    let start = node.start_byte();
    let line_start = source[..start].rfind('\n').map_or(0, |i| i + 1);
    source[line_start..start].chars().all(|c| c == ' ' || c == '\t')
}

/// Column of the first non-blank character on the line containing `offset`
fn line_indent(source: &str, offset: usize) -> usize {
    let line_start = source[..offset].rfind('\n').map_or(0, |i| i + 1);
    source[line_start..]
        .bytes()
        .take_while(|b| *b == b' ' || *b == b'\t')
        .count()
}

/// Defaults, `*` and `**` must come in the order Python allows
fn check_parameter_order(params: &Node) -> Result<()> {
    let mut seen_default = false;
    let mut seen_star = false;
    let mut bare_star_pending = false;
    let mut seen_kwargs = false;

    let mut cursor = params.walk();
    for param in params.named_children(&mut cursor) {
        let kind = param_kind(&param);
        if kind == "comment" {
            continue;
        }
        if seen_kwargs {
            return Err(invalid(&param, "parameter cannot follow **kwargs"));
        }
        match kind {
            "dictionary_splat_pattern" => {
                if bare_star_pending {
                    return Err(invalid(&param, "named arguments must follow bare *"));
                }
                seen_kwargs = true;
            }
            "list_splat_pattern" | "keyword_separator" => {
                if seen_star {
                    return Err(invalid(&param, "* argument may appear only once"));
                }
                seen_star = true;
                bare_star_pending = kind == "keyword_separator";
            }
            "positional_separator" => {
                if seen_star {
                    return Err(invalid(&param, "/ must be ahead of *"));
                }
            }
            "default_parameter" | "typed_default_parameter" => {
                seen_default = true;
                bare_star_pending = false;
            }
            _ => {
                if seen_default && !seen_star {
                    return Err(invalid(
                        &param,
                        "non-default argument follows default argument",
                    ));
                }
                bare_star_pending = false;
            }
        }
    }

    if bare_star_pending {
        return Err(invalid(params, "named arguments must follow bare *"));
    }
    Ok(())
}

/// Kind of a parameter, looking through a type annotation to its target
fn param_kind(param: &Node) -> &'static str {
    if param.kind() == "typed_parameter" {
        if let Some(target) = param.named_child(0) {
            return target.kind();
        }
    }
    param.kind()
}

fn check_backticks(source: &str, literals: &[Range<usize>]) -> Result<()> {
    let stray = source
        .match_indices('`')
        .map(|(i, _)| i)
        .find(|i| !literals.iter().any(|r| r.contains(i)));

    match stray {
        Some(offset) => {
            let before = &source[..offset];
            let line = before.matches('\n').count() + 1;
            let column = offset - before.rfind('\n').map_or(0, |i| i + 1);
            Err(CodeSightError::Syntax {
                line,
                column,
                message: "backtick repr is not Python 3 syntax".to_string(),
            })
        }
        None => Ok(()),
    }
}

fn invalid(node: &Node, message: &str) -> CodeSightError {
    let pos = node.start_position();
    CodeSightError::Syntax {
        line: pos.row + 1,
        column: pos.column,
        message: message.to_string(),
    }
}
