//! Parsing source text into a checked syntax tree
//!
//! Tree-sitter is error tolerant: it always produces a tree and marks the bad
//! regions with ERROR or MISSING nodes. The analyser has no use for a partial
//! tree, so [`parse`] rejects any tree that contains one and reports the first
//! offending position instead.
//!
//! The grammar is also looser than Python 3 in places (Python 2 statements,
//! empty bodies, indentation, parameter order) and stricter in one: a line
//! inside brackets that is indented less than its statement. The first set is
//! caught by [`crate::validate`]; the second is handled by re-indenting such
//! lines and parsing again.

use tree_sitter::{Node, Parser, Tree};

use crate::error::{CodeSightError, Result};
use crate::lang::Lang;
use crate::validate;

/// A source file together with its successfully parsed tree
pub struct SyntaxTree {
    source: String,
    tree: Tree,
}

impl SyntaxTree {
    /// The source text the tree was built from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Root node of the tree
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }
}

impl std::fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntaxTree")
            .field("bytes", &self.source.len())
            .field("root", &self.tree.root_node().kind())
            .finish()
    }
}

/// Create a parser loaded with the grammar for `lang`
pub fn new_parser(lang: Lang) -> Result<Parser> {
    let mut parser = Parser::new();
    parser
        .set_language(&lang.tree_sitter_language())
        .map_err(|e| CodeSightError::ParseFailure {
            message: format!("Failed to set language: {:?}", e),
        })?;
    Ok(parser)
}

/// Parse Python source, failing with [`CodeSightError::Syntax`] on invalid input
pub fn parse(source: &str) -> Result<SyntaxTree> {
    parse_as(source, Lang::Python)
}

/// Parse source in the given language
///
/// The returned tree's [`SyntaxTree::source`] may differ from `source` in the
/// leading whitespace of bracketed continuation lines. Line numbers are kept.
pub fn parse_as(source: &str, lang: Lang) -> Result<SyntaxTree> {
    let mut parser = new_parser(lang)?;
    let tree = parse_tree(&mut parser, source)?;

    let (text, tree) = if tree.root_node().has_error() {
        let retry = match reindent_bracket_continuations(source) {
            Some(padded) => {
                let retried = parse_tree(&mut parser, &padded)?;
                (!retried.root_node().has_error()).then_some((padded, retried))
            }
            None => None,
        };
        match retry {
            Some(parsed) => {
                tracing::debug!("parsed after re-indenting bracketed continuation lines");
                parsed
            }
            None => {
                let err = tree_error(&tree.root_node(), source);
                tracing::debug!(error = %err, "source rejected by parser");
                return Err(err);
            }
        }
    } else {
        (source.to_string(), tree)
    };

    let root = tree.root_node();
    if let Err(err) = validate::check(&root, &text) {
        tracing::debug!(error = %err, "source rejected by validation");
        return Err(err);
    }

    tracing::debug!(nodes = count_nodes(&root), bytes = text.len(), "parsed source");

    Ok(SyntaxTree { source: text, tree })
}

fn parse_tree(parser: &mut Parser, source: &str) -> Result<Tree> {
    parser
        .parse(source, None)
        .ok_or_else(|| CodeSightError::ParseFailure {
            message: "Failed to parse file".to_string(),
        })
}

fn tree_error(root: &Node, source: &str) -> CodeSightError {
    first_error(root)
        .map(|node| syntax_error(&node, source))
        .unwrap_or_else(|| CodeSightError::Syntax {
            line: 1,
            column: 0,
            message: "invalid syntax".to_string(),
        })
}

/// Indent lines that start inside brackets to at least their statement's depth
///
/// Python ignores indentation inside brackets, but the grammar's scanner emits
/// a dedent for such a line when it is shallower than the enclosing block.
/// Returns `None` when no line needs padding.
fn reindent_bracket_continuations(source: &str) -> Option<String> {
    let mut out = String::with_capacity(source.len() + 64);
    let mut depth = 0usize;
    let mut string: Option<(char, bool)> = None;
    let mut statement_indent = 0usize;
    let mut changed = false;

    for line in source.split_inclusive('\n') {
        if string.is_none() && !line.trim().is_empty() {
            let indent = indent_width(line);
            if depth == 0 {
                statement_indent = indent;
            } else if indent < statement_indent {
                out.push_str(&" ".repeat(statement_indent - indent));
                changed = true;
            }
        }
        out.push_str(line);
        scan_brackets(line, &mut depth, &mut string);
    }

    changed.then_some(out)
}

/// Indentation width as the grammar's scanner counts it (tab = 8)
fn indent_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .map(|c| if c == '\t' { 8 } else { 1 })
        .sum()
}

/// Track bracket depth and the open string across one line
fn scan_brackets(line: &str, depth: &mut usize, string: &mut Option<(char, bool)>) {
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match *string {
            Some((quote, triple)) => {
                if c == '\\' {
                    i += 2;
                    continue;
                }
                if c == quote {
                    if !triple {
                        *string = None;
                    } else if chars.get(i + 1) == Some(&quote) && chars.get(i + 2) == Some(&quote) {
                        *string = None;
                        i += 3;
                        continue;
                    }
                } else if c == '\n' && !triple {
                    *string = None;
                }
            }
            None => match c {
                '#' => break,
                '\'' | '"' => {
                    let triple = chars.get(i + 1) == Some(&c) && chars.get(i + 2) == Some(&c);
                    *string = Some((c, triple));
                    if triple {
                        i += 3;
                        continue;
                    }
                }
                '(' | '[' | '{' => *depth += 1,
                ')' | ']' | '}' => *depth = depth.saturating_sub(1),
                _ => {}
            },
        }
        i += 1;
    }
}

/// Deepest last descendant of `node` that is not a comment
///
/// Tree-sitter lets a block swallow trailing comments and the blank lines
/// before them; this node ends where the code really stops.
pub(crate) fn code_end<'t>(node: Node<'t>) -> Node<'t> {
    let mut current = node;
    loop {
        let mut cursor = current.walk();
        let last = current
            .children(&mut cursor)
            .filter(|c| c.kind() != "comment")
            .last();
        match last {
            Some(child) => current = child,
            None => return current,
        }
    }
}

/// Find the first ERROR or MISSING node in document order
fn first_error<'t>(node: &Node<'t>) -> Option<Node<'t>> {
    if node.is_error() || node.is_missing() {
        return Some(*node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'t>> = node.children(&mut cursor).collect();
    children.iter().find_map(first_error)
}

fn syntax_error(node: &Node, source: &str) -> CodeSightError {
    let pos = node.start_position();
    let message = if node.is_missing() {
        format!("expected `{}`", node.kind())
    } else {
        let text = &source[node.start_byte()..node.end_byte()];
        let first_line = text.lines().next().unwrap_or("").trim();
        if first_line.is_empty() {
            "invalid syntax".to_string()
        } else {
            format!("invalid syntax near `{}`", preview(first_line, 40))
        }
    };

    CodeSightError::Syntax {
        line: pos.row + 1,
        column: pos.column,
        message,
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut)
}

/// Count total nodes in the AST
pub fn count_nodes(node: &Node) -> usize {
    let mut count = 1;
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        count += count_nodes(&child);
    }
    count
}

/// Render the tree as an indented outline, one node per line
pub fn dump_ast(tree: &SyntaxTree) -> String {
    let mut out = String::new();
    dump_node(&tree.root(), tree.source(), 0, &mut out);
    out
}

fn dump_node(node: &Node, source: &str, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    let text = &source[node.start_byte()..node.end_byte()];
    let text_preview = preview(text, 50).replace('\n', "\\n");

    out.push_str(&format!(
        "{}{}{} [{}-{}] \"{}\"\n",
        indent,
        node.kind(),
        if node.is_named() { "" } else { " (anonymous)" },
        node.start_position().row + 1,
        node.end_position().row + 1,
        text_preview,
    ));

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        dump_node(&child, source, depth + 1, out);
    }
}
