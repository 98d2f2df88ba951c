//! Verbatim source slices for definitions

use crate::error::{CodeSightError, Result};
use crate::schema::DefinitionNode;

/// Byte offsets at which each line of `source` begins
///
/// A trailing newline does not open a new line, so `"a\nb\n"` has two lines
/// and the empty string has none.
pub fn line_starts(source: &str) -> Vec<usize> {
    if source.is_empty() {
        return Vec::new();
    }
    let mut starts = vec![0];
    starts.extend(
        source
            .bytes()
            .enumerate()
            .filter(|&(i, b)| b == b'\n' && i + 1 < source.len())
            .map(|(i, _)| i + 1),
    );
    starts
}

/// Number of lines in `source`
pub fn count_lines(source: &str) -> usize {
    line_starts(source).len()
}

/// Text from the start of `start_line` to the end of `end_line` (1-based, inclusive)
///
/// Inner line breaks and indentation are preserved; the terminator of the
/// last line is not included.
pub fn slice(source: &str, start_line: usize, end_line: usize) -> Result<&str> {
    let starts = line_starts(source);
    let total = starts.len();

    if start_line == 0 || end_line < start_line || end_line > total {
        return Err(CodeSightError::Range {
            start: start_line,
            end: end_line,
            total,
        });
    }

    let begin = starts[start_line - 1];
    let end = starts.get(end_line).copied().unwrap_or(source.len());
    let text = &source[begin..end];

    Ok(strip_line_terminator(text))
}

/// Slice the full span of a definition
pub fn slice_definition<'s>(source: &'s str, node: &DefinitionNode) -> Result<&'s str> {
    slice(source, node.start_line, node.end_line)
}

fn strip_line_terminator(text: &str) -> &str {
    match text.strip_suffix('\n') {
        Some(rest) => rest.strip_suffix('\r').unwrap_or(rest),
        None => text,
    }
}

/// Remove the indentation shared by all non-blank lines
///
/// Nested definitions are sliced with their enclosing indentation, which
/// would not parse at module level.
pub fn dedent(text: &str) -> String {
    let indent = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start_matches([' ', '\t']).len())
        .min()
        .unwrap_or(0);

    if indent == 0 {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let leading = line.len() - line.trim_start_matches([' ', '\t']).len();
        out.push_str(&line[leading.min(indent)..]);
    }
    out
}
