//! Core data types shared by extraction, metrics and presentation

use serde::{Deserialize, Serialize};

/// What a definition node declares
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefinitionKind {
    Function,
    Class,
}

impl DefinitionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Class => "class",
        }
    }

    /// Parse the form produced by [`DefinitionKind::as_str`]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "function" => Some(Self::Function),
            "class" => Some(Self::Class),
            _ => None,
        }
    }
}

/// Stable identity of a definition within one analysis pass
///
/// Two distinct definitions of the same kind can never share a line span, so
/// kind plus span is enough to key per-definition UI state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DefinitionId {
    pub kind: DefinitionKind,
    pub start_line: usize,
    pub end_line: usize,
}

impl std::fmt::Display for DefinitionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}-{}",
            self.kind.as_str(),
            self.start_line,
            self.end_line
        )
    }
}

/// How a parameter binds its argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    /// Declared before a `/` separator
    PositionalOnly,
    /// Plain parameter
    PositionalOrKeyword,
    /// `*args`
    VarPositional,
    /// Declared after `*` or `*args`
    KeywordOnly,
    /// `**kwargs`
    VarKeyword,
}

impl ParameterKind {
    pub fn is_variadic(&self) -> bool {
        matches!(self, Self::VarPositional | Self::VarKeyword)
    }
}

/// A single declared parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub kind: ParameterKind,
    pub has_default: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
}

/// A function or class definition found in the syntax tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionNode {
    pub kind: DefinitionKind,
    pub name: String,
    /// Dotted path through enclosing definitions, e.g. `Parser.parse`
    pub qualified_name: String,
    /// 1-based line of the `def`/`class` keyword (decorators excluded)
    pub start_line: usize,
    /// 1-based, inclusive
    pub end_line: usize,
    pub start_byte: usize,
    pub end_byte: usize,
    /// Number of enclosing function/class definitions
    pub depth: usize,
    pub is_async: bool,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub decorators: Vec<String>,
    /// Declared parameters in order (always empty for classes)
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub parameters: Vec<Parameter>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub return_annotation: Option<String>,
    /// Base classes for classes
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub bases: Vec<String>,
}

impl DefinitionNode {
    pub fn id(&self) -> DefinitionId {
        DefinitionId {
            kind: self.kind,
            start_line: self.start_line,
            end_line: self.end_line,
        }
    }

    pub fn line_count(&self) -> usize {
        self.end_line - self.start_line + 1
    }
}

/// Descriptive record of one function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionMetadata {
    pub name: String,
    pub start_line: usize,
    pub end_line: usize,
    pub parameter_count: usize,
    pub parameter_names: Vec<String>,
}

/// A function definition joined with its verbatim source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionRecord {
    pub id: DefinitionId,
    pub qualified_name: String,
    pub metadata: FunctionMetadata,
    pub parameters: Vec<Parameter>,
    pub source: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_id_display_and_order() {
        let a = DefinitionId {
            kind: DefinitionKind::Function,
            start_line: 1,
            end_line: 4,
        };
        let b = DefinitionId {
            kind: DefinitionKind::Function,
            start_line: 2,
            end_line: 3,
        };
        assert_eq!(a.to_string(), "function:1-4");
        assert!(a < b);
    }

    #[test]
    fn test_kind_round_trips_through_str() {
        for kind in [DefinitionKind::Function, DefinitionKind::Class] {
            assert_eq!(DefinitionKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(DefinitionKind::parse("module"), None);
    }
}
