//! Function and class extraction
//!
//! Walks a parsed Python tree depth-first, entering every nested scope, and
//! collects each `def` (sync or async) and `class` it meets. Tree-sitter keeps
//! children in source order, so pre-order traversal already yields definitions
//! by ascending start position. [`Extraction::sorted_by_line`] is still provided
//! for callers that must guarantee display order.

use serde::Serialize;
use tree_sitter::Node;

use crate::error::Result;
use crate::parse::{code_end, parse, SyntaxTree};
use crate::schema::{DefinitionKind, DefinitionNode, Parameter, ParameterKind};

/// All definitions found in one source file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Extraction {
    pub functions: Vec<DefinitionNode>,
    pub classes: Vec<DefinitionNode>,
}

impl Extraction {
    /// Total number of definitions
    pub fn len(&self) -> usize {
        self.functions.len() + self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty() && self.classes.is_empty()
    }

    /// Copy of this extraction with both sequences ordered by start line
    pub fn sorted_by_line(&self) -> Self {
        let mut sorted = self.clone();
        sorted.functions.sort_by_key(|d| (d.start_line, d.start_byte));
        sorted.classes.sort_by_key(|d| (d.start_line, d.start_byte));
        sorted
    }

    /// Functions with the given plain name
    pub fn functions_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a DefinitionNode> {
        self.functions.iter().filter(move |f| f.name == name)
    }
}

/// Parse `source` and extract its definitions
pub fn extract_source(source: &str) -> Result<Extraction> {
    let tree = parse(source)?;
    Ok(extract(&tree))
}

/// Extract every function and class definition from a parsed tree
pub fn extract(tree: &SyntaxTree) -> Extraction {
    let mut extraction = Extraction::default();
    let mut scope: Vec<String> = Vec::new();
    collect_definitions(&tree.root(), tree.source(), &mut scope, &mut extraction);

    tracing::debug!(
        functions = extraction.functions.len(),
        classes = extraction.classes.len(),
        "extracted definitions"
    );

    extraction
}

fn collect_definitions(
    node: &Node,
    source: &str,
    scope: &mut Vec<String>,
    out: &mut Extraction,
) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "function_definition" => {
                let def = build_definition(&child, source, DefinitionKind::Function, scope);
                let name = def.name.clone();
                out.functions.push(def);
                descend(&child, source, scope, name, out);
            }
            "class_definition" => {
                let def = build_definition(&child, source, DefinitionKind::Class, scope);
                let name = def.name.clone();
                out.classes.push(def);
                descend(&child, source, scope, name, out);
            }
            _ => collect_definitions(&child, source, scope, out),
        }
    }
}

fn descend(node: &Node, source: &str, scope: &mut Vec<String>, name: String, out: &mut Extraction) {
    scope.push(name);
    collect_definitions(node, source, scope, out);
    scope.pop();
}

fn build_definition(
    node: &Node,
    source: &str,
    kind: DefinitionKind,
    scope: &[String],
) -> DefinitionNode {
    let name = node
        .child_by_field_name("name")
        .map(|n| node_text(&n, source).to_string())
        .unwrap_or_default();

    let qualified_name = if scope.is_empty() {
        name.clone()
    } else {
        format!("{}.{}", scope.join("."), name)
    };

    let (parameters, return_annotation, bases) = match kind {
        DefinitionKind::Function => (
            node.child_by_field_name("parameters")
                .map(|p| extract_parameters(&p, source))
                .unwrap_or_default(),
            node.child_by_field_name("return_type")
                .map(|n| node_text(&n, source).to_string()),
            Vec::new(),
        ),
        DefinitionKind::Class => (
            Vec::new(),
            None,
            node.child_by_field_name("superclasses")
                .map(|s| extract_bases(&s, source))
                .unwrap_or_default(),
        ),
    };

    // blocks absorb trailing comments; the span stops at the last code token
    let end = code_end(*node);

    DefinitionNode {
        kind,
        name,
        qualified_name,
        start_line: node.start_position().row + 1,
        end_line: end.end_position().row + 1,
        start_byte: node.start_byte(),
        end_byte: end.end_byte(),
        depth: scope.len(),
        is_async: node.child(0).is_some_and(|c| c.kind() == "async"),
        decorators: extract_decorators(node, source),
        parameters,
        return_annotation,
        bases,
    }
}

/// Decorators live on the wrapping `decorated_definition`, not the def itself
fn extract_decorators(node: &Node, source: &str) -> Vec<String> {
    let Some(parent) = node.parent() else {
        return Vec::new();
    };
    if parent.kind() != "decorated_definition" {
        return Vec::new();
    }

    let mut cursor = parent.walk();
    parent
        .named_children(&mut cursor)
        .filter(|c| c.kind() == "decorator")
        .map(|c| node_text(&c, source).trim_start_matches('@').trim().to_string())
        .collect()
}

fn extract_bases(node: &Node, source: &str) -> Vec<String> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|c| c.kind() != "comment" && c.kind() != "keyword_argument")
        .map(|c| node_text(&c, source).to_string())
        .collect()
}

/// Extract declared parameters in order
///
/// Every parameter that declares a name is kept, whatever its kind. The bare
/// `*` and `/` markers only change the kind of their neighbours.
pub(crate) fn extract_parameters(node: &Node, source: &str) -> Vec<Parameter> {
    let mut params: Vec<Parameter> = Vec::new();
    let mut keyword_only = false;

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "positional_separator" => {
                for p in params.iter_mut() {
                    if p.kind == ParameterKind::PositionalOrKeyword {
                        p.kind = ParameterKind::PositionalOnly;
                    }
                }
            }
            "keyword_separator" => keyword_only = true,
            "comment" => {}
            _ => {
                if let Some(param) = build_parameter(&child, source, keyword_only) {
                    if param.kind == ParameterKind::VarPositional {
                        keyword_only = true;
                    }
                    params.push(param);
                }
            }
        }
    }

    params
}

fn build_parameter(node: &Node, source: &str, keyword_only: bool) -> Option<Parameter> {
    let plain_kind = if keyword_only {
        ParameterKind::KeywordOnly
    } else {
        ParameterKind::PositionalOrKeyword
    };

    let param = match node.kind() {
        "identifier" | "tuple_pattern" => Parameter {
            name: node_text(node, source).to_string(),
            kind: plain_kind,
            has_default: false,
            annotation: None,
        },
        "list_splat_pattern" => Parameter {
            name: splat_name(node, source),
            kind: ParameterKind::VarPositional,
            has_default: false,
            annotation: None,
        },
        "dictionary_splat_pattern" => Parameter {
            name: splat_name(node, source),
            kind: ParameterKind::VarKeyword,
            has_default: false,
            annotation: None,
        },
        "typed_parameter" => {
            // typed_parameter has no name field; its first named child is the target
            let target = node.named_child(0)?;
            let mut inner = build_parameter(&target, source, keyword_only)?;
            inner.annotation = node
                .child_by_field_name("type")
                .map(|t| node_text(&t, source).to_string());
            inner
        }
        "default_parameter" | "typed_default_parameter" => Parameter {
            name: node
                .child_by_field_name("name")
                .map(|n| node_text(&n, source).to_string())?,
            kind: plain_kind,
            has_default: true,
            annotation: node
                .child_by_field_name("type")
                .map(|t| node_text(&t, source).to_string()),
        },
        _ => return None,
    };

    Some(param)
}

fn splat_name(node: &Node, source: &str) -> String {
    let mut cursor = node.walk();
    let named = node.named_children(&mut cursor).next();
    match named {
        Some(inner) => node_text(&inner, source).to_string(),
        None => node_text(node, source).trim_start_matches('*').to_string(),
    }
}

fn node_text<'s>(node: &Node, source: &'s str) -> &'s str {
    &source[node.start_byte()..node.end_byte()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params_of(src: &str) -> Vec<Parameter> {
        let extraction = extract_source(src).unwrap();
        extraction.functions[0].parameters.clone()
    }

    #[test]
    fn test_add_scenario() {
        let extraction = extract_source("def add(a, b):\n    return a + b\n").unwrap();
        assert_eq!(extraction.functions.len(), 1);
        assert!(extraction.classes.is_empty());

        let add = &extraction.functions[0];
        assert_eq!(add.name, "add");
        assert_eq!(add.start_line, 1);
        assert_eq!(add.end_line, 2);
        assert_eq!(add.depth, 0);
        assert!(!add.is_async);
    }

    #[test]
    fn test_nested_definitions_are_found() {
        let src = "\
class Outer:
    def method(self):
        def helper(x):
            return x
        return helper(1)

    class Inner:
        async def run(self):
            pass
";
        let extraction = extract_source(src).unwrap();
        let names: Vec<&str> = extraction
            .functions
            .iter()
            .map(|f| f.qualified_name.as_str())
            .collect();
        assert_eq!(
            names,
            vec!["Outer.method", "Outer.method.helper", "Outer.Inner.run"]
        );
        let classes: Vec<&str> = extraction.classes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(classes, vec!["Outer", "Inner"]);
        assert_eq!(extraction.functions[1].depth, 2);
        assert!(extraction.functions[2].is_async);
    }

    #[test]
    fn test_span_excludes_trailing_comments() {
        let span = |src: &str| {
            let f = &extract_source(src).unwrap().functions[0];
            (f.start_line, f.end_line)
        };
        assert_eq!(span("def f():\n    pass\n    # trailing comment\nx = 1\n"), (1, 2));
        assert_eq!(span("def f():\n    pass\n\n    # trailing comment\nx = 1\n"), (1, 2));

        let src = "class C:\n    def m(self):\n        return 1\n        # done\n    # end\n";
        let extraction = extract_source(src).unwrap();
        assert_eq!(extraction.classes[0].end_line, 3);
        assert_eq!(extraction.functions[0].end_line, 3);
    }

    #[test]
    fn test_decorated_definition_span_starts_at_def() {
        let src = "@cache\n@route('/x')\ndef view(request):\n    return 1\n";
        let extraction = extract_source(src).unwrap();
        let view = &extraction.functions[0];
        assert_eq!(view.start_line, 3);
        assert_eq!(view.end_line, 4);
        assert_eq!(view.decorators, vec!["cache", "route('/x')"]);
    }

    #[test]
    fn test_parameter_kinds() {
        let params = params_of(
            "def f(a, b: int, /, c=1, *args, d, e: str = 'x', **kw) -> None:\n    pass\n",
        );
        let summary: Vec<(&str, ParameterKind, bool)> = params
            .iter()
            .map(|p| (p.name.as_str(), p.kind, p.has_default))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("a", ParameterKind::PositionalOnly, false),
                ("b", ParameterKind::PositionalOnly, false),
                ("c", ParameterKind::PositionalOrKeyword, true),
                ("args", ParameterKind::VarPositional, false),
                ("d", ParameterKind::KeywordOnly, false),
                ("e", ParameterKind::KeywordOnly, true),
                ("kw", ParameterKind::VarKeyword, false),
            ]
        );
        assert_eq!(params[1].annotation.as_deref(), Some("int"));
        assert_eq!(params[5].annotation.as_deref(), Some("str"));
    }

    #[test]
    fn test_bare_star_marks_keyword_only() {
        let params = params_of("def f(a, *, key):\n    pass\n");
        assert_eq!(params.len(), 2);
        assert_eq!(params[1].kind, ParameterKind::KeywordOnly);
    }

    #[test]
    fn test_typed_splat_parameters() {
        let params = params_of("def f(*args: int, **kwargs: str):\n    pass\n");
        assert_eq!(params[0].name, "args");
        assert_eq!(params[0].kind, ParameterKind::VarPositional);
        assert_eq!(params[0].annotation.as_deref(), Some("int"));
        assert_eq!(params[1].name, "kwargs");
        assert_eq!(params[1].kind, ParameterKind::VarKeyword);
    }

    #[test]
    fn test_class_bases_and_return_annotation() {
        let src = "class Model(Base, Mixin):\n    def save(self) -> bool:\n        return True\n";
        let extraction = extract_source(src).unwrap();
        assert_eq!(extraction.classes[0].bases, vec!["Base", "Mixin"]);
        assert_eq!(
            extraction.functions[0].return_annotation.as_deref(),
            Some("bool")
        );
    }

    #[test]
    fn test_sorted_by_line_matches_traversal() {
        let src = "def a():\n    def b():\n        pass\n\ndef c():\n    pass\n";
        let extraction = extract_source(src).unwrap();
        assert_eq!(extraction, extraction.sorted_by_line());
    }

    #[test]
    fn test_lambda_is_not_a_definition() {
        let extraction = extract_source("square = lambda x: x * x\n").unwrap();
        assert!(extraction.is_empty());
    }
}
