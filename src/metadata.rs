//! Function metadata derivation

use crate::schema::{DefinitionNode, FunctionMetadata, ParameterKind};

/// Describe a function definition
///
/// Parameter names include every declared name in order, variadic and
/// keyword-only ones included. For a class node the parameter list is empty.
pub fn describe(node: &DefinitionNode) -> FunctionMetadata {
    let parameter_names: Vec<String> = node.parameters.iter().map(|p| p.name.clone()).collect();

    FunctionMetadata {
        name: node.name.clone(),
        start_line: node.start_line,
        end_line: node.end_line,
        parameter_count: parameter_names.len(),
        parameter_names,
    }
}

/// Names of the plain positional-or-keyword parameters only
///
/// This is the narrower view that leaves out positional-only, variadic and
/// keyword-only parameters.
pub fn positional_names(node: &DefinitionNode) -> Vec<&str> {
    node.parameters
        .iter()
        .filter(|p| p.kind == ParameterKind::PositionalOrKeyword)
        .map(|p| p.name.as_str())
        .collect()
}

impl FunctionMetadata {
    /// Key/value pairs in display order
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Function Name", self.name.clone()),
            ("Start Line", self.start_line.to_string()),
            ("End Line", self.end_line.to_string()),
            ("Number of Parameters", self.parameter_count.to_string()),
            ("Parameters", format!("[{}]", self.parameter_names.join(", "))),
        ]
    }
}
