//! Display records: one per function, metadata plus verbatim source

use crate::error::Result;
use crate::extract::Extraction;
use crate::metadata::describe;
use crate::schema::FunctionRecord;
use crate::slice::slice_definition;

/// Build a record for every function in `extraction`, in its order
///
/// `source` must be the text the extraction was taken from; a mismatch
/// surfaces as a range error.
pub fn build(source: &str, extraction: &Extraction) -> Result<Vec<FunctionRecord>> {
    extraction
        .functions
        .iter()
        .map(|node| {
            let text = slice_definition(source, node).inspect_err(|e| {
                tracing::error!(function = %node.qualified_name, error = %e, "definition does not fit source");
            })?;
            Ok(FunctionRecord {
                id: node.id(),
                qualified_name: node.qualified_name.clone(),
                metadata: describe(node),
                parameters: node.parameters.clone(),
                source: text.to_string(),
            })
        })
        .collect()
}
