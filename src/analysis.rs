//! One analysis pass over an uploaded file
//!
//! Parsing gates everything: if the source does not parse, nothing else runs
//! and the caller gets the syntax error. Metrics are computed independently
//! afterwards, and a metrics failure is kept alongside the result instead of
//! aborting the pass.

use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::extract::{extract, Extraction};
use crate::metrics::{MetricsService, MetricsSnapshot};
use crate::lang::Lang;
use crate::parse::parse_as;
use crate::records;
use crate::schema::{DefinitionId, DefinitionNode, FunctionRecord};

/// Everything derived from one uploaded source file
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub file_name: String,
    pub source: String,
    /// Definitions ordered by start line
    pub extraction: Extraction,
    /// One record per function, ordered by start line
    pub records: Vec<FunctionRecord>,
    /// Metrics, or the message of the failure that prevented them
    pub metrics: std::result::Result<MetricsSnapshot, String>,
}

impl Analysis {
    pub fn record(&self, id: &DefinitionId) -> Option<&FunctionRecord> {
        self.records.iter().find(|r| r.id == *id)
    }

    pub fn definition(&self, id: &DefinitionId) -> Option<&DefinitionNode> {
        self.extraction
            .functions
            .iter()
            .chain(self.extraction.classes.iter())
            .find(|d| d.id() == *id)
    }

    /// Functions whose plain or dotted name equals `name`
    pub fn records_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FunctionRecord> {
        self.records
            .iter()
            .filter(move |r| r.metadata.name == name || r.qualified_name == name)
    }

    pub fn function_count(&self) -> usize {
        self.extraction.functions.len()
    }

    pub fn class_count(&self) -> usize {
        self.extraction.classes.len()
    }
}

/// Run a full pass: parse, extract, build records, compute metrics
///
/// The grammar is chosen from `file_name`'s extension.
pub fn analyze(file_name: &str, source: &str, metrics: &dyn MetricsService) -> Result<Analysis> {
    let lang = Lang::from_path(Path::new(file_name))?;
    let tree = parse_as(source, lang)?;
    let extraction = extract(&tree).sorted_by_line();
    let records = records::build(source, &extraction)?;

    let metrics = metrics.snapshot(source).map_err(|e| {
        tracing::warn!(file = %file_name, error = %e, "metrics unavailable");
        e.to_string()
    });

    tracing::info!(
        file = %file_name,
        functions = extraction.functions.len(),
        classes = extraction.classes.len(),
        "analysis complete"
    );

    Ok(Analysis {
        file_name: file_name.to_string(),
        source: source.to_string(),
        extraction,
        records,
        metrics,
    })
}
