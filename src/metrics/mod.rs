//! Code metrics service
//!
//! Computes the numbers shown beside the function inventory: raw line counts,
//! cyclomatic complexity per block and the maintainability index with its
//! grade. The dashboard consumes them through [`MetricsService`] so the
//! implementation can be swapped (or faked in tests).
//!
//! # Modules
//!
//! - `raw`: line buckets and logical lines
//! - `complexity`: radon-style cyclomatic complexity
//! - `halstead`: operator/operand volume
//! - `maintainability`: the SEI maintainability index and its letter grade

pub mod complexity;
pub mod halstead;
pub mod maintainability;
pub mod raw;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::parse::{parse, SyntaxTree};

pub use complexity::{BlockKind, ComplexityEntry, HIGH_COMPLEXITY_THRESHOLD};
pub use halstead::Halstead;
pub use maintainability::{Maintainability, MaintainabilityGrade, REFACTOR_THRESHOLD};
pub use raw::RawMetrics;

/// Everything the metrics panels display for one file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub raw: RawMetrics,
    pub complexity: Vec<ComplexityEntry>,
    pub maintainability: Maintainability,
}

impl MetricsSnapshot {
    /// Blocks whose complexity exceeds [`HIGH_COMPLEXITY_THRESHOLD`]
    pub fn high_complexity(&self) -> impl Iterator<Item = &ComplexityEntry> {
        self.complexity.iter().filter(|e| e.is_high())
    }
}

/// Source of metrics for the dashboard
pub trait MetricsService: Send + Sync {
    fn raw(&self, source: &str) -> Result<RawMetrics>;

    fn complexity(&self, source: &str) -> Result<Vec<ComplexityEntry>>;

    fn maintainability(&self, source: &str) -> Result<Maintainability>;

    /// All three at once
    fn snapshot(&self, source: &str) -> Result<MetricsSnapshot> {
        Ok(MetricsSnapshot {
            raw: self.raw(source)?,
            complexity: self.complexity(source)?,
            maintainability: self.maintainability(source)?,
        })
    }
}

/// Metrics computed directly from the tree-sitter tree
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeSitterMetrics;

impl TreeSitterMetrics {
    pub fn new() -> Self {
        Self
    }

    /// Compute every metric from an already parsed tree
    pub fn snapshot_tree(&self, tree: &SyntaxTree) -> MetricsSnapshot {
        let raw = raw::compute(tree);
        let complexity = complexity::compute(tree);
        let maintainability = maintainability_of(tree, &raw);

        tracing::debug!(
            loc = raw.loc,
            sloc = raw.sloc,
            blocks = complexity.len(),
            mi = maintainability.score,
            "computed metrics"
        );

        MetricsSnapshot {
            raw,
            complexity,
            maintainability,
        }
    }
}

fn maintainability_of(tree: &SyntaxTree, raw: &RawMetrics) -> Maintainability {
    let volume = halstead::compute(tree).volume();
    let total = complexity::total_complexity(tree);
    maintainability::compute(volume, total, raw)
}

impl MetricsService for TreeSitterMetrics {
    fn raw(&self, source: &str) -> Result<RawMetrics> {
        Ok(raw::compute(&parse(source)?))
    }

    fn complexity(&self, source: &str) -> Result<Vec<ComplexityEntry>> {
        Ok(complexity::compute(&parse(source)?))
    }

    fn maintainability(&self, source: &str) -> Result<Maintainability> {
        let tree = parse(source)?;
        let raw = raw::compute(&tree);
        Ok(maintainability_of(&tree, &raw))
    }

    fn snapshot(&self, source: &str) -> Result<MetricsSnapshot> {
        Ok(self.snapshot_tree(&parse(source)?))
    }
}
