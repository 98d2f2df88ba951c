//! codesight: Python code analysis dashboard
//!
//! This library parses Python sources with tree-sitter, lists their function
//! and class definitions with verbatim source and metadata, computes
//! complexity and maintainability metrics, and asks an inference service to
//! explain functions or suggest improvements.
//!
//! The dashboard is modelled as explicit state: user actions are [`Event`]s
//! applied with [`dispatch`], and [`render`] turns the state into a
//! serializable [`View`] consumed by the text report, the TOON encoder and
//! the web server.
//!
//! # Example
//!
//! ```ignore
//! use codesight::{analyze, render, AppState, TreeSitterMetrics, format_text};
//!
//! let source = "def add(a, b):\n    return a + b\n";
//! let analysis = analyze("add.py", source, &TreeSitterMetrics::new())?;
//!
//! assert_eq!(analysis.records[0].metadata.parameter_names, vec!["a", "b"]);
//! println!("{}", format_text(&render(&AppState::with_analysis(analysis))));
//! ```

pub mod analysis;
pub mod cli;
pub mod error;
pub mod explain;
pub mod extract;
pub mod lang;
pub mod metadata;
pub mod metrics;
pub mod parse;
pub mod records;
pub mod report;
pub mod schema;
pub mod server;
pub mod session;
pub mod slice;
pub mod toon;
pub mod validate;

// Re-export commonly used types
pub use analysis::{analyze, Analysis};
pub use cli::{Cli, OutputFormat};
pub use error::{CodeSightError, Result};
pub use explain::{ExplanationService, InferenceClient, InferenceConfig};
pub use extract::{extract, extract_source, Extraction};
pub use lang::Lang;
pub use metadata::describe;
pub use metrics::{
    ComplexityEntry, Maintainability, MaintainabilityGrade, MetricsService, MetricsSnapshot,
    RawMetrics, TreeSitterMetrics,
};
pub use parse::{dump_ast, parse, parse_as, SyntaxTree};
pub use report::format_text;
pub use schema::{
    DefinitionId, DefinitionKind, DefinitionNode, FunctionMetadata, FunctionRecord, Parameter,
    ParameterKind,
};
pub use session::{dispatch, render, AppState, Event, View};
pub use slice::slice;
pub use toon::encode_toon;
