//! Language detection and tree-sitter grammar loading

use std::path::Path;
use tree_sitter::Language;

use crate::error::{CodeSightError, Result};

/// Source languages the analyser understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lang {
    /// Python modules (`.py`)
    Python,
    /// Python type stubs (`.pyi`)
    PythonStub,
}

impl Lang {
    /// Language of a file, judged by its extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| CodeSightError::UnsupportedLanguage {
                extension: "none".to_string(),
            })?;

        Self::from_extension(ext)
    }

    /// Case-insensitive extension lookup (`py`, `pyi`)
    pub fn from_extension(ext: &str) -> Result<Self> {
        match ext.to_lowercase().as_str() {
            "py" => Ok(Self::Python),
            "pyi" => Ok(Self::PythonStub),
            _ => Err(CodeSightError::UnsupportedLanguage {
                extension: ext.to_string(),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::PythonStub => "python-stub",
        }
    }

    /// Stubs share the Python grammar
    pub fn tree_sitter_language(&self) -> Language {
        match self {
            Self::Python | Self::PythonStub => tree_sitter_python::LANGUAGE.into(),
        }
    }
}
