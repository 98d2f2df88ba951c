//! Error types for codesight

use std::process::ExitCode;

use thiserror::Error;

/// Errors produced while analysing a source file or talking to a service
#[derive(Error, Debug)]
pub enum CodeSightError {
    #[error("file not found: {path}")]
    FileNotFound { path: String },

    #[error("unsupported file type: .{extension} (only Python sources can be analysed)")]
    UnsupportedLanguage { extension: String },

    /// The uploaded source does not parse. Aborts the whole analysis pass.
    #[error("syntax error at line {line}, column {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("no function named '{name}' in {file}")]
    DefinitionNotFound { name: String, file: String },

    /// A line span does not fit the source it was applied to.
    ///
    /// This means a definition node was paired with the wrong source text and is
    /// treated as a defect rather than a user error.
    #[error("line range {start}..={end} is outside the source ({total} lines)")]
    Range {
        start: usize,
        end: usize,
        total: usize,
    },

    /// An external collaborator (inference or metrics) failed.
    #[error("{service} service failed: {message}")]
    Service { service: String, message: String },

    #[error("configuration error: {message}")]
    Config { message: String },

    /// The grammar could not be loaded into the parser.
    #[error("parser setup failed: {message}")]
    ParseFailure { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CodeSightError {
    /// Build a service error for the named collaborator
    pub fn service(service: &str, message: impl Into<String>) -> Self {
        Self::Service {
            service: service.to_string(),
            message: message.into(),
        }
    }

    /// Build a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// True when the error is the user's input failing to parse
    pub fn is_syntax(&self) -> bool {
        matches!(self, Self::Syntax { .. })
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::FileNotFound { .. } => ExitCode::from(2),
            Self::UnsupportedLanguage { .. } => ExitCode::from(3),
            Self::Syntax { .. } => ExitCode::from(4),
            Self::Service { .. } => ExitCode::from(5),
            Self::Config { .. } => ExitCode::from(6),
            Self::DefinitionNotFound { .. } => ExitCode::from(7),
            Self::Range { .. } | Self::ParseFailure { .. } => ExitCode::from(70),
            Self::Io(_) | Self::Json(_) => ExitCode::from(1),
        }
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, CodeSightError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_message_carries_position() {
        let err = CodeSightError::Syntax {
            line: 3,
            column: 7,
            message: "unexpected token".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "syntax error at line 3, column 7: unexpected token"
        );
        assert!(err.is_syntax());
    }

    #[test]
    fn test_service_helper() {
        let err = CodeSightError::service("inference", "timed out");
        assert_eq!(err.to_string(), "inference service failed: timed out");
        assert!(!err.is_syntax());
    }

    #[test]
    fn test_definition_not_found_message() {
        let err = CodeSightError::DefinitionNotFound {
            name: "missing".to_string(),
            file: "a.py".to_string(),
        };
        assert_eq!(err.to_string(), "no function named 'missing' in a.py");
    }
}
