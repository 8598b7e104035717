//! Unified error types for protodiff.
//!
//! Loading a schema either succeeds completely or fails with the full list
//! of collected diagnostics; the comparison core never runs on a partially
//! loaded schema.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for protodiff operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ProtoDiffError {
    /// Schema loading failed. Carries every diagnostic collected while
    /// parsing the entry file and its imports.
    #[error("failed to load schema '{entry}' ({} diagnostic(s))", diagnostics.len())]
    Load {
        entry: String,
        diagnostics: Vec<LoadDiagnostic>,
    },

    /// IO errors with path context
    #[error("IO error at {path:?}: {message}")]
    Io {
        path: Option<PathBuf>,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Report rendering failures
    #[error("report rendering failed: {0}")]
    Render(String),

    /// Configuration errors
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// A single parse or resolution problem, positioned in its source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadDiagnostic {
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub message: String,
}

impl LoadDiagnostic {
    pub fn new(
        file: impl Into<String>,
        line: u32,
        column: u32,
        message: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            line,
            column,
            message: message.into(),
        }
    }
}

impl fmt::Display for LoadDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{},{}: {}",
            self.file, self.line, self.column, self.message
        )
    }
}

/// Convenient Result type for protodiff operations
pub type Result<T> = std::result::Result<T, ProtoDiffError>;

impl ProtoDiffError {
    /// Create a load error from collected diagnostics
    pub fn load(entry: impl Into<String>, diagnostics: Vec<LoadDiagnostic>) -> Self {
        Self::Load {
            entry: entry.into(),
            diagnostics,
        }
    }

    /// Create an IO error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        let message = format!("{source}");
        Self::Io {
            path: Some(path),
            message,
            source,
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// The diagnostics attached to a load failure, if any.
    pub fn diagnostics(&self) -> &[LoadDiagnostic] {
        match self {
            Self::Load { diagnostics, .. } => diagnostics,
            _ => &[],
        }
    }
}

impl From<std::io::Error> for ProtoDiffError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            path: None,
            message: format!("{err}"),
            source: err,
        }
    }
}

impl From<serde_json::Error> for ProtoDiffError {
    fn from(err: serde_json::Error) -> Self {
        Self::Render(err.to_string())
    }
}
