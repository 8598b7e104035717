//! Run configuration consumed by the CLI handlers.

use std::path::PathBuf;

use clap::ValueEnum;

use crate::diff::DiffOptions;

/// Report output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ReportFormat {
    /// Indented plain text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Where and how to emit the report.
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    pub format: ReportFormat,
    /// Stdout when unset.
    pub file: Option<PathBuf>,
}

/// Configuration for the `diff` command.
#[derive(Debug, Clone)]
pub struct DiffConfig {
    pub old: PathBuf,
    pub new: PathBuf,
    /// Import search root. Each schema's entry-file directory when unset.
    pub root: Option<PathBuf>,
    pub options: DiffOptions,
    pub output: OutputConfig,
    /// Exit with code 1 when any structural change is detected.
    pub fail_on_change: bool,
}

/// Configuration for the `compare-type` command.
#[derive(Debug, Clone)]
pub struct CompareTypeConfig {
    pub old: PathBuf,
    pub new: PathBuf,
    pub root: Option<PathBuf>,
    /// Type name in the old schema, simple or fully qualified.
    pub old_type: String,
    /// Type name in the new schema; `old_type` when unset.
    pub new_type: Option<String>,
    pub options: DiffOptions,
    pub output: OutputConfig,
    pub fail_on_change: bool,
}
