//! CLI command handlers.
//!
//! Testable handlers invoked by main.rs. Each returns the desired process
//! exit code; the caller is responsible for `std::process::exit` when it is
//! non-zero.

mod compare_type;
mod diff;

pub use compare_type::run_compare_type;
pub use diff::run_diff;

// Re-export config types used by handlers
pub use crate::config::{CompareTypeConfig, DiffConfig};

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use tracing::error;

use crate::config::{OutputConfig, ReportFormat};
use crate::diff::ReportTree;
use crate::loader::load_schema;
use crate::model::Schema;
use crate::reports;

/// Process exit codes shared by all commands.
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const CHANGES_DETECTED: i32 = 1;
    pub const ERROR: i32 = 3;
}

/// Load one schema, logging every collected diagnostic before failing.
pub(crate) fn load_with_diagnostics(path: &Path, root: Option<&Path>) -> anyhow::Result<Schema> {
    let root = root.map_or_else(|| parent_dir(path), Path::to_path_buf);
    match load_schema(path, &root) {
        Ok(schema) => Ok(schema),
        Err(err) => {
            for diagnostic in err.diagnostics() {
                error!("{diagnostic}");
            }
            Err(err.into())
        }
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if parent.as_os_str().is_empty() => PathBuf::from("."),
        Some(parent) => parent.to_path_buf(),
        None => PathBuf::from("."),
    }
}

/// Render the trimmed tree and route it to stdout or the configured file.
pub(crate) fn write_report(tree: &ReportTree, output: &OutputConfig) -> anyhow::Result<()> {
    let rendered = match output.format {
        ReportFormat::Text => reports::render_text(tree),
        ReportFormat::Json => reports::render_json(tree)?,
    };
    match &output.file {
        Some(path) => std::fs::write(path, rendered)
            .with_context(|| format!("failed to write report to {}", path.display()))?,
        None => print!("{rendered}"),
    }
    Ok(())
}

pub(crate) fn change_exit_code(fail_on_change: bool, tree: &ReportTree) -> i32 {
    if fail_on_change && tree.has_changes() {
        exit_codes::CHANGES_DETECTED
    } else {
        exit_codes::SUCCESS
    }
}
