//! Diff command handler.
//!
//! Implements the `diff` subcommand for comparing two schema files.

use anyhow::Result;
use tracing::info;

use crate::cli::{change_exit_code, load_with_diagnostics, write_report};
use crate::config::DiffConfig;
use crate::diff::DiffEngine;

/// Run the diff command, returning the desired exit code.
pub fn run_diff(config: DiffConfig) -> Result<i32> {
    let old = load_with_diagnostics(&config.old, config.root.as_deref())?;
    let new = load_with_diagnostics(&config.new, config.root.as_deref())?;

    let engine = DiffEngine::with_options(config.options);
    let mut tree = engine.compare_files(&old, &new);
    tree.trim(tree.root());

    if tree.has_changes() {
        info!("structural changes detected");
    } else {
        info!("no structural changes");
    }

    write_report(&tree, &config.output)?;
    Ok(change_exit_code(config.fail_on_change, &tree))
}
