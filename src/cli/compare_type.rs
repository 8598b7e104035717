//! Compare-type command handler.
//!
//! Compares two explicitly named top-level types instead of the whole file
//! inventories. A name pair that does not resolve to messages in both
//! schemas or enums in both schemas is a reported finding, not an error.

use anyhow::Result;

use crate::cli::{change_exit_code, load_with_diagnostics, write_report};
use crate::config::CompareTypeConfig;
use crate::diff::DiffEngine;

/// Run the compare-type command, returning the desired exit code.
pub fn run_compare_type(config: CompareTypeConfig) -> Result<i32> {
    let old = load_with_diagnostics(&config.old, config.root.as_deref())?;
    let new = load_with_diagnostics(&config.new, config.root.as_deref())?;

    let new_type = config.new_type.as_deref().unwrap_or(&config.old_type);
    let engine = DiffEngine::with_options(config.options);
    let mut tree = engine.compare_named(&old, &config.old_type, &new, new_type);
    tree.trim(tree.root());

    write_report(&tree, &config.output)?;
    Ok(change_exit_code(config.fail_on_change, &tree))
}
