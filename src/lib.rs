//! **Structural diff for Protocol-Buffers-style schemas.**
//!
//! `protodiff` compares two versions of a `.proto` schema (messages, enums,
//! fields, enum values, services) and renders the differences as a
//! hierarchical change report. It is built for schema-evolution tooling:
//! CI gates that decide whether a change is wire-compatible or
//! source-compatible before it ships.
//!
//! ## Core concepts
//!
//! - **[`loader`]**: reads an entry `.proto` file and its import closure
//!   into a fully materialized [`Schema`]. Loading either succeeds
//!   completely or fails with every collected diagnostic; the comparison
//!   core never runs on a partial schema.
//! - **[`diff`]**: the comparison engine. [`DiffEngine`] walks two schemas
//!   in lockstep and records differences in a [`ReportTree`]. Type
//!   comparisons are memoized by fully-qualified name pair, which shares
//!   sub-reports between reference sites and terminates recursion on
//!   cyclic type graphs. Fields and enum values match either by name
//!   (source compatibility) or by wire number (wire compatibility).
//! - **[`reports`]**: plain-text and JSON renderers over a trimmed tree.
//!
//! ## Diffing two schema files
//!
//! ```no_run
//! use std::path::Path;
//! use protodiff::{load_schema, DiffEngine, DiffOptions};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let root = Path::new("schemas");
//!     let old = load_schema(Path::new("schemas/v1/api.proto"), root)?;
//!     let new = load_schema(Path::new("schemas/v2/api.proto"), root)?;
//!
//!     let engine = DiffEngine::with_options(DiffOptions { match_by_number: true });
//!     let mut report = engine.compare_files(&old, &new);
//!     report.trim(report.root());
//!
//!     if report.has_changes() {
//!         print!("{}", protodiff::reports::render_text(&report));
//!     }
//!     Ok(())
//! }
//! ```

// Lint to discourage unwrap() in production code - prefer explicit error handling
#![warn(clippy::unwrap_used)]

pub mod cli;
pub mod config;
pub mod diff;
pub mod error;
pub mod loader;
pub mod model;
pub mod reports;

// Re-export main types for convenience
pub use config::{CompareTypeConfig, DiffConfig, OutputConfig, ReportFormat};
pub use diff::{ChangeItem, ChangeKind, DiffEngine, DiffOptions, ReportTree, SectionId, SectionKind};
pub use error::{LoadDiagnostic, ProtoDiffError, Result};
pub use loader::load_schema;
pub use model::{
    EnumDescriptor, FieldDescriptor, MessageDescriptor, Schema, ServiceDescriptor,
};
