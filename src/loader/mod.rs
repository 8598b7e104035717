//! Schema loading.
//!
//! Reads an entry `.proto` file and its import closure into a
//! [`Schema`](crate::model::Schema). The pipeline is lexer -> per-file
//! recursive-descent parser -> resolver (import closure, type registration,
//! reference and default resolution). Diagnostics are collected across all
//! phases and files; any diagnostic makes the load fail as a whole.

mod lexer;
mod parser;
mod resolver;

pub use resolver::load_schema;
