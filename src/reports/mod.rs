//! Report rendering.
//!
//! Renderers are pure functions over a trimmed [`ReportTree`]
//! (crate::diff::ReportTree); output routing (stdout vs file) is the CLI
//! layer's concern.

mod json;
mod text;

pub use json::{render_json, JsonSection};
pub use text::render_text;
