//! Structural schema comparison.
//!
//! The engine walks two [`Schema`](crate::model::Schema) graphs in lockstep
//! and records every difference in a [`ReportTree`]. Type comparisons are
//! memoized by the ordered pair of fully-qualified names, which shares
//! sub-reports between reference sites and terminates recursion on cyclic
//! type graphs.
//!
//! Two matching strategies are supported: by name (source compatibility)
//! and by wire number (wire compatibility), selected via [`DiffOptions`].

mod defaults;
mod engine;
mod enums;
mod fields;
mod messages;
mod report;
mod roles;

pub use engine::{DiffEngine, DiffOptions};
pub use report::{ChangeItem, ChangeKind, ReportTree, Section, SectionId, SectionKind};
pub use roles::{MessageRole, RoleMap};
