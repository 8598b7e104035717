//! Comparison orchestrator.
//!
//! [`DiffEngine`] owns the run options; each call builds a fresh
//! [`Comparison`] holding the report tree, the memo index, and the frozen
//! role map, then walks both schemas depth-first. Single-threaded and free
//! of I/O: schemas are fully materialized before a run starts.

use indexmap::IndexMap;
use tracing::debug;

use crate::diff::report::{ChangeKind, ReportTree, SectionId};
use crate::diff::roles::RoleMap;
use crate::model::Schema;

/// Run-wide comparison options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffOptions {
    /// Match fields and enum values by wire number (wire compatibility)
    /// instead of by name (source compatibility).
    pub match_by_number: bool,
}

/// Structural schema diff engine.
#[derive(Debug, Clone, Default)]
pub struct DiffEngine {
    options: DiffOptions,
}

impl DiffEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: DiffOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> DiffOptions {
        self.options
    }

    /// Compare two whole schema files: services, then top-level messages,
    /// then top-level enums. The returned tree is untrimmed; callers prune
    /// it once with [`ReportTree::trim`] before rendering.
    pub fn compare_files(&self, old: &Schema, new: &Schema) -> ReportTree {
        debug!(old = %old.entry_file, new = %new.entry_file, "comparing schema files");
        let mut cmp = Comparison::new(self.options, old, new);
        cmp.compare_files();
        cmp.tree
    }

    /// Compare two explicitly named top-level types. The names must resolve
    /// to messages in both schemas or enums in both schemas; otherwise a
    /// `NameMissing` item is reported instead of failing the run.
    pub fn compare_named(
        &self,
        old: &Schema,
        old_name: &str,
        new: &Schema,
        new_name: &str,
    ) -> ReportTree {
        debug!(old_name, new_name, "comparing named types");
        let mut cmp = Comparison::new(self.options, old, new);
        cmp.compare_named(old_name, new_name);
        cmp.tree
    }
}

/// Mutable state of one comparison run. Exclusively owned; no locking.
pub(crate) struct Comparison<'a> {
    pub(crate) options: DiffOptions,
    pub(crate) old: &'a Schema,
    pub(crate) new: &'a Schema,
    /// Frozen before any message or enum comparison begins.
    pub(crate) roles: RoleMap,
    pub(crate) tree: ReportTree,
    /// Ordered full-name pair -> the single section ever created for it.
    /// Entries are inserted before descending and never removed, which is
    /// what terminates recursion on self-referential type graphs.
    pub(crate) memo: IndexMap<(String, String), SectionId>,
}

impl<'a> Comparison<'a> {
    pub(crate) fn new(options: DiffOptions, old: &'a Schema, new: &'a Schema) -> Self {
        Self {
            options,
            old,
            new,
            roles: RoleMap::classify(old, new),
            tree: ReportTree::new(),
            memo: IndexMap::new(),
        }
    }

    fn compare_files(&mut self) {
        let (old, new) = (self.old, self.new);
        let root = self.tree.root();

        // Service inventory: presence only, no recursive body diff.
        for service in old.services() {
            if new.find_service(&service.name).is_none() {
                self.tree
                    .add_item(root, ChangeKind::ServiceRemoved, &service.full_name, "");
            }
        }
        for service in new.services() {
            if old.find_service(&service.name).is_none() {
                self.tree
                    .add_item(root, ChangeKind::ServiceAdded, "", &service.full_name);
            }
        }

        // Message inventory, matched by simple name.
        for msg_a in old.top_level_messages() {
            match new.find_top_message(&msg_a.name) {
                Some(msg_b) => {
                    self.compare_messages(msg_a, msg_b);
                }
                None => {
                    self.tree
                        .add_item(root, ChangeKind::MessageRemoved, &msg_a.full_name, "");
                }
            }
        }
        for msg_b in new.top_level_messages() {
            if old.find_top_message(&msg_b.name).is_none() {
                self.tree
                    .add_item(root, ChangeKind::MessageAdded, "", &msg_b.full_name);
            }
        }

        // Enum inventory, same pattern.
        for enum_a in old.top_level_enums() {
            match new.find_top_enum(&enum_a.name) {
                Some(enum_b) => {
                    self.compare_enums(enum_a, enum_b);
                }
                None => {
                    self.tree
                        .add_item(root, ChangeKind::EnumRemoved, &enum_a.full_name, "");
                }
            }
        }
        for enum_b in new.top_level_enums() {
            if old.find_top_enum(&enum_b.name).is_none() {
                self.tree
                    .add_item(root, ChangeKind::EnumAdded, "", &enum_b.full_name);
            }
        }
    }

    fn compare_named(&mut self, old_name: &str, new_name: &str) {
        let (old, new) = (self.old, self.new);
        let messages = (old.resolve_message(old_name), new.resolve_message(new_name));
        if let (Some(msg_a), Some(msg_b)) = messages {
            self.compare_messages(msg_a, msg_b);
            return;
        }
        let enums = (old.resolve_enum(old_name), new.resolve_enum(new_name));
        if let (Some(enum_a), Some(enum_b)) = enums {
            self.compare_enums(enum_a, enum_b);
            return;
        }
        // Not the same kind of type in both schemas: a finding, not an error.
        let root = self.tree.root();
        self.tree
            .add_item(root, ChangeKind::NameMissing, old_name, new_name);
    }

    /// Identity label for an unmatched entity: the wire number under number
    /// matching, else the name.
    pub(crate) fn entity_id(&self, name: &str, number: impl ToString) -> String {
        if self.options.match_by_number {
            number.to_string()
        } else {
            name.to_string()
        }
    }
}
