//! Hierarchical change report.
//!
//! Sections live in an append-only arena and reference their children by
//! [`SectionId`], never by pointer. Memoized comparisons (see
//! [`engine`](crate::diff::engine)) hand out the same id to every reference
//! site, which both shares sub-reports and terminates recursion on cyclic
//! type graphs.

use serde::Serialize;

/// Index of a section in its [`ReportTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SectionId(usize);

/// What a section compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Root,
    MessageComparison,
    FieldComparison,
    EnumComparison,
    EnumValueComparison,
}

/// Kind of one atomic difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    EnumValueNameChanged,
    EnumValueIdChanged,
    EnumValueAdded,
    EnumValueRemoved,
    FieldNameChanged,
    FieldIdChanged,
    FieldLabelChanged,
    FieldTypeChanged,
    /// The field's own declared type is unchanged, but the referenced
    /// enum/message type has a non-empty sub-report. Kept distinct from
    /// [`ChangeKind::FieldTypeChanged`] so renderers cannot conflate the two.
    FieldTypeImpacted,
    FieldDefaultChanged,
    FieldAdded,
    FieldRemoved,
    OptionalFieldAdded,
    OptionalFieldRemoved,
    InputOptionalFieldAdded,
    InputOptionalFieldRemoved,
    OutputOptionalFieldAdded,
    OutputOptionalFieldRemoved,
    MessageAdded,
    MessageRemoved,
    EnumAdded,
    EnumRemoved,
    ServiceAdded,
    ServiceRemoved,
    NameMissing,
}

impl ChangeKind {
    /// Human-readable message template for this kind. The item's two labels
    /// are appended as `before -> after` by [`ChangeItem::message`].
    pub fn describe(self) -> &'static str {
        match self {
            Self::EnumValueNameChanged => "Value name changed",
            Self::EnumValueIdChanged => "Value ID changed",
            Self::EnumValueAdded => "Value added",
            Self::EnumValueRemoved => "Value removed",
            Self::FieldNameChanged => "Name changed",
            Self::FieldIdChanged => "ID changed",
            Self::FieldLabelChanged => "Label changed",
            Self::FieldTypeChanged => "Type changed",
            Self::FieldTypeImpacted => "Referenced type changed",
            Self::FieldDefaultChanged => "Default value changed",
            Self::FieldAdded => "Field added",
            Self::FieldRemoved => "Field removed",
            Self::OptionalFieldAdded => "Optional field added",
            Self::OptionalFieldRemoved => "Optional field removed",
            Self::InputOptionalFieldAdded => "Optional input field added",
            Self::InputOptionalFieldRemoved => "Optional input field removed",
            Self::OutputOptionalFieldAdded => "Optional output field added",
            Self::OutputOptionalFieldRemoved => "Optional output field removed",
            Self::MessageAdded => "Message added",
            Self::MessageRemoved => "Message removed",
            Self::EnumAdded => "Enum added",
            Self::EnumRemoved => "Enum removed",
            Self::ServiceAdded => "Service added",
            Self::ServiceRemoved => "Service removed",
            Self::NameMissing => "Name missing",
        }
    }
}

/// One atomic difference: a kind and a before/after label pair.
///
/// Removed entities carry `(id, "")`, added entities `("", id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeItem {
    pub kind: ChangeKind,
    pub before: String,
    pub after: String,
}

impl ChangeItem {
    pub fn message(&self) -> String {
        format!("{}: {} -> {}", self.kind.describe(), self.before, self.after)
    }
}

/// A report node: a compared pair, free-text notes, change items, and
/// child sections.
#[derive(Debug, Clone)]
pub struct Section {
    pub kind: SectionKind,
    pub label_a: String,
    pub label_b: String,
    pub notes: Vec<String>,
    pub items: Vec<ChangeItem>,
    children: Vec<SectionId>,
}

impl Section {
    fn new(kind: SectionKind, label_a: impl Into<String>, label_b: impl Into<String>) -> Self {
        Self {
            kind,
            label_a: label_a.into(),
            label_b: label_b.into(),
            notes: Vec::new(),
            items: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn children(&self) -> &[SectionId] {
        &self.children
    }
}

/// Arena-backed report tree. Created fresh per comparison run, populated
/// during traversal, trimmed, then read-only for rendering.
#[derive(Debug, Clone)]
pub struct ReportTree {
    nodes: Vec<Section>,
    root: SectionId,
}

impl ReportTree {
    pub fn new() -> Self {
        Self {
            nodes: vec![Section::new(SectionKind::Root, "", "")],
            root: SectionId(0),
        }
    }

    pub fn root(&self) -> SectionId {
        self.root
    }

    pub fn section(&self, id: SectionId) -> &Section {
        &self.nodes[id.0]
    }

    /// All sections in creation order, including ones detached by trimming.
    pub fn sections(&self) -> impl Iterator<Item = (SectionId, &Section)> {
        self.nodes.iter().enumerate().map(|(i, s)| (SectionId(i), s))
    }

    /// Allocate a detached section. Callers attach it with
    /// [`ReportTree::attach_child`] once it is fully populated, so that a
    /// trim of the intended parent cannot drop it half-built.
    pub fn add_section(
        &mut self,
        kind: SectionKind,
        label_a: impl Into<String>,
        label_b: impl Into<String>,
    ) -> SectionId {
        let id = SectionId(self.nodes.len());
        self.nodes.push(Section::new(kind, label_a, label_b));
        id
    }

    pub fn attach_child(&mut self, parent: SectionId, child: SectionId) {
        self.nodes[parent.0].children.push(child);
    }

    /// Allocate a new section and attach it to `parent` immediately.
    pub fn add_child(
        &mut self,
        parent: SectionId,
        kind: SectionKind,
        label_a: impl Into<String>,
        label_b: impl Into<String>,
    ) -> SectionId {
        let id = self.add_section(kind, label_a, label_b);
        self.attach_child(parent, id);
        id
    }

    pub fn add_item(
        &mut self,
        section: SectionId,
        kind: ChangeKind,
        before: impl Into<String>,
        after: impl Into<String>,
    ) {
        self.nodes[section.0].items.push(ChangeItem {
            kind,
            before: before.into(),
            after: after.into(),
        });
    }

    pub fn add_note(&mut self, section: SectionId, note: impl Into<String>) {
        self.nodes[section.0].notes.push(note.into());
    }

    /// A section is empty when it has no items and no children. Notes alone
    /// do not make a section worth keeping.
    pub fn is_empty(&self, id: SectionId) -> bool {
        let section = &self.nodes[id.0];
        section.items.is_empty() && section.children.is_empty()
    }

    /// Post-order prune: trim every child, then drop children that ended up
    /// empty. Idempotent.
    pub fn trim(&mut self, id: SectionId) {
        let children = self.nodes[id.0].children.clone();
        for child in &children {
            self.trim(*child);
        }
        let kept: Vec<SectionId> = children
            .into_iter()
            .filter(|child| !self.is_empty(*child))
            .collect();
        self.nodes[id.0].children = kept;
    }

    /// Whether the tree still reports any difference. Meaningful after
    /// trimming the root.
    pub fn has_changes(&self) -> bool {
        !self.is_empty(self.root)
    }
}

impl Default for ReportTree {
    fn default() -> Self {
        Self::new()
    }
}
