//! Field pair comparison.
//!
//! Never memoized: field identity is not shared across call sites, so every
//! matched pair gets its own section under the enclosing message section.
//! Nested enum/message types recurse through the memoized type comparators.

use crate::diff::defaults::default_values_equal;
use crate::diff::engine::Comparison;
use crate::diff::report::{ChangeKind, SectionId, SectionKind};
use crate::model::{FieldDescriptor, FieldType};

impl Comparison<'_> {
    /// Compare a matched field pair. The returned section is detached; the
    /// caller attaches it to the enclosing message section. Attaching only
    /// after the section is complete keeps a recursive type comparison from
    /// trimming it away half-built.
    pub(crate) fn compare_fields(
        &mut self,
        field_a: &FieldDescriptor,
        field_b: &FieldDescriptor,
    ) -> SectionId {
        let section = self.tree.add_section(
            SectionKind::FieldComparison,
            &field_a.name,
            &field_b.name,
        );

        if field_a.name != field_b.name {
            self.tree
                .add_item(section, ChangeKind::FieldNameChanged, &field_a.name, &field_b.name);
        }

        if field_a.number != field_b.number {
            self.tree.add_item(
                section,
                ChangeKind::FieldIdChanged,
                field_a.number.to_string(),
                field_b.number.to_string(),
            );
        }

        if field_a.label != field_b.label
            || field_a.explicit_presence != field_b.explicit_presence
        {
            // Only flagged; the category change carries no further detail.
            self.tree
                .add_item(section, ChangeKind::FieldLabelChanged, "", "");
        }

        if field_a.field_type != field_b.field_type {
            self.tree.add_item(
                section,
                ChangeKind::FieldTypeChanged,
                field_a.field_type.proto_name(),
                field_b.field_type.proto_name(),
            );
        } else if field_a.field_type == FieldType::Enum {
            self.compare_referenced_enums(field_a, field_b, section);
        } else if field_a.field_type == FieldType::Message {
            self.compare_referenced_messages(field_a, field_b, section);
        }

        if field_a.field_type.value_kind() == field_b.field_type.value_kind()
            && !default_values_equal(self.old, field_a, self.new, field_b)
        {
            self.tree
                .add_item(section, ChangeKind::FieldDefaultChanged, "", "");
        }

        section
    }

    /// Recurse into the referenced enum types and surface a non-empty
    /// sub-report as a change of this field, even though the field's own
    /// declared type is the same on both sides.
    fn compare_referenced_enums(
        &mut self,
        field_a: &FieldDescriptor,
        field_b: &FieldDescriptor,
        section: SectionId,
    ) {
        let (old, new) = (self.old, self.new);
        let enum_a = field_a.type_name.as_deref().and_then(|n| old.enum_type(n));
        let enum_b = field_b.type_name.as_deref().and_then(|n| new.enum_type(n));
        let (Some(enum_a), Some(enum_b)) = (enum_a, enum_b) else {
            return;
        };

        let sub = self.compare_enums(enum_a, enum_b);
        self.tree.add_note(
            sub,
            format!("Required by {} -> {}", field_a.full_name, field_b.full_name),
        );
        self.tree.trim(sub);
        if !self.tree.is_empty(sub) {
            self.tree.add_item(
                section,
                ChangeKind::FieldTypeImpacted,
                &enum_a.full_name,
                &enum_b.full_name,
            );
        }
    }

    /// Message counterpart of [`Comparison::compare_referenced_enums`].
    fn compare_referenced_messages(
        &mut self,
        field_a: &FieldDescriptor,
        field_b: &FieldDescriptor,
        section: SectionId,
    ) {
        let (old, new) = (self.old, self.new);
        let msg_a = field_a.type_name.as_deref().and_then(|n| old.message(n));
        let msg_b = field_b.type_name.as_deref().and_then(|n| new.message(n));
        let (Some(msg_a), Some(msg_b)) = (msg_a, msg_b) else {
            return;
        };

        let sub = self.compare_messages(msg_a, msg_b);
        self.tree.add_note(
            sub,
            format!("Required by {} -> {}", field_a.full_name, field_b.full_name),
        );
        self.tree.trim(sub);
        if !self.tree.is_empty(sub) {
            self.tree.add_item(
                section,
                ChangeKind::FieldTypeImpacted,
                &msg_a.full_name,
                &msg_b.full_name,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::engine::DiffOptions;
    use crate::model::{
        DefaultValue, EnumDescriptor, EnumValueDescriptor, FieldLabel, Schema,
    };

    fn scalar_field(name: &str, number: u32, field_type: FieldType) -> FieldDescriptor {
        FieldDescriptor {
            name: name.to_string(),
            full_name: format!("pkg.M.{name}"),
            number,
            label: FieldLabel::Optional,
            explicit_presence: false,
            field_type,
            type_name: None,
            default: None,
        }
    }

    fn kinds(cmp: &Comparison<'_>, section: SectionId) -> Vec<ChangeKind> {
        cmp.tree.section(section).items.iter().map(|i| i.kind).collect()
    }

    #[test]
    fn test_identical_fields_report_nothing() {
        let old = Schema::new("a.proto", None);
        let new = Schema::new("b.proto", None);
        let mut cmp = Comparison::new(DiffOptions::default(), &old, &new);
        let a = scalar_field("id", 1, FieldType::Int32);
        let section = cmp.compare_fields(&a, &a.clone());
        assert!(cmp.tree.section(section).items.is_empty());
    }

    #[test]
    fn test_rename_renumber_and_label_flags() {
        let old = Schema::new("a.proto", None);
        let new = Schema::new("b.proto", None);
        let mut cmp = Comparison::new(DiffOptions::default(), &old, &new);

        let a = scalar_field("name", 1, FieldType::String);
        let mut b = scalar_field("full_name", 2, FieldType::String);
        b.label = FieldLabel::Repeated;
        let section = cmp.compare_fields(&a, &b);

        assert_eq!(
            kinds(&cmp, section),
            vec![
                ChangeKind::FieldNameChanged,
                ChangeKind::FieldIdChanged,
                ChangeKind::FieldLabelChanged,
            ]
        );
        let items = &cmp.tree.section(section).items;
        assert_eq!((items[0].before.as_str(), items[0].after.as_str()), ("name", "full_name"));
        assert_eq!((items[1].before.as_str(), items[1].after.as_str()), ("1", "2"));
        // Label change carries no detail
        assert_eq!((items[2].before.as_str(), items[2].after.as_str()), ("", ""));
    }

    #[test]
    fn test_presence_flag_counts_as_label_change() {
        let old = Schema::new("a.proto", None);
        let new = Schema::new("b.proto", None);
        let mut cmp = Comparison::new(DiffOptions::default(), &old, &new);

        let a = scalar_field("id", 1, FieldType::Int32);
        let mut b = scalar_field("id", 1, FieldType::Int32);
        b.explicit_presence = true;
        let section = cmp.compare_fields(&a, &b);
        assert_eq!(kinds(&cmp, section), vec![ChangeKind::FieldLabelChanged]);
    }

    #[test]
    fn test_type_change_reports_names_without_recursion() {
        let old = Schema::new("a.proto", None);
        let new = Schema::new("b.proto", None);
        let mut cmp = Comparison::new(DiffOptions::default(), &old, &new);

        let a = scalar_field("id", 1, FieldType::Int32);
        let b = scalar_field("id", 1, FieldType::String);
        let section = cmp.compare_fields(&a, &b);
        let items = &cmp.tree.section(section).items;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind, ChangeKind::FieldTypeChanged);
        assert_eq!((items[0].before.as_str(), items[0].after.as_str()), ("int32", "string"));
        assert!(cmp.memo.is_empty());
    }

    fn schema_with_status(entry: &str, values: &[(&str, i32)]) -> Schema {
        let mut schema = Schema::new(entry, Some("pkg".to_string()));
        schema.add_enum(
            EnumDescriptor {
                name: "Status".to_string(),
                full_name: "pkg.Status".to_string(),
                values: values
                    .iter()
                    .map(|(n, i)| EnumValueDescriptor {
                        name: (*n).to_string(),
                        number: *i,
                    })
                    .collect(),
            },
            true,
        );
        schema
    }

    fn enum_field(name: &str) -> FieldDescriptor {
        let mut f = scalar_field(name, 1, FieldType::Enum);
        f.type_name = Some("pkg.Status".to_string());
        f
    }

    #[test]
    fn test_unchanged_enum_type_stays_silent() {
        let old = schema_with_status("a.proto", &[("OK", 0)]);
        let new = schema_with_status("b.proto", &[("OK", 0)]);
        let mut cmp = Comparison::new(DiffOptions::default(), &old, &new);
        let section = cmp.compare_fields(&enum_field("status"), &enum_field("status"));
        assert!(cmp.tree.section(section).items.is_empty());
        // The sub-comparison exists but trimmed to empty.
        assert_eq!(cmp.memo.len(), 1);
    }

    #[test]
    fn test_changed_enum_type_surfaces_on_field() {
        let old = schema_with_status("a.proto", &[("OK", 0), ("FAIL", 1)]);
        let new = schema_with_status("b.proto", &[("OK", 0)]);
        let mut cmp = Comparison::new(DiffOptions::default(), &old, &new);
        let section = cmp.compare_fields(&enum_field("status"), &enum_field("status"));

        let items = &cmp.tree.section(section).items;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind, ChangeKind::FieldTypeImpacted);
        assert_eq!(items[0].before, "pkg.Status");

        // Provenance note lands on the shared enum section.
        let (_, enum_section) = cmp
            .tree
            .sections()
            .find(|(_, s)| s.kind == SectionKind::EnumComparison)
            .unwrap();
        assert_eq!(
            enum_section.notes,
            vec!["Required by pkg.M.status -> pkg.M.status".to_string()]
        );
    }

    #[test]
    fn test_default_change_flagged_for_same_kind() {
        let old = Schema::new("a.proto", None);
        let new = Schema::new("b.proto", None);
        let mut cmp = Comparison::new(DiffOptions::default(), &old, &new);

        let mut a = scalar_field("retries", 1, FieldType::Int32);
        a.default = Some(DefaultValue::Int(3));
        let mut b = scalar_field("retries", 1, FieldType::Int32);
        b.default = Some(DefaultValue::Int(5));
        let section = cmp.compare_fields(&a, &b);
        assert_eq!(kinds(&cmp, section), vec![ChangeKind::FieldDefaultChanged]);
    }

    #[test]
    fn test_no_default_check_across_kinds() {
        // A type change already reports the incompatibility; the default
        // comparator only runs for matching value kinds.
        let old = Schema::new("a.proto", None);
        let new = Schema::new("b.proto", None);
        let mut cmp = Comparison::new(DiffOptions::default(), &old, &new);

        let mut a = scalar_field("x", 1, FieldType::Int32);
        a.default = Some(DefaultValue::Int(3));
        let b = scalar_field("x", 1, FieldType::String);
        let section = cmp.compare_fields(&a, &b);
        assert_eq!(kinds(&cmp, section), vec![ChangeKind::FieldTypeChanged]);
    }
}
