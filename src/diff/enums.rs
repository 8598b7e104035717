//! Enum type comparison.

use crate::diff::engine::Comparison;
use crate::diff::report::{ChangeKind, SectionId, SectionKind};
use crate::model::EnumDescriptor;

impl Comparison<'_> {
    /// Compare two enum types, memoized by the ordered pair of their
    /// fully-qualified names. Every reference site gets the same section.
    pub(crate) fn compare_enums(
        &mut self,
        enum_a: &EnumDescriptor,
        enum_b: &EnumDescriptor,
    ) -> SectionId {
        let key = (enum_a.full_name.clone(), enum_b.full_name.clone());
        if let Some(&section) = self.memo.get(&key) {
            return section;
        }

        let root = self.tree.root();
        let section = self.tree.add_child(
            root,
            SectionKind::EnumComparison,
            &enum_a.full_name,
            &enum_b.full_name,
        );
        self.memo.insert(key, section);

        for value_a in &enum_a.values {
            let value_b = if self.options.match_by_number {
                enum_b.value_by_number(value_a.number)
            } else {
                enum_b.value_by_name(&value_a.name)
            };

            match value_b {
                Some(value_b) => {
                    let pair = self.tree.add_child(
                        section,
                        SectionKind::EnumValueComparison,
                        &value_a.name,
                        &value_b.name,
                    );
                    if value_a.number != value_b.number {
                        self.tree.add_item(
                            pair,
                            ChangeKind::EnumValueIdChanged,
                            value_a.number.to_string(),
                            value_b.number.to_string(),
                        );
                    }
                    if value_a.name != value_b.name {
                        self.tree.add_item(
                            pair,
                            ChangeKind::EnumValueNameChanged,
                            &value_a.name,
                            &value_b.name,
                        );
                    }
                }
                None => {
                    let id = self.entity_id(&value_a.name, value_a.number);
                    self.tree
                        .add_item(section, ChangeKind::EnumValueRemoved, id, "");
                }
            }
        }

        for value_b in &enum_b.values {
            let value_a = if self.options.match_by_number {
                enum_a.value_by_number(value_b.number)
            } else {
                enum_a.value_by_name(&value_b.name)
            };
            if value_a.is_none() {
                let id = self.entity_id(&value_b.name, value_b.number);
                self.tree
                    .add_item(section, ChangeKind::EnumValueAdded, "", id);
            }
        }

        section
    }
}
