//! Message type comparison.
//!
//! Memoized exactly like enum comparisons. Unmatched fields with explicit
//! presence get a role-sensitive added/removed variant: removing an optional
//! field from a request-only message is a different finding than removing it
//! from a response-only one.

use crate::diff::engine::Comparison;
use crate::diff::report::{ChangeKind, SectionId, SectionKind};
use crate::diff::roles::MessageRole;
use crate::model::{FieldDescriptor, MessageDescriptor};

fn removed_kind(field: &FieldDescriptor, role: MessageRole) -> ChangeKind {
    if !field.explicit_presence {
        return ChangeKind::FieldRemoved;
    }
    match role {
        MessageRole::RequestOnly => ChangeKind::InputOptionalFieldRemoved,
        MessageRole::ResponseOnly => ChangeKind::OutputOptionalFieldRemoved,
        MessageRole::Unclear => ChangeKind::OptionalFieldRemoved,
    }
}

fn added_kind(field: &FieldDescriptor, role: MessageRole) -> ChangeKind {
    if !field.explicit_presence {
        return ChangeKind::FieldAdded;
    }
    match role {
        MessageRole::RequestOnly => ChangeKind::InputOptionalFieldAdded,
        MessageRole::ResponseOnly => ChangeKind::OutputOptionalFieldAdded,
        MessageRole::Unclear => ChangeKind::OptionalFieldAdded,
    }
}

impl Comparison<'_> {
    /// Compare two message types, memoized by the ordered pair of their
    /// fully-qualified names. The memo entry is inserted before any field
    /// recursion, so self-referential types terminate on the second visit.
    pub(crate) fn compare_messages(
        &mut self,
        msg_a: &MessageDescriptor,
        msg_b: &MessageDescriptor,
    ) -> SectionId {
        let key = (msg_a.full_name.clone(), msg_b.full_name.clone());
        if let Some(&section) = self.memo.get(&key) {
            return section;
        }

        let root = self.tree.root();
        let section = self.tree.add_child(
            root,
            SectionKind::MessageComparison,
            &msg_a.full_name,
            &msg_b.full_name,
        );
        self.memo.insert(key, section);

        let role_a = self.roles.role_of(&msg_a.full_name);
        let role_b = self.roles.role_of(&msg_b.full_name);

        for field_a in &msg_a.fields {
            let field_b = if self.options.match_by_number {
                msg_b.field_by_number(field_a.number)
            } else {
                msg_b.field_by_name(&field_a.name)
            };

            match field_b {
                Some(field_b) => {
                    let field_section = self.compare_fields(field_a, field_b);
                    self.tree.attach_child(section, field_section);
                }
                None => {
                    let id = self.entity_id(&field_a.name, field_a.number);
                    self.tree
                        .add_item(section, removed_kind(field_a, role_a), id, "");
                }
            }
        }

        for field_b in &msg_b.fields {
            let field_a = if self.options.match_by_number {
                msg_a.field_by_number(field_b.number)
            } else {
                msg_a.field_by_name(&field_b.name)
            };

            if field_a.is_none() {
                let id = self.entity_id(&field_b.name, field_b.number);
                self.tree
                    .add_item(section, added_kind(field_b, role_b), "", id);
            }
        }

        section
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::engine::{DiffEngine, DiffOptions};
    use crate::model::{
        FieldLabel, FieldType, MethodDescriptor, Schema, ServiceDescriptor,
    };

    fn field(name: &str, number: u32, msg: &str) -> FieldDescriptor {
        FieldDescriptor {
            name: name.to_string(),
            full_name: format!("{msg}.{name}"),
            number,
            label: FieldLabel::Optional,
            explicit_presence: false,
            field_type: FieldType::Int32,
            type_name: None,
            default: None,
        }
    }

    fn optional_field(name: &str, number: u32, msg: &str) -> FieldDescriptor {
        let mut f = field(name, number, msg);
        f.explicit_presence = true;
        f
    }

    fn message(full_name: &str, fields: Vec<FieldDescriptor>) -> MessageDescriptor {
        MessageDescriptor {
            name: full_name.rsplit('.').next().unwrap().to_string(),
            full_name: full_name.to_string(),
            fields,
        }
    }

    fn schema_with(entry: &str, messages: Vec<MessageDescriptor>) -> Schema {
        let mut schema = Schema::new(entry, Some("pkg".to_string()));
        for msg in messages {
            schema.add_message(msg, true);
        }
        schema
    }

    fn add_method(schema: &mut Schema, input: &str, output: &str) {
        schema.add_service(ServiceDescriptor {
            name: "Api".to_string(),
            full_name: "pkg.Api".to_string(),
            methods: vec![MethodDescriptor {
                name: "Do".to_string(),
                input_type: input.to_string(),
                output_type: output.to_string(),
                client_streaming: false,
                server_streaming: false,
            }],
        });
    }

    #[test]
    fn test_rename_under_number_matching_vs_name_matching() {
        let old = schema_with("a.proto", vec![message("pkg.User", vec![field("name", 1, "pkg.User")])]);
        let new = schema_with(
            "b.proto",
            vec![message("pkg.User", vec![field("full_name", 1, "pkg.User")])],
        );

        // By number: one NameChanged item on the matched field pair.
        let engine = DiffEngine::with_options(DiffOptions { match_by_number: true });
        let mut tree = engine.compare_files(&old, &new);
        tree.trim(tree.root());
        let items: Vec<_> = tree
            .sections()
            .flat_map(|(_, s)| s.items.iter())
            .collect();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind, ChangeKind::FieldNameChanged);

        // By name: removed + added, no NameChanged.
        let engine = DiffEngine::new();
        let mut tree = engine.compare_files(&old, &new);
        tree.trim(tree.root());
        let kinds: Vec<ChangeKind> = tree
            .sections()
            .flat_map(|(_, s)| s.items.iter().map(|i| i.kind))
            .collect();
        assert_eq!(kinds, vec![ChangeKind::FieldRemoved, ChangeKind::FieldAdded]);
    }

    #[test]
    fn test_plain_field_removed_and_added_labels() {
        let old = schema_with("a.proto", vec![message("pkg.M", vec![field("a", 1, "pkg.M")])]);
        let new = schema_with("b.proto", vec![message("pkg.M", vec![field("b", 2, "pkg.M")])]);
        let mut cmp = Comparison::new(DiffOptions::default(), &old, &new);
        let section = cmp.compare_messages(
            old.message("pkg.M").unwrap(),
            new.message("pkg.M").unwrap(),
        );
        let items = &cmp.tree.section(section).items;
        assert_eq!(items.len(), 2);
        assert_eq!((items[0].before.as_str(), items[0].after.as_str()), ("a", ""));
        assert_eq!((items[1].before.as_str(), items[1].after.as_str()), ("", "b"));
    }

    #[test]
    fn test_optional_removed_from_request_only_message() {
        let mut old = schema_with(
            "a.proto",
            vec![message("pkg.Req", vec![optional_field("note", 2, "pkg.Req")])],
        );
        let mut new = schema_with("b.proto", vec![message("pkg.Req", vec![])]);
        add_method(&mut old, "pkg.Req", "pkg.Resp");
        add_method(&mut new, "pkg.Req", "pkg.Resp");

        let mut tree = DiffEngine::new().compare_files(&old, &new);
        tree.trim(tree.root());
        let kinds: Vec<ChangeKind> = tree
            .sections()
            .flat_map(|(_, s)| s.items.iter().map(|i| i.kind))
            .collect();
        assert_eq!(kinds, vec![ChangeKind::InputOptionalFieldRemoved]);
    }

    #[test]
    fn test_optional_removed_from_response_only_message() {
        let mut old = schema_with(
            "a.proto",
            vec![message("pkg.Resp", vec![optional_field("note", 2, "pkg.Resp")])],
        );
        let mut new = schema_with("b.proto", vec![message("pkg.Resp", vec![])]);
        add_method(&mut old, "pkg.Req", "pkg.Resp");
        add_method(&mut new, "pkg.Req", "pkg.Resp");

        let mut tree = DiffEngine::new().compare_files(&old, &new);
        tree.trim(tree.root());
        let kinds: Vec<ChangeKind> = tree
            .sections()
            .flat_map(|(_, s)| s.items.iter().map(|i| i.kind))
            .collect();
        assert_eq!(kinds, vec![ChangeKind::OutputOptionalFieldRemoved]);
    }

    #[test]
    fn test_optional_removed_from_bidirectional_message() {
        let mut old = schema_with(
            "a.proto",
            vec![message("pkg.Both", vec![optional_field("note", 2, "pkg.Both")])],
        );
        let mut new = schema_with("b.proto", vec![message("pkg.Both", vec![])]);
        add_method(&mut old, "pkg.Both", "pkg.Both");
        add_method(&mut new, "pkg.Both", "pkg.Both");

        let mut tree = DiffEngine::new().compare_files(&old, &new);
        tree.trim(tree.root());
        let kinds: Vec<ChangeKind> = tree
            .sections()
            .flat_map(|(_, s)| s.items.iter().map(|i| i.kind))
            .collect();
        assert_eq!(kinds, vec![ChangeKind::OptionalFieldRemoved]);
    }

    // Documents the classification quirk: with no service referencing the
    // message, it counts as response-only.
    #[test]
    fn test_optional_removed_from_unreferenced_message() {
        let old = schema_with(
            "a.proto",
            vec![message("pkg.Plain", vec![optional_field("note", 2, "pkg.Plain")])],
        );
        let new = schema_with("b.proto", vec![message("pkg.Plain", vec![])]);

        let mut tree = DiffEngine::new().compare_files(&old, &new);
        tree.trim(tree.root());
        let kinds: Vec<ChangeKind> = tree
            .sections()
            .flat_map(|(_, s)| s.items.iter().map(|i| i.kind))
            .collect();
        assert_eq!(kinds, vec![ChangeKind::OutputOptionalFieldRemoved]);
    }

    #[test]
    fn test_optional_added_selects_new_side_role() {
        let mut old = schema_with("a.proto", vec![message("pkg.Req", vec![])]);
        let mut new = schema_with(
            "b.proto",
            vec![message("pkg.Req", vec![optional_field("note", 2, "pkg.Req")])],
        );
        add_method(&mut old, "pkg.Req", "pkg.Resp");
        add_method(&mut new, "pkg.Req", "pkg.Resp");

        let mut tree = DiffEngine::new().compare_files(&old, &new);
        tree.trim(tree.root());
        let items: Vec<_> = tree
            .sections()
            .flat_map(|(_, s)| s.items.iter())
            .collect();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind, ChangeKind::InputOptionalFieldAdded);
        assert_eq!((items[0].before.as_str(), items[0].after.as_str()), ("", "note"));
    }

    #[test]
    fn test_removed_field_id_under_number_matching() {
        let old = schema_with("a.proto", vec![message("pkg.M", vec![field("gone", 7, "pkg.M")])]);
        let new = schema_with("b.proto", vec![message("pkg.M", vec![])]);
        let engine = DiffEngine::with_options(DiffOptions { match_by_number: true });
        let mut tree = engine.compare_files(&old, &new);
        tree.trim(tree.root());
        let items: Vec<_> = tree
            .sections()
            .flat_map(|(_, s)| s.items.iter())
            .collect();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].before, "7");
    }

    #[test]
    fn test_self_referential_message_terminates() {
        // pkg.Node has a field of type pkg.Node
        let node_field = |msg: &str| FieldDescriptor {
            name: "next".to_string(),
            full_name: format!("{msg}.next"),
            number: 1,
            label: FieldLabel::Optional,
            explicit_presence: false,
            field_type: FieldType::Message,
            type_name: Some("pkg.Node".to_string()),
            default: None,
        };
        let old = schema_with("a.proto", vec![message("pkg.Node", vec![node_field("pkg.Node")])]);
        let new = schema_with("b.proto", vec![message("pkg.Node", vec![node_field("pkg.Node")])]);

        let mut cmp = Comparison::new(DiffOptions::default(), &old, &new);
        cmp.compare_messages(
            old.message("pkg.Node").unwrap(),
            new.message("pkg.Node").unwrap(),
        );
        // Exactly one memo entry for the pair, despite the self-reference.
        assert_eq!(cmp.memo.len(), 1);
    }
}
