//! JSON report.

use serde::Serialize;

use crate::diff::{ChangeItem, ReportTree, SectionId, SectionKind};
use crate::error::Result;

/// One report section as serialized JSON. Built recursively from the arena,
/// so the shared-by-memoization sections appear once per reference site.
#[derive(Debug, Serialize)]
pub struct JsonSection<'a> {
    pub kind: SectionKind,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub label_a: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub label_b: &'a str,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    pub notes: &'a [String],
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    pub items: &'a [ChangeItem],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<JsonSection<'a>>,
}

impl<'a> JsonSection<'a> {
    pub fn from_tree(tree: &'a ReportTree, id: SectionId) -> Self {
        let section = tree.section(id);
        Self {
            kind: section.kind,
            label_a: &section.label_a,
            label_b: &section.label_b,
            notes: &section.notes,
            items: &section.items,
            children: section
                .children()
                .iter()
                .map(|child| Self::from_tree(tree, *child))
                .collect(),
        }
    }
}

/// Render a report tree as pretty-printed JSON.
pub fn render_json(tree: &ReportTree) -> Result<String> {
    let root = JsonSection::from_tree(tree, tree.root());
    let mut rendered = serde_json::to_string_pretty(&root)?;
    rendered.push('\n');
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::ChangeKind;

    #[test]
    fn test_json_structure() {
        let mut tree = ReportTree::new();
        let root = tree.root();
        let section = tree.add_child(root, SectionKind::EnumComparison, "pkg.E", "pkg.E");
        tree.add_item(section, ChangeKind::EnumValueRemoved, "FAIL", "");

        let json = render_json(&tree).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["kind"], "root");
        assert_eq!(value["children"][0]["kind"], "enum_comparison");
        assert_eq!(value["children"][0]["items"][0]["kind"], "enum_value_removed");
        assert_eq!(value["children"][0]["items"][0]["before"], "FAIL");
    }

    #[test]
    fn test_empty_collections_are_omitted() {
        let tree = ReportTree::new();
        let json = render_json(&tree).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value.get("items").is_none());
        assert!(value.get("children").is_none());
        assert!(value.get("label_a").is_none());
    }
}
