//! Indented plain-text report.

use crate::diff::{ReportTree, Section, SectionId, SectionKind};

/// Render a (typically trimmed) report tree as indented text. Each nesting
/// level indents by two spaces; change items are bulleted under their
/// section heading, after any provenance notes.
pub fn render_text(tree: &ReportTree) -> String {
    let mut out = String::new();
    render_section(tree, tree.root(), 0, &mut out);
    out
}

fn render_section(tree: &ReportTree, id: SectionId, depth: usize, out: &mut String) {
    let section = tree.section(id);
    let indent = "  ".repeat(depth);
    out.push_str(&indent);
    out.push_str(&heading(section));
    out.push('\n');
    for note in &section.notes {
        out.push_str(&indent);
        out.push_str("  ");
        out.push_str(note);
        out.push('\n');
    }
    for item in &section.items {
        out.push_str(&indent);
        out.push_str("  * ");
        out.push_str(&item.message());
        out.push('\n');
    }
    for child in section.children() {
        render_section(tree, *child, depth + 1, out);
    }
}

fn heading(section: &Section) -> String {
    let what = match section.kind {
        SectionKind::Root => return "/".to_string(),
        SectionKind::MessageComparison => "messages",
        SectionKind::FieldComparison => "fields",
        SectionKind::EnumComparison => "enums",
        SectionKind::EnumValueComparison => "values",
    };
    format!("Comparing {what}: {} -> {}", section.label_a, section.label_b)
}
