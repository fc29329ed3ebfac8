/*
 * render_tests.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * End-to-end rendering of JSON document trees.
 */

use std::collections::HashMap;
use std::path::PathBuf;

use context_export::{RenderConfig, RenderError, TableConfig, render_document};
use context_export_types::{Node, NodeKind};
use pretty_assertions::assert_eq;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("test-fixtures")
        .join(name)
}

fn load_tree(name: &str) -> Node {
    let json = std::fs::read_to_string(fixture_path(name)).expect("Failed to read fixture");
    serde_json::from_str(&json).expect("Failed to parse fixture")
}

fn body_only() -> RenderConfig {
    RenderConfig {
        body_only: true,
        ..RenderConfig::default()
    }
}

// =============================================================================
// Tables
// =============================================================================

#[test]
fn test_simple_table_header_and_no_footer() {
    let tree = load_tree("simple-table.json");
    let expected =
        std::fs::read_to_string(fixture_path("simple-table.tex")).expect("Failed to read fixture");
    let output = render_document(&tree, &body_only()).unwrap();
    assert_eq!(output.text, expected);
    assert!(!output.text.contains("xtablefoot"));
}

fn grouped_table(groups: usize) -> Node {
    let row = |text: &str| {
        Node::new(NodeKind::TableRow).with_child(
            Node::new(NodeKind::TableCell).with_child(Node::text(text)),
        )
    };
    let mut rows = Vec::new();
    for group in 0..groups {
        if group > 0 {
            rows.push(Node::new(NodeKind::TableRow).with_property("type", "rule"));
        }
        rows.push(row(&format!("g{}", group)));
    }
    Node::new(NodeKind::Document).with_child(Node::new(NodeKind::Table).with_children(rows))
}

#[test]
fn test_three_groups_without_footer_source_have_no_footer() {
    let output = render_document(&grouped_table(3), &body_only()).unwrap();
    assert!(output.text.contains("\\startxtablehead"));
    assert!(!output.text.contains("\\startxtablefoot"));
}

#[test]
fn test_footer_style_enables_footer() {
    let config = RenderConfig {
        table: TableConfig {
            footer_style: "MyFoot".to_string(),
            ..TableConfig::default()
        },
        ..body_only()
    };
    let output = render_document(&grouped_table(3), &config).unwrap();
    let foot = output.text.find("\\startxtablefoot[MyFoot]\n").expect("footer section");
    assert!(output.text[foot..].contains("g2"));
    assert!(!output.text[foot..].contains("g1"));
}

#[test]
fn test_two_groups_never_have_footer() {
    let config = RenderConfig {
        table: TableConfig {
            footer: "repeat".to_string(),
            ..TableConfig::default()
        },
        ..body_only()
    };
    let output = render_document(&grouped_table(2), &config).unwrap();
    assert!(!output.text.contains("\\startxtablefoot"));
    assert!(!output.text.contains("footer="));
}

#[test]
fn test_rule_colgroup_and_corner_roles_together() {
    let row = |cells: [&str; 4]| {
        Node::new(NodeKind::TableRow).with_children(
            cells.map(|text| Node::new(NodeKind::TableCell).with_child(Node::text(text))),
        )
    };
    let colgroups = row(["<", ">", "<", ">"]).with_property("type", "colgroup");
    let rule = Node::new(NodeKind::TableRow).with_property("type", "rule");
    let table = Node::new(NodeKind::Table).with_children([
        colgroups,
        row(["a", "b", "c", "d"]),
        rule,
        row(["e", "f", "g", "h"]),
        row(["i", "j", "k", "l"]),
    ]);
    let tree = Node::new(NodeKind::Document).with_child(table);
    let output = render_document(&tree, &body_only()).unwrap();
    assert_eq!(
        output.text,
        "\\startxtable[DocTable]\n\
         \\startxtablehead[DocTableHead]\n\
         \\startxrow\n\
         \x20 \\startxcell[DocTableTopLeft] a \\stopxcell\n\
         \x20 \\startxcell[DocTableColGroupEnd] b \\stopxcell\n\
         \x20 \\startxcell[DocTableColGroupStart] c \\stopxcell\n\
         \x20 \\startxcell[DocTableTopRight] d \\stopxcell\n\
         \\stopxrow\n\
         \\stopxtablehead\n\
         \\startxtablebody[DocTableBody]\n\
         \\startxrow[DocTableGroupStart]\n\
         \x20 \\startxcell[DocTableLeft] e \\stopxcell\n\
         \x20 \\startxcell[DocTableColGroupEnd] f \\stopxcell\n\
         \x20 \\startxcell[DocTableColGroupStart] g \\stopxcell\n\
         \x20 \\startxcell[DocTableRight] h \\stopxcell\n\
         \\stopxrow\n\
         \\startxrow[DocTableLastRow]\n\
         \x20 \\startxcell[DocTableBottomLeft] i \\stopxcell\n\
         \x20 \\startxcell[DocTableColGroupEnd] j \\stopxcell\n\
         \x20 \\startxcell[DocTableColGroupStart] k \\stopxcell\n\
         \x20 \\startxcell[DocTableBottomRight] l \\stopxcell\n\
         \\stopxrow\n\
         \\stopxtablebody\n\
         \\stopxtable\n"
    );
}

// =============================================================================
// Zones
// =============================================================================

#[test]
fn test_zone_headings_are_diverted() {
    let tree = load_tree("zones.json");
    let config = RenderConfig {
        template: Some("sectioned".to_string()),
        templates: HashMap::from([(
            "sectioned".to_string(),
            "%f\n[body]\n%c\n[appendix]\n%a\n".to_string(),
        )]),
        ..body_only()
    };
    let output = render_document(&tree, &config).unwrap();
    let text = &output.text;

    let body_start = text.find("[body]").unwrap();
    let appendix_start = text.find("[appendix]").unwrap();
    let front = &text[..body_start];
    let body = &text[body_start..appendix_start];
    let appendix = &text[appendix_start..];

    assert!(front.contains("title={Preface}"));
    assert!(body.contains("title={Introduction}"));
    assert!(body.contains("title={Conclusion}"));
    assert!(!body.contains("Appendix"));
    assert!(!body.contains("Preface"));

    let first = appendix.find("First Appendix").unwrap();
    let second = appendix.find("Second Appendix").unwrap();
    assert!(first < second);
    assert!(appendix.contains("Extra material."));

    for title in ["Preface", "Introduction", "Conclusion", "First Appendix", "Second Appendix"] {
        assert_eq!(text.matches(&format!("title={{{}}}", title)).count(), 1, "{}", title);
    }
}

#[test]
fn test_nested_zone_headings_keep_their_structure() {
    let inner = Node::heading(2, "Tables")
        .with_property("zone", "appendix")
        .with_child(Node::paragraph("Row data."));
    let outer = Node::heading(1, "Data")
        .with_property("zone", "appendix")
        .with_child(Node::paragraph("Overview."))
        .with_child(inner);
    let tree = Node::new(NodeKind::Document)
        .with_child(Node::heading(1, "Main").with_child(Node::paragraph("Body.")))
        .with_child(outer)
        .with_child(Node::heading(1, "Notes").with_property("zone", "appendix"));
    let config = RenderConfig {
        template: Some("split".to_string()),
        templates: HashMap::from([("split".to_string(), "%c\n@@\n%a".to_string())]),
        ..body_only()
    };
    let output = render_document(&tree, &config).unwrap();
    let (body, appendix) = output.text.split_once("\n@@\n").unwrap();

    assert!(body.contains("title={Main}"));
    assert!(!body.contains("Data"));
    assert!(!body.contains("Tables"));

    let data = appendix.find("\\startsection[title={Data}]").unwrap();
    let overview = appendix.find("Overview.").unwrap();
    let tables = appendix.find("\\startsubsection[title={Tables}]").unwrap();
    let data_end = appendix.find("\\stopsection").unwrap();
    let notes = appendix.find("title={Notes}").unwrap();
    assert!(data < overview && overview < tables);
    assert!(tables < data_end && data_end < notes);
    assert_eq!(appendix.matches("title={Tables}").count(), 1);
}

#[test]
fn test_builtin_layout_places_frontmatter_first() {
    let tree = load_tree("zones.json");
    let output = render_document(&tree, &body_only()).unwrap();
    let preface = output.text.find("Preface").unwrap();
    let introduction = output.text.find("Introduction").unwrap();
    let appendix = output.text.find("First Appendix").unwrap();
    assert!(preface < introduction);
    assert!(introduction < appendix);
}

#[test]
fn test_missing_template_warns() {
    let tree = load_tree("zones.json");
    let config = RenderConfig {
        template: Some("absent".to_string()),
        ..body_only()
    };
    let output = render_document(&tree, &config).unwrap();
    assert_eq!(output.warnings.len(), 1);
    assert_eq!(output.warnings[0].kind, context_export::WarningKind::MissingTemplate);
    assert!(output.text.contains("Introduction"));
}

// =============================================================================
// Metadata
// =============================================================================

#[test]
fn test_keyword_metadata_reaches_the_wrapper() {
    let tree = Node::new(NodeKind::Document)
        .with_child(
            Node::new(NodeKind::Keyword)
                .with_property("key", "TITLE")
                .with_property("value", "My @code{ls} Title"),
        )
        .with_child(Node::paragraph("Text."));
    let output = render_document(&tree, &RenderConfig::default()).unwrap();
    assert!(output.text.contains("\\setupinteraction[state={start},\n   title={My ls Title}"));
    assert!(output.text.contains("\\setvariables[document][title={My ls Title}"));
    assert!(output.text.contains("{\\tfd My ls Title}"));
    assert!(!output.text.contains("@code"));
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn test_missing_declared_coderef_aborts() {
    let tree = load_tree("missing-coderef.json");
    let error = render_document(&tree, &RenderConfig::default()).unwrap_err();
    assert_eq!(
        error,
        RenderError::CodeRefNotFound {
            label: "jump".to_string()
        }
    );
}

#[test]
fn test_unknown_footnote_aborts() {
    let paragraph = Node::new(NodeKind::Paragraph)
        .with_child(Node::new(NodeKind::FootnoteReference).with_property("label", "nope"));
    let tree = Node::new(NodeKind::Document).with_child(paragraph);
    let error = render_document(&tree, &body_only()).unwrap_err();
    assert!(matches!(error, RenderError::Reference { .. }));
}

// =============================================================================
// Footnotes
// =============================================================================

#[test]
fn test_footnote_rendered_once_then_referenced() {
    let tree = load_tree("footnotes.json");
    let output = render_document(&tree, &body_only()).unwrap();
    assert_eq!(
        output.text,
        "First\\footnote[fn:1]{The note.} and again\\note[fn:1]\n"
    );
}

#[test]
fn test_render_is_deterministic() {
    for fixture in ["simple-table.json", "zones.json", "footnotes.json"] {
        let tree = load_tree(fixture);
        let first = render_document(&tree, &RenderConfig::default()).unwrap();
        let second = render_document(&tree, &RenderConfig::default()).unwrap();
        assert_eq!(first, second, "{}", fixture);
    }
}
