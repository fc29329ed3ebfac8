/*
 * annotations.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Transform that strips Texinfo-style annotations from metadata.
 */

//! Texinfo annotation stripping.
//!
//! Metadata written for other backends may carry `@code{…}`-style markup.
//! ConTeXt has no use for it, so the annotation is replaced by its inner
//! text. Only document metadata properties and metadata keywords are
//! touched; body text is left alone.

use context_export_types::{Node, NodeKind, PropertyValue};
use once_cell::sync::Lazy;
use regex::Regex;

use super::TreeTransform;

/// Metadata keys whose values are cleaned.
const METADATA_KEYS: [&str; 8] = [
    "title",
    "subtitle",
    "author",
    "email",
    "date",
    "description",
    "keywords",
    "subject",
];

static ANNOTATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"@(?:code|samp|var|emph|strong|file|url|kbd|key|dfn|cite|acronym|command|env|option)\{([^{}]*)\}",
    )
    .expect("valid annotation regex")
});

pub struct AnnotationTransform;

impl TreeTransform for AnnotationTransform {
    fn name(&self) -> &str {
        "annotations"
    }

    fn transform(&self, mut root: Node) -> Node {
        if root.kind == NodeKind::Document {
            clean_properties(&mut root, |key| METADATA_KEYS.contains(&key));
        }
        clean_keywords(&mut root);
        root
    }
}

/// Replace every annotation in `text` by its contents, until none remain.
///
/// Innermost annotations are replaced first, so nested annotations unwrap
/// across iterations.
pub fn strip_annotations(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = ANNOTATION.replace_all(&current, "$1").into_owned();
        if next == current {
            return current;
        }
        current = next;
    }
}

fn clean_properties(node: &mut Node, selected: impl Fn(&str) -> bool) {
    for (key, value) in node.properties.iter_mut() {
        if !selected(key) {
            continue;
        }
        match value {
            PropertyValue::Text(text) => *text = strip_annotations(text),
            PropertyValue::List(items) => {
                for item in items.iter_mut() {
                    *item = strip_annotations(item);
                }
            }
            PropertyValue::Flag(_) | PropertyValue::Number(_) => {}
        }
    }
}

/// Metadata keywords may sit at the top level or directly in the first
/// section.
fn clean_keywords(root: &mut Node) {
    clean_metadata_keywords(&mut root.children);
    if let Some(section) = root
        .children
        .iter_mut()
        .find(|node| node.kind == NodeKind::Section)
    {
        clean_metadata_keywords(&mut section.children);
    }
}

fn clean_metadata_keywords(nodes: &mut [Node]) {
    for node in nodes.iter_mut().filter(|node| node.kind == NodeKind::Keyword) {
        let is_metadata = node
            .text_property("key")
            .is_some_and(|key| METADATA_KEYS.contains(&key.to_lowercase().as_str()));
        if is_metadata {
            clean_properties(node, |key| key == "value");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_strip_simple_annotation() {
        assert_eq!(strip_annotations("Using @code{grep}"), "Using grep");
    }

    #[test]
    fn test_nested_annotations_reach_fixpoint() {
        assert_eq!(strip_annotations("@emph{@var{x} and @kbd{C-x}}"), "x and C-x");
    }

    #[test]
    fn test_unknown_annotation_untouched() {
        assert_eq!(strip_annotations("mail me @home{x}"), "mail me @home{x}");
    }

    #[test]
    fn test_document_metadata_and_keywords_cleaned() {
        let tree = Node::new(NodeKind::Document)
            .with_property("title", "The @command{ls} manual")
            .with_property("author", vec!["@strong{Ann}".to_string()])
            .with_child(
                Node::new(NodeKind::Keyword)
                    .with_property("key", "SUBTITLE")
                    .with_property("value", "@samp{-l}"),
            )
            .with_child(Node::paragraph("literal @code{kept}"));

        let out = AnnotationTransform.transform(tree);
        assert_eq!(out.text_property("title"), Some("The ls manual"));
        assert_eq!(out.list_property("author"), vec!["Ann"]);
        assert_eq!(out.children[0].value(), "-l");
        assert_eq!(out.children[1].plain_text(), "literal @code{kept}");
    }

    #[test]
    fn test_only_first_section_keywords_are_metadata() {
        let keyword = || {
            Node::new(NodeKind::Keyword)
                .with_property("key", "title")
                .with_property("value", "@var{x}")
        };
        let tree = Node::new(NodeKind::Document)
            .with_child(Node::new(NodeKind::Section).with_child(keyword()))
            .with_child(Node::new(NodeKind::Section).with_child(keyword()));

        let out = AnnotationTransform.transform(tree);
        assert_eq!(out.children[0].children[0].value(), "x");
        assert_eq!(out.children[1].children[0].value(), "@var{x}");
    }

    #[test]
    fn test_idempotent() {
        let tree = Node::new(NodeKind::Document).with_property("title", "@file{a.txt}");
        let once = AnnotationTransform.transform(tree);
        let twice = AnnotationTransform.transform(once.clone());
        assert_eq!(once, twice);
    }
}
