/*
 * node.rs
 * Copyright (c) 2025 Posit, PBC
 */

use crate::kind::NodeKind;
use crate::property::{Properties, PropertyValue};
use crate::zone::Zone;
use serde::{Deserialize, Serialize};

pub type Nodes = Vec<Node>;

/// One element of the document tree.
///
/// Children are owned exclusively by their parent. The tree is never
/// mutated while it is being rendered, so the renderer may use node
/// addresses as identities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Properties::is_empty")]
    pub properties: Properties,
    /// Heading title, or the term of a descriptive list item.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub title: Nodes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<Nodes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_id: Option<String>,
    /// Blank count following the node: spaces for objects, blank lines
    /// for elements.
    #[serde(default)]
    pub post_blank: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Nodes,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Node {
            kind,
            properties: Properties::new(),
            title: Vec::new(),
            caption: None,
            name: None,
            custom_id: None,
            post_blank: 0,
            children: Vec::new(),
        }
    }

    /// A plain-text object.
    pub fn text(value: impl Into<String>) -> Self {
        Node::new(NodeKind::PlainText).with_property("value", value.into())
    }

    /// A paragraph holding a single plain-text object, followed by one
    /// blank line.
    pub fn paragraph(text: impl Into<String>) -> Self {
        Node::new(NodeKind::Paragraph)
            .with_child(Node::text(text))
            .with_post_blank(1)
    }

    /// A heading at `level` with a plain-text title.
    pub fn heading(level: i64, title: impl Into<String>) -> Self {
        Node::new(NodeKind::Heading)
            .with_property("level", level)
            .with_title(vec![Node::text(title)])
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn with_title(mut self, title: Nodes) -> Self {
        self.title = title;
        self
    }

    pub fn with_caption(mut self, caption: Nodes) -> Self {
        self.caption = Some(caption);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_custom_id(mut self, id: impl Into<String>) -> Self {
        self.custom_id = Some(id.into());
        self
    }

    pub fn with_post_blank(mut self, post_blank: usize) -> Self {
        self.post_blank = post_blank;
        self
    }

    // ------------------------------------------------------------------
    // Property access
    // ------------------------------------------------------------------

    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    pub fn has_property(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    pub fn text_property(&self, key: &str) -> Option<&str> {
        self.property(key).and_then(PropertyValue::as_str)
    }

    pub fn number_property(&self, key: &str) -> Option<i64> {
        self.property(key).and_then(PropertyValue::as_number)
    }

    /// Absent properties are false.
    pub fn flag(&self, key: &str) -> bool {
        self.property(key).is_some_and(PropertyValue::is_truthy)
    }

    pub fn list_property(&self, key: &str) -> Vec<&str> {
        self.property(key).map(PropertyValue::as_list).unwrap_or_default()
    }

    /// The `value` property, or the empty string.
    pub fn value(&self) -> &str {
        self.text_property("value").unwrap_or("")
    }

    /// Heading level, defaulting to 1.
    pub fn level(&self) -> usize {
        self.number_property("level")
            .map(|level| level.max(1) as usize)
            .unwrap_or(1)
    }

    /// The zone a heading is routed into. Unparseable markers are ignored.
    pub fn zone(&self) -> Zone {
        self.text_property("zone")
            .and_then(|z| z.parse().ok())
            .unwrap_or(Zone::Body)
    }

    // ------------------------------------------------------------------
    // Traversal helpers
    // ------------------------------------------------------------------

    /// Concatenated text of every plain-text descendant (titles and
    /// captions excluded), with each descendant's trailing spaces.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }

    /// Plain text of the title.
    pub fn title_text(&self) -> String {
        let mut out = String::new();
        collect_text(&self.title, &mut out);
        out.trim().to_string()
    }

    /// Pre-order walk over this node and its descendants, including titles
    /// and captions.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Node)) {
        visit(self);
        for child in &self.title {
            child.walk(visit);
        }
        if let Some(caption) = &self.caption {
            for child in caption {
                child.walk(visit);
            }
        }
        for child in &self.children {
            child.walk(visit);
        }
    }
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node.kind {
            NodeKind::PlainText
            | NodeKind::Code
            | NodeKind::Verbatim
            | NodeKind::StatisticsCookie
            | NodeKind::InlineCode => out.push_str(node.value()),
            _ => collect_text(&node.children, out),
        }
        for _ in 0..node.post_blank {
            out.push(' ');
        }
    }
}
