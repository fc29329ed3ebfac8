/*
 * references.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Reference ids, labels and link resolution.
//!
//! A [`ReferenceRegistry`] is built once per render pass over the final
//! tree. Nodes are identified by address, which is stable because the tree
//! is borrowed immutably for the whole pass.
//!
//! # Labels
//!
//! | Node | Prefix |
//! |---|---|
//! | heading | `sec:` |
//! | table | `tab:` |
//! | math environment of a known kind | `eq:` |
//! | captioned paragraph holding a single image | `fig:` |
//! | anything else | none |
//!
//! The label body is the node's custom id, else its name, else its
//! reference id (`ref0001`, …).

use std::collections::{HashMap, HashSet};

use context_export_types::{Node, NodeKind};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{RenderError, Result};
use crate::escape::sanitize_label;
use crate::format::fill;

/// Marker format used by code blocks that do not set `label-format`.
pub const DEFAULT_LABEL_FORMAT: &str = "(ref:%s)";

/// Math environments that get an `eq:` label.
const MATH_ENVIRONMENTS: [&str; 12] = [
    "equation",
    "align",
    "alignat",
    "flalign",
    "gather",
    "multline",
    "eqnarray",
    "displaymath",
    "math",
    "dmath",
    "dgroup",
    "darray",
];

static BEGIN_ENVIRONMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\\begin\{([A-Za-z]+)(\*?)\}").expect("valid environment regex"));

static END_ENVIRONMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\end\{[A-Za-z]+\*?\}\s*$").expect("valid environment regex"));

/// The environment a math-environment node opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MathEnvironment {
    /// Lower-cased environment name, without the star.
    pub name: String,
    pub numbered: bool,
}

impl MathEnvironment {
    /// Recognize a `\begin{…}` line from the fixed environment set.
    pub fn parse(value: &str) -> Option<Self> {
        let captures = BEGIN_ENVIRONMENT.captures(value)?;
        let name = captures.get(1)?.as_str().to_lowercase();
        if !MATH_ENVIRONMENTS.contains(&name.as_str()) {
            return None;
        }
        let starred = captures.get(2).is_some_and(|m| !m.as_str().is_empty());
        let numbered = !starred && name != "displaymath" && name != "math";
        Some(Self { name, numbered })
    }

    /// The environment body, without its `\begin` and `\end` lines.
    pub fn inner(value: &str) -> &str {
        let start = BEGIN_ENVIRONMENT.find(value).map_or(0, |m| m.end());
        let body = &value[start..];
        let end = END_ENVIRONMENT.find(body).map_or(body.len(), |m| m.start());
        &body[..end]
    }

    /// Environments whose rows are separated by `\\` and columns by `&`.
    pub fn is_aligned(&self) -> bool {
        matches!(
            self.name.as_str(),
            "align" | "alignat" | "flalign" | "eqnarray" | "darray"
        )
    }
}

/// A paragraph whose only content is one image.
pub fn is_figure_paragraph(node: &Node) -> bool {
    if node.kind != NodeKind::Paragraph {
        return false;
    }
    let mut content = node
        .children
        .iter()
        .filter(|child| !(child.kind == NodeKind::PlainText && child.value().trim().is_empty()));
    matches!(
        (content.next(), content.next()),
        (Some(child), None) if child.kind == NodeKind::Image
    )
}

/// Label prefix for a node; depends only on its kind and content.
pub fn label_prefix(node: &Node) -> &'static str {
    match node.kind {
        NodeKind::Heading => "sec:",
        NodeKind::Table => "tab:",
        NodeKind::MathEnvironment if MathEnvironment::parse(node.value()).is_some() => "eq:",
        NodeKind::Paragraph if node.caption.is_some() && is_figure_paragraph(node) => "fig:",
        _ => "",
    }
}

/// Link types resolved inside the document.
pub fn is_internal_link(link_type: &str) -> bool {
    matches!(link_type, "fuzzy" | "custom-id" | "id" | "radio")
}

/// A resolved code-line reference.
#[derive(Debug, Clone, Copy)]
pub struct CodeRef<'a> {
    pub block: &'a Node,
    /// Zero-based line index in the block's value.
    pub line: usize,
}

impl CodeRef<'_> {
    /// Line number as printed, honouring `number-start`.
    pub fn line_number(&self) -> i64 {
        self.block.number_property("number-start").unwrap_or(1) + self.line as i64
    }
}

/// Marker for `label` in a block with the given `label-format`.
pub fn coderef_marker(block: &Node, label: &str) -> String {
    fill(label_format(block), label)
}

fn label_format(block: &Node) -> &str {
    block
        .text_property("label-format")
        .filter(|format| format.contains("%s"))
        .unwrap_or(DEFAULT_LABEL_FORMAT)
}

/// Pattern matching any marker of a block's label format at the end of a
/// line, with the preceding whitespace.
pub fn coderef_pattern(block: &Node) -> Option<Regex> {
    let format = label_format(block);
    let (before, after) = format.split_once("%s")?;
    let pattern = format!(
        r"\s*{}([-\w ]+){}\s*$",
        regex::escape(before),
        regex::escape(after)
    );
    Regex::new(&pattern).ok()
}

fn find_marker(block: &Node, label: &str) -> Option<usize> {
    let marker = coderef_marker(block, label);
    block
        .value()
        .lines()
        .position(|line| line.trim_end().ends_with(&marker))
}

/// Per-pass reference state and lookup indices.
#[derive(Default)]
pub struct ReferenceRegistry<'a> {
    ids: HashMap<*const Node, String>,
    counter: usize,
    custom_ids: HashMap<&'a str, &'a Node>,
    id_properties: HashMap<&'a str, &'a Node>,
    names: HashMap<&'a str, &'a Node>,
    targets: HashMap<String, &'a Node>,
    radio_targets: HashMap<String, &'a Node>,
    headings: Vec<(String, &'a Node)>,
    footnotes: HashMap<&'a str, &'a Node>,
    code_blocks: Vec<&'a Node>,
    link_targets: HashSet<*const Node>,
}

impl<'a> ReferenceRegistry<'a> {
    /// Index `root`. First occurrences win on duplicate keys.
    pub fn build(root: &'a Node) -> Self {
        let mut registry = Self::default();
        let mut links = Vec::new();

        root.walk(&mut |node: &'a Node| {
            if let Some(id) = node.custom_id.as_deref() {
                registry.custom_ids.entry(id).or_insert(node);
            }
            if let Some(name) = node.name.as_deref() {
                registry.names.entry(name).or_insert(node);
            }
            match node.kind {
                NodeKind::Heading => {
                    if let Some(id) = node.text_property("ID") {
                        registry.id_properties.entry(id).or_insert(node);
                    }
                    registry.headings.push((node.title_text(), node));
                }
                NodeKind::Target => {
                    registry
                        .targets
                        .entry(node.value().trim().to_string())
                        .or_insert(node);
                }
                NodeKind::RadioTarget => {
                    registry
                        .radio_targets
                        .entry(node.value().trim().to_lowercase())
                        .or_insert(node);
                }
                NodeKind::FootnoteDefinition => {
                    if let Some(label) = node.text_property("label") {
                        registry.footnotes.entry(label).or_insert(node);
                    }
                }
                NodeKind::CodeBlock => registry.code_blocks.push(node),
                NodeKind::Link => links.push(node),
                _ => {}
            }
        });

        // Targets must know they are targets before they are rendered, and
        // post-order rendering may reach them before the link.
        for link in links {
            let link_type = link.text_property("type").unwrap_or("fuzzy");
            if !is_internal_link(link_type) {
                continue;
            }
            let path = link.text_property("path").unwrap_or("");
            if let Ok(target) = registry.resolve(link_type, path) {
                registry.link_targets.insert(target as *const Node);
            }
        }

        tracing::debug!(
            headings = registry.headings.len(),
            targets = registry.targets.len(),
            code_blocks = registry.code_blocks.len(),
            "Built reference registry"
        );
        registry
    }

    /// Reference id of `node`, allocated on first request.
    pub fn get_reference(&mut self, node: &Node) -> String {
        let key = node as *const Node;
        if let Some(id) = self.ids.get(&key) {
            return id.clone();
        }
        self.counter += 1;
        let id = format!("ref{:04}", self.counter);
        self.ids.insert(key, id.clone());
        id
    }

    /// Label of `node`, if it has one.
    ///
    /// Without an explicit custom id, name or caption only `force` (or
    /// being the target of a link) produces a label.
    pub fn get_label(&mut self, node: &Node, force: bool) -> Option<String> {
        let body = match (node.custom_id.as_deref(), node.name.as_deref()) {
            (Some(id), _) => id.to_string(),
            (None, Some(name)) => name.to_string(),
            (None, None) if force || node.caption.is_some() || self.is_link_target(node) => {
                self.get_reference(node)
            }
            (None, None) => return None,
        };
        Some(sanitize_label(&format!("{}{}", label_prefix(node), body)))
    }

    /// Whether some internal link points at `node`.
    pub fn is_link_target(&self, node: &Node) -> bool {
        self.link_targets.contains(&(node as *const Node))
    }

    /// Resolve an internal link.
    pub fn resolve(&self, link_type: &str, path: &str) -> Result<&'a Node> {
        let found = match link_type {
            "custom-id" => self.custom_ids.get(path.trim_start_matches('#')).copied(),
            "id" => self
                .id_properties
                .get(path)
                .or_else(|| self.custom_ids.get(path))
                .copied(),
            "radio" => self.radio_targets.get(&path.trim().to_lowercase()).copied(),
            _ => self.resolve_fuzzy(path),
        };
        found.ok_or_else(|| RenderError::reference(link_type, path))
    }

    /// `*Title` searches headings only; anything else tries targets, then
    /// named elements, then heading titles.
    fn resolve_fuzzy(&self, path: &str) -> Option<&'a Node> {
        if let Some(title) = path.strip_prefix('*') {
            return self.heading_titled(title);
        }
        let path = path.trim();
        self.targets
            .get(path)
            .or_else(|| self.names.get(path))
            .copied()
            .or_else(|| self.heading_titled(path))
    }

    fn heading_titled(&self, title: &str) -> Option<&'a Node> {
        let title = title.trim();
        self.headings
            .iter()
            .find(|(text, _)| text == title)
            .map(|(_, node)| *node)
    }

    /// Radio target whose text matches, case-insensitively.
    pub fn radio_target(&self, text: &str) -> Option<&'a Node> {
        self.radio_targets.get(&text.trim().to_lowercase()).copied()
    }

    pub fn footnote(&self, label: &str) -> Result<&'a Node> {
        self.footnotes
            .get(label)
            .copied()
            .ok_or_else(|| RenderError::reference("footnote", label))
    }

    /// Find the code block line carrying the marker for `label`.
    pub fn coderef(&self, label: &str) -> Result<CodeRef<'a>> {
        self.code_blocks
            .iter()
            .find_map(|&block| find_marker(block, label).map(|line| CodeRef { block, line }))
            .ok_or_else(|| RenderError::coderef(label))
    }
}

/// Check that every label a code block declares in `coderefs` has a
/// marker in its text.
pub fn check_declared_coderefs(block: &Node) -> Result<()> {
    for label in block.list_property("coderefs") {
        if find_marker(block, label).is_none() {
            return Err(RenderError::coderef(label));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn math_env(value: &str) -> Node {
        Node::new(NodeKind::MathEnvironment).with_property("value", value)
    }

    #[test]
    fn test_reference_is_stable_per_node() {
        let a = Node::paragraph("a");
        let b = Node::paragraph("b");
        let mut registry = ReferenceRegistry::default();
        let first = registry.get_reference(&a);
        assert_eq!(first, "ref0001");
        assert_eq!(registry.get_reference(&b), "ref0002");
        assert_eq!(registry.get_reference(&a), first);
    }

    #[test]
    fn test_label_requires_identity_or_force() {
        let mut registry = ReferenceRegistry::default();
        let plain = Node::heading(1, "Intro");
        assert_eq!(registry.get_label(&plain, false), None);
        assert_eq!(registry.get_label(&plain, true).as_deref(), Some("sec:ref0001"));

        let named = Node::heading(1, "Intro").with_custom_id("intro");
        assert_eq!(registry.get_label(&named, false).as_deref(), Some("sec:intro"));

        let table = Node::new(NodeKind::Table).with_name("data set");
        assert_eq!(registry.get_label(&table, false).as_deref(), Some("tab:data-set"));
    }

    #[test]
    fn test_math_environment_prefixes() {
        assert_eq!(label_prefix(&math_env("\\begin{align*}\na\n\\end{align*}")), "eq:");
        assert_eq!(label_prefix(&math_env("\\begin{Equation}x\\end{Equation}")), "eq:");
        assert_eq!(label_prefix(&math_env("\\begin{tikzpicture}\\end{tikzpicture}")), "");

        let starred = MathEnvironment::parse("\\begin{equation*}").unwrap();
        assert!(!starred.numbered);
        assert!(!MathEnvironment::parse("\\begin{displaymath}").unwrap().numbered);
        assert!(MathEnvironment::parse("\\begin{gather}").unwrap().numbered);
    }

    #[test]
    fn test_math_environment_inner() {
        let value = "\\begin{align}\na &= b \\\\\nc &= d\n\\end{align}\n";
        assert_eq!(MathEnvironment::inner(value).trim(), "a &= b \\\\\nc &= d");
    }

    #[test]
    fn test_figure_prefix_needs_caption_and_single_image() {
        let image = Node::new(NodeKind::Image).with_property("path", "a.png");
        let bare = Node::new(NodeKind::Paragraph).with_child(image.clone());
        assert_eq!(label_prefix(&bare), "");

        let captioned = bare.clone().with_caption(vec![Node::text("A")]);
        assert_eq!(label_prefix(&captioned), "fig:");

        let mixed = captioned.with_child(Node::text("and text"));
        assert_eq!(label_prefix(&mixed), "");
    }

    #[test]
    fn test_fuzzy_resolution_order() {
        let doc = Node::new(NodeKind::Document)
            .with_child(Node::heading(1, "Results"))
            .with_child(
                Node::new(NodeKind::Paragraph)
                    .with_child(Node::new(NodeKind::Target).with_property("value", "Results")),
            );
        let registry = ReferenceRegistry::build(&doc);

        let target = registry.resolve("fuzzy", "Results").unwrap();
        assert_eq!(target.kind, NodeKind::Target);
        let heading = registry.resolve("fuzzy", "*Results").unwrap();
        assert_eq!(heading.kind, NodeKind::Heading);

        let err = registry.resolve("fuzzy", "Missing").unwrap_err();
        assert_eq!(err, RenderError::reference("fuzzy", "Missing"));
    }

    #[test]
    fn test_link_targets_are_recorded() {
        let doc = Node::new(NodeKind::Document)
            .with_child(Node::heading(1, "Intro"))
            .with_child(Node::heading(1, "Other"))
            .with_child(
                Node::new(NodeKind::Paragraph).with_child(
                    Node::new(NodeKind::Link)
                        .with_property("type", "fuzzy")
                        .with_property("path", "*Intro"),
                ),
            );
        let registry = ReferenceRegistry::build(&doc);
        assert!(registry.is_link_target(&doc.children[0]));
        assert!(!registry.is_link_target(&doc.children[1]));
    }

    #[test]
    fn test_coderef_lookup_and_line_number() {
        let block = Node::new(NodeKind::CodeBlock)
            .with_property("value", "let a = 1;\nlet b = a; (ref:use)\n")
            .with_property("number-start", 10_i64);
        let doc = Node::new(NodeKind::Document).with_child(block);
        let registry = ReferenceRegistry::build(&doc);

        let coderef = registry.coderef("use").unwrap();
        assert_eq!(coderef.line, 1);
        assert_eq!(coderef.line_number(), 11);
        assert_eq!(
            registry.coderef("nope").unwrap_err(),
            RenderError::coderef("nope")
        );
    }

    #[test]
    fn test_declared_coderefs_must_exist() {
        let block = Node::new(NodeKind::CodeBlock)
            .with_property("value", "x <<loop>>\n")
            .with_property("label-format", "<<%s>>")
            .with_property("coderefs", vec!["loop".to_string()]);
        assert!(check_declared_coderefs(&block).is_ok());

        let missing = block.with_property("coderefs", vec!["gone".to_string()]);
        assert_eq!(
            check_declared_coderefs(&missing).unwrap_err(),
            RenderError::coderef("gone")
        );
    }

    #[test]
    fn test_coderef_pattern_strips_marker() {
        let block = Node::new(NodeKind::CodeBlock);
        let pattern = coderef_pattern(&block).unwrap();
        assert_eq!(pattern.replace("x = 1;   (ref:init)", ""), "x = 1;");
    }
}
