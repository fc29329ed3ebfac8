/*
 * context.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Mutable state for a single render pass.
 */

//! Mutable state for a single render pass.
//!
//! The `RenderContext` is created once per [`render_document`] call and
//! threaded through every renderer by `&mut`:
//! - The reference registry (ids, labels, link resolution)
//! - Zone buffers collecting diverted headings
//! - Counters, warnings and per-pass caches
//! - The ancestor stack of the node being rendered
//!
//! [`render_document`]: crate::render::render_document

use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::Rc;

use context_export_types::{Node, Zone};

use crate::config::RenderConfig;
use crate::error::{RenderWarning, WarningKind};
use crate::quotes::QuoteStyle;
use crate::references::ReferenceRegistry;
use crate::table::TableGeometry;

/// Ordered per-zone output buffers.
#[derive(Debug, Clone, Default)]
pub struct ZoneBuffers {
    buffers: BTreeMap<Zone, Vec<String>>,
}

impl ZoneBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append rendered text to `zone`, preserving arrival order.
    pub fn push(&mut self, zone: Zone, text: String) {
        self.buffers.entry(zone).or_default().push(text);
    }

    pub fn entries(&self, zone: Zone) -> &[String] {
        self.buffers.get(&zone).map(Vec::as_slice).unwrap_or_default()
    }

    /// Entries of `zone` separated by a blank line.
    pub fn joined(&self, zone: Zone) -> String {
        self.entries(zone)
            .iter()
            .map(|entry| entry.trim_end())
            .filter(|entry| !entry.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.values().all(Vec::is_empty)
    }
}

/// Running counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct Counters {
    pub footnotes: usize,
    pub listings: usize,
}

pub struct RenderContext<'a> {
    pub config: &'a RenderConfig,

    /// Reference ids, labels and link targets
    pub refs: ReferenceRegistry<'a>,

    /// Text diverted from the body stream
    pub zones: ZoneBuffers,

    /// Non-fatal conditions recovered from
    pub warnings: Vec<RenderWarning>,

    pub counters: Counters,

    /// Document language
    pub language: String,

    language_names: HashMap<String, String>,
    ancestors: Vec<&'a Node>,
    tables: HashMap<*const Node, Rc<TableGeometry>>,
    seen_footnotes: HashSet<String>,
}

impl<'a> RenderContext<'a> {
    /// Create the context for rendering `root`.
    pub fn new(root: &'a Node, config: &'a RenderConfig) -> Self {
        let language = root
            .text_property("language")
            .filter(|language| !language.trim().is_empty())
            .unwrap_or(&config.language)
            .to_string();
        Self {
            config,
            refs: ReferenceRegistry::build(root),
            zones: ZoneBuffers::new(),
            warnings: Vec::new(),
            counters: Counters::default(),
            language,
            language_names: HashMap::new(),
            ancestors: Vec::new(),
            tables: HashMap::new(),
            seen_footnotes: HashSet::new(),
        }
    }

    /// Record a warning and log it.
    pub fn warn(&mut self, kind: WarningKind, message: impl Into<String>) {
        let warning = RenderWarning::new(kind, message);
        tracing::warn!(kind = ?warning.kind, "{}", warning.message);
        self.warnings.push(warning);
    }

    /// Quote delimiters for the document language.
    pub fn quote_style(&self) -> QuoteStyle {
        self.config.quote_style(&self.language)
    }

    /// ConTeXt name for a source language, cached per pass.
    pub fn translate_language(&mut self, name: &str) -> String {
        if let Some(known) = self.language_names.get(name) {
            return known.clone();
        }
        let key = name.to_lowercase();
        let translated = self
            .config
            .languages
            .get(&key)
            .cloned()
            .unwrap_or(key);
        self.language_names
            .insert(name.to_string(), translated.clone());
        translated
    }

    // ------------------------------------------------------------------
    // Ancestors
    // ------------------------------------------------------------------

    pub(crate) fn push_ancestor(&mut self, node: &'a Node) {
        self.ancestors.push(node);
    }

    pub(crate) fn pop_ancestor(&mut self) {
        self.ancestors.pop();
    }

    /// Enclosing node `depth` levels up; `0` is the parent.
    pub fn ancestor(&self, depth: usize) -> Option<&'a Node> {
        self.ancestors
            .len()
            .checked_sub(depth + 1)
            .map(|index| self.ancestors[index])
    }

    pub fn parent(&self) -> Option<&'a Node> {
        self.ancestor(0)
    }

    // ------------------------------------------------------------------
    // Per-pass caches
    // ------------------------------------------------------------------

    /// Layout of `table`, computed on first request.
    pub fn table_geometry(&mut self, table: &Node) -> Rc<TableGeometry> {
        let config = self.config;
        Rc::clone(
            self.tables
                .entry(table as *const Node)
                .or_insert_with(|| Rc::new(TableGeometry::compute(table, &config.table))),
        )
    }

    /// True the first time a footnote label is referenced.
    pub fn first_footnote_use(&mut self, label: &str) -> bool {
        self.seen_footnotes.insert(label.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use context_export_types::NodeKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_zone_buffers_keep_order_and_skip_empty() {
        let mut zones = ZoneBuffers::new();
        zones.push(Zone::Appendix, "first\n".to_string());
        zones.push(Zone::Appendix, String::new());
        zones.push(Zone::Appendix, "second".to_string());
        assert_eq!(zones.joined(Zone::Appendix), "first\n\nsecond");
        assert_eq!(zones.joined(Zone::Index), "");
        assert!(!zones.is_empty());
    }

    #[test]
    fn test_language_translation_is_cached() {
        let root = Node::new(NodeKind::Document);
        let config = RenderConfig::default();
        let mut ctx = RenderContext::new(&root, &config);
        assert_eq!(ctx.translate_language("Emacs-Lisp"), "lisp");
        assert_eq!(ctx.translate_language("Haskell"), "haskell");
        assert_eq!(ctx.translate_language("Emacs-Lisp"), "lisp");
    }

    #[test]
    fn test_document_language_overrides_config() {
        let root = Node::new(NodeKind::Document).with_property("language", "de");
        let config = RenderConfig::default();
        let ctx = RenderContext::new(&root, &config);
        assert_eq!(ctx.language, "de");
    }

    #[test]
    fn test_ancestors() {
        let root = Node::new(NodeKind::Document).with_child(Node::paragraph("x"));
        let config = RenderConfig::default();
        let mut ctx = RenderContext::new(&root, &config);
        ctx.push_ancestor(&root);
        ctx.push_ancestor(&root.children[0]);
        assert_eq!(ctx.parent().map(|n| n.kind), Some(NodeKind::Paragraph));
        assert_eq!(ctx.ancestor(1).map(|n| n.kind), Some(NodeKind::Document));
        assert!(ctx.ancestor(2).is_none());
        ctx.pop_ancestor();
        assert_eq!(ctx.parent().map(|n| n.kind), Some(NodeKind::Document));
    }

    #[test]
    fn test_footnote_first_use() {
        let root = Node::new(NodeKind::Document);
        let config = RenderConfig::default();
        let mut ctx = RenderContext::new(&root, &config);
        assert!(ctx.first_footnote_use("1"));
        assert!(!ctx.first_footnote_use("1"));
    }
}
