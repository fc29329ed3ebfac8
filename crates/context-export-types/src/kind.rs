/*
 * kind.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The closed set of node kinds.
//!
//! Each variant documents the properties the renderer reads from it.
//! Properties not listed are carried along but ignored.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    // ------------------------------------------------------------------
    // Elements
    // ------------------------------------------------------------------
    /// Root. Metadata properties: `title`, `subtitle`, `author`, `email`,
    /// `date`, `description`, `keywords`, `subject`, `language`. Metadata
    /// keywords stand in for missing properties.
    Document,
    /// Contents of a heading before its first sub-heading.
    Section,
    /// `level` (number), `todo`, `priority`, `tags` (list), `zone`,
    /// `unnumbered` (flag), `alt-title`, `ID`. The title lives in
    /// [`Node::title`](crate::Node::title).
    Heading,
    Paragraph,
    /// `type`: `ordered`, `unordered` or `descriptive`.
    PlainList,
    /// `checkbox`: `on`, `off` or `trans`. Descriptive items keep their
    /// term in [`Node::title`](crate::Node::title).
    Item,
    /// `header` (`no`/`nil` disables, `repeat` repeats it on every page; split
    /// tables always repeat it), `footer`, `style`, `split` (flag),
    /// `location`, `style-<role>` per-position overrides.
    Table,
    /// `type`: `standard` (default), `rule` or `colgroup`.
    TableRow,
    /// `width` (number, in em), `align` (`left`, `right`, `center`),
    /// `span` (number of columns).
    TableCell,
    QuoteBlock,
    CenterBlock,
    /// `type`: environment name.
    SpecialBlock,
    /// `value`.
    ExampleBlock,
    /// `value`, `language`, `number-lines` (flag), `number-start` (number),
    /// `retain-labels` (flag), `label-format` (defaults to `(ref:%s)`),
    /// `coderefs` (list of labels the block must define).
    CodeBlock,
    VerseBlock,
    /// `value`.
    FixedWidth,
    HorizontalRule,
    /// `key`, `value`.
    Keyword,
    /// `backend`, `value`.
    RawBlock,
    /// `value`, including the `\begin{…}` / `\end{…}` lines.
    MathEnvironment,
    /// `drawer-name`.
    Drawer,
    PropertyDrawer,
    /// `closed`, `deadline`, `scheduled` (raw timestamps).
    Planning,
    /// `label`.
    FootnoteDefinition,

    // ------------------------------------------------------------------
    // Objects
    // ------------------------------------------------------------------
    Bold,
    Italic,
    Underline,
    StrikeThrough,
    /// `value`.
    Code,
    /// `value`.
    Verbatim,
    Subscript,
    Superscript,
    /// `type` (`fuzzy`, `custom-id`, `id`, `radio`, `coderef`, `file`,
    /// `http`, `https`, `ftp`, `mailto`, …), `path`. Children are the
    /// description.
    Link,
    /// `path`, `width`, `height`.
    Image,
    /// `label`; inline footnotes carry their definition as children.
    FootnoteReference,
    /// `raw-value`.
    Timestamp,
    /// `value`.
    PlainText,
    /// `value`, with its delimiters (`$…$`, `\(…\)`, `\[…\]`, `$$…$$`).
    InlineMath,
    /// Synthetic container produced by the math-run merging pass.
    MathRun,
    /// `name`, `utf8`, `latex`, `math` (flag).
    Entity,
    LineBreak,
    /// `value`.
    Target,
    /// `value`; children are the visible text.
    RadioTarget,
    /// `backend`, `value`.
    RawInline,
    /// `language`, `value`.
    InlineCode,
    /// `value`.
    StatisticsCookie,
}

impl NodeKind {
    /// Objects live inside paragraphs and other inline containers; their
    /// trailing blanks are spaces rather than blank lines.
    pub fn is_inline(&self) -> bool {
        matches!(
            self,
            NodeKind::Bold
                | NodeKind::Italic
                | NodeKind::Underline
                | NodeKind::StrikeThrough
                | NodeKind::Code
                | NodeKind::Verbatim
                | NodeKind::Subscript
                | NodeKind::Superscript
                | NodeKind::Link
                | NodeKind::Image
                | NodeKind::FootnoteReference
                | NodeKind::Timestamp
                | NodeKind::PlainText
                | NodeKind::InlineMath
                | NodeKind::MathRun
                | NodeKind::Entity
                | NodeKind::LineBreak
                | NodeKind::Target
                | NodeKind::RadioTarget
                | NodeKind::RawInline
                | NodeKind::InlineCode
                | NodeKind::StatisticsCookie
        )
    }

    /// Kebab-case name, as used in serialized trees and diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Document => "document",
            NodeKind::Section => "section",
            NodeKind::Heading => "heading",
            NodeKind::Paragraph => "paragraph",
            NodeKind::PlainList => "plain-list",
            NodeKind::Item => "item",
            NodeKind::Table => "table",
            NodeKind::TableRow => "table-row",
            NodeKind::TableCell => "table-cell",
            NodeKind::QuoteBlock => "quote-block",
            NodeKind::CenterBlock => "center-block",
            NodeKind::SpecialBlock => "special-block",
            NodeKind::ExampleBlock => "example-block",
            NodeKind::CodeBlock => "code-block",
            NodeKind::VerseBlock => "verse-block",
            NodeKind::FixedWidth => "fixed-width",
            NodeKind::HorizontalRule => "horizontal-rule",
            NodeKind::Keyword => "keyword",
            NodeKind::RawBlock => "raw-block",
            NodeKind::MathEnvironment => "math-environment",
            NodeKind::Drawer => "drawer",
            NodeKind::PropertyDrawer => "property-drawer",
            NodeKind::Planning => "planning",
            NodeKind::FootnoteDefinition => "footnote-definition",
            NodeKind::Bold => "bold",
            NodeKind::Italic => "italic",
            NodeKind::Underline => "underline",
            NodeKind::StrikeThrough => "strike-through",
            NodeKind::Code => "code",
            NodeKind::Verbatim => "verbatim",
            NodeKind::Subscript => "subscript",
            NodeKind::Superscript => "superscript",
            NodeKind::Link => "link",
            NodeKind::Image => "image",
            NodeKind::FootnoteReference => "footnote-reference",
            NodeKind::Timestamp => "timestamp",
            NodeKind::PlainText => "plain-text",
            NodeKind::InlineMath => "inline-math",
            NodeKind::MathRun => "math-run",
            NodeKind::Entity => "entity",
            NodeKind::LineBreak => "line-break",
            NodeKind::Target => "target",
            NodeKind::RadioTarget => "radio-target",
            NodeKind::RawInline => "raw-inline",
            NodeKind::InlineCode => "inline-code",
            NodeKind::StatisticsCookie => "statistics-cookie",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_matches_serde() {
        for kind in [NodeKind::PlainList, NodeKind::MathRun, NodeKind::TableCell] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.name()));
        }
    }

    #[test]
    fn test_inline_classification() {
        assert!(NodeKind::PlainText.is_inline());
        assert!(NodeKind::MathRun.is_inline());
        assert!(!NodeKind::Paragraph.is_inline());
        assert!(!NodeKind::TableCell.is_inline());
    }
}
