/*
 * writer/mod.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! ConTeXt writer for document trees.
//!
//! Rendering is strictly post-order: a node's children are rendered, in
//! source order, before the node's own handler runs. The handler receives
//! the per-child outputs as [`Contents`] and may use, reorder or drop them.
//!
//! # Design decisions
//!
//! - A handler returning `None` contributes nothing, not even the node's
//!   trailing blanks
//! - Trailing blanks are spaces after objects and newlines after elements
//! - Footnote definitions are skipped entirely; their contents are rendered
//!   at the first reference
//! - The tree is never mutated; all state lives in [`RenderContext`]

mod blocks;
mod inlines;
mod tables;

use context_export_types::{Node, NodeKind};

use crate::context::RenderContext;
use crate::error::Result;

/// Rendered children of a node.
#[derive(Debug, Clone, Default)]
pub struct Contents {
    /// One entry per child, `None` where the child rendered nothing.
    pub parts: Vec<Option<String>>,
    /// Concatenation of all rendered children.
    pub text: String,
}

impl Contents {
    fn new(parts: Vec<Option<String>>) -> Self {
        let text = parts.iter().flatten().map(String::as_str).collect();
        Self { parts, text }
    }
}

/// Render `node` and its subtree.
pub fn render<'a>(node: &'a Node, ctx: &mut RenderContext<'a>) -> Result<Option<String>> {
    if matches!(
        node.kind,
        NodeKind::FootnoteDefinition | NodeKind::PropertyDrawer
    ) {
        return Ok(None);
    }

    ctx.push_ancestor(node);
    let children: Result<Vec<Option<String>>> =
        node.children.iter().map(|child| render(child, ctx)).collect();
    ctx.pop_ancestor();
    let contents = Contents::new(children?);
    let config = ctx.config;

    let output = match node.kind {
        NodeKind::Document | NodeKind::Section => Some(contents.text),
        NodeKind::Heading => blocks::heading(node, &contents, ctx)?,
        NodeKind::Paragraph => blocks::paragraph(node, &contents, ctx)?,
        NodeKind::PlainList => blocks::plain_list(node, &contents, ctx),
        NodeKind::Item => blocks::item(node, &contents, ctx)?,
        NodeKind::Table => tables::table(node, &contents, ctx)?,
        NodeKind::TableRow => tables::row(node, &contents, ctx),
        NodeKind::TableCell => tables::cell(node, &contents, ctx),
        NodeKind::QuoteBlock => Some(blocks::environment(
            &config.environments.quote,
            "",
            &contents.text,
        )),
        NodeKind::CenterBlock => Some(blocks::environment(
            "alignment",
            "[middle]",
            &contents.text,
        )),
        NodeKind::SpecialBlock => blocks::special_block(node, &contents),
        NodeKind::ExampleBlock => Some(blocks::verbatim_block(
            &config.environments.example,
            "",
            node.value(),
        )),
        NodeKind::FixedWidth => Some(blocks::verbatim_block(
            &config.environments.fixed_width,
            "",
            node.value(),
        )),
        NodeKind::VerseBlock => Some(blocks::environment(
            &config.environments.verse,
            "",
            &contents.text,
        )),
        NodeKind::CodeBlock => Some(blocks::code_block(node, ctx)?),
        NodeKind::HorizontalRule => Some("\\hairline\n".to_string()),
        NodeKind::Keyword => blocks::keyword(node),
        NodeKind::RawBlock => raw(node).map(|value| terminate(value.to_string())),
        NodeKind::MathEnvironment => Some(blocks::math_environment(node, ctx)),
        NodeKind::Drawer => config.with_drawers.then_some(contents.text),
        NodeKind::Planning => blocks::planning(node, ctx),
        // Short-circuited above.
        NodeKind::FootnoteDefinition | NodeKind::PropertyDrawer => None,

        NodeKind::Bold => Some(inlines::markup(&config.markup.bold, &contents)),
        NodeKind::Italic => Some(inlines::markup(&config.markup.italic, &contents)),
        NodeKind::Underline => Some(inlines::markup(&config.markup.underline, &contents)),
        NodeKind::StrikeThrough => Some(inlines::markup(&config.markup.strike_through, &contents)),
        NodeKind::Subscript => Some(inlines::markup(&config.markup.subscript, &contents)),
        NodeKind::Superscript => Some(inlines::markup(&config.markup.superscript, &contents)),
        NodeKind::Code | NodeKind::Verbatim | NodeKind::InlineCode => {
            Some(crate::escape::verbatim_inline(node.value()))
        }
        NodeKind::Link => Some(inlines::link(node, &contents, ctx)?),
        NodeKind::Image => Some(inlines::image(node)),
        NodeKind::FootnoteReference => Some(inlines::footnote_reference(node, &contents, ctx)?),
        NodeKind::Timestamp => Some(inlines::timestamp(node, ctx)),
        NodeKind::PlainText => Some(inlines::plain_text(node, ctx)),
        NodeKind::InlineMath => Some(inlines::inline_math(node)),
        NodeKind::MathRun => Some(inlines::math_run(node)),
        NodeKind::Entity => Some(inlines::entity(node)),
        NodeKind::LineBreak => Some("\\crlf\n".to_string()),
        NodeKind::Target => Some(inlines::target(node, ctx)),
        NodeKind::RadioTarget => Some(format!("{}{}", inlines::target(node, ctx), contents.text)),
        NodeKind::RawInline => raw(node).map(str::to_string),
        NodeKind::StatisticsCookie => Some(crate::escape::escape_text(node.value())),
    };

    Ok(output.map(|text| append_blanks(node, text)))
}

/// Render a list of nodes that are not children of the node being
/// rendered (titles, captions, footnote definitions) and concatenate them.
pub fn render_nodes<'a>(nodes: &'a [Node], ctx: &mut RenderContext<'a>) -> Result<String> {
    let mut out = String::new();
    for node in nodes {
        if let Some(text) = render(node, ctx)? {
            out.push_str(&text);
        }
    }
    Ok(out)
}

/// Rendered caption of `node`, or the empty string.
fn caption<'a>(node: &'a Node, ctx: &mut RenderContext<'a>) -> Result<String> {
    match &node.caption {
        Some(caption) => Ok(render_nodes(caption, ctx)?.trim().to_string()),
        None => Ok(String::new()),
    }
}

fn append_blanks(node: &Node, mut text: String) -> String {
    let blank = if node.kind.is_inline() { ' ' } else { '\n' };
    text.extend(std::iter::repeat_n(blank, node.post_blank));
    text
}

/// Value of a raw node meant for this backend.
fn raw(node: &Node) -> Option<&str> {
    node.text_property("backend")
        .is_some_and(|backend| backend.eq_ignore_ascii_case("context"))
        .then(|| node.value())
}

/// Make sure block output ends with a newline.
fn terminate(mut text: String) -> String {
    if !text.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }
    text
}
