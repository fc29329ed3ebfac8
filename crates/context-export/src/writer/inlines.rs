/*
 * writer/inlines.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Object handlers.

use context_export_types::{Node, NodeKind};

use super::{Contents, render_nodes};
use crate::config::RenderConfig;
use crate::context::RenderContext;
use crate::error::{Result, WarningKind};
use crate::escape::{escape_text, escape_url, escape_with_special_strings, sanitize_label};
use crate::format::{fill, format_options};
use crate::quotes::apply_smart_quotes;
use crate::references::{MathEnvironment, is_figure_paragraph, is_internal_link};

const IMAGE_EXTENSIONS: [&str; 10] = [
    "png", "jpg", "jpeg", "gif", "svg", "pdf", "eps", "tif", "tiff", "webp",
];

pub(super) fn markup(template: &str, contents: &Contents) -> String {
    fill(template, &contents.text)
}

pub(super) fn plain_text(node: &Node, ctx: &mut RenderContext<'_>) -> String {
    let config = ctx.config;
    let value = node.value();
    let escape: fn(&str) -> String = if config.with_special_strings {
        escape_with_special_strings
    } else {
        escape_text
    };
    if !config.with_smart_quotes || !value.contains(['"', '\'']) {
        return escape(value);
    }
    match apply_smart_quotes(value, &ctx.quote_style(), escape) {
        Ok(text) => text,
        Err(mismatch) => {
            ctx.warn(
                WarningKind::QuoteMismatch,
                format!(
                    "Unbalanced quotes at byte {} in: {}",
                    mismatch.position, value
                ),
            );
            escape(value)
        }
    }
}

pub(super) fn timestamp(node: &Node, ctx: &RenderContext<'_>) -> String {
    let raw = node.text_property("raw-value").unwrap_or("");
    fill(&ctx.config.markup.timestamp, &escape_text(raw))
}

pub(super) fn image(node: &Node) -> String {
    let dimension = |key: &str| {
        node.text_property(key)
            .map(str::to_string)
            .or_else(|| node.number_property(key).map(|n| n.to_string()))
            .unwrap_or_default()
    };
    let options = format_options(
        [("width", dimension("width")), ("height", dimension("height"))],
        true,
    );
    format!(
        "\\externalfigure[{}]{}",
        node.text_property("path").unwrap_or(""),
        options
    )
}

pub(super) fn target<'a>(node: &'a Node, ctx: &mut RenderContext<'a>) -> String {
    let label = ctx.refs.get_label(node, true).unwrap_or_default();
    format!("\\pagereference[{}]", label)
}

// ============================================================================
// Links
// ============================================================================

pub(super) fn link<'a>(
    node: &'a Node,
    contents: &Contents,
    ctx: &mut RenderContext<'a>,
) -> Result<String> {
    let link_type = node.text_property("type").unwrap_or("fuzzy");
    let path = node.text_property("path").unwrap_or("");
    let description = contents.text.trim();

    if link_type == "coderef" {
        let coderef = ctx.refs.coderef(path)?;
        let value = if coderef.block.flag("number-lines") {
            coderef.line_number().to_string()
        } else {
            escape_text(path)
        };
        // A `%s` in the description stands for the line; it was escaped
        // along with the rest of the text.
        return Ok(if description.is_empty() {
            value
        } else {
            description.replace("\\%s", &value)
        });
    }

    if is_internal_link(link_type) {
        let target = ctx.refs.resolve(link_type, path)?;
        let label = ctx.refs.get_label(target, true).unwrap_or_default();
        if !description.is_empty() {
            return Ok(format!("\\goto{{{}}}[{}]", description, label));
        }
        if is_numbered(target, ctx.config) {
            return Ok(format!("\\in[{}]", label));
        }
        let text = match target.kind {
            NodeKind::Heading => target.title_text(),
            NodeKind::Target | NodeKind::RadioTarget => target.value().to_string(),
            _ => path.to_string(),
        };
        return Ok(format!("\\goto{{{}}}[{}]", escape_text(&text), label));
    }

    if description.is_empty() && matches!(link_type, "file" | "") && is_image_path(path) {
        return Ok(format!("\\externalfigure[{}]", path));
    }

    let url = escape_url(&full_url(link_type, path));
    Ok(if description.is_empty() {
        format!("\\hyphenatedurl{{{}}}", url)
    } else {
        format!("\\goto{{{}}}[url({})]", description, url)
    })
}

/// Targets that ConTeXt numbers, so `\in` prints something.
fn is_numbered(target: &Node, config: &RenderConfig) -> bool {
    match target.kind {
        NodeKind::Heading => {
            !target.flag("unnumbered") && config.sections.command(target.level(), true).is_some()
        }
        // Link targets always get a label, hence a float.
        NodeKind::Table | NodeKind::CodeBlock => true,
        NodeKind::Paragraph => is_figure_paragraph(target),
        NodeKind::MathEnvironment => {
            MathEnvironment::parse(target.value()).is_some_and(|env| env.numbered)
        }
        _ => false,
    }
}

fn is_image_path(path: &str) -> bool {
    path.rsplit_once('.').is_some_and(|(_, extension)| {
        IMAGE_EXTENSIONS.contains(&extension.to_lowercase().as_str())
    })
}

fn full_url(link_type: &str, path: &str) -> String {
    if link_type.is_empty() || path.contains("://") {
        path.to_string()
    } else {
        format!("{}:{}", link_type, path)
    }
}

// ============================================================================
// Footnotes
// ============================================================================

pub(super) fn footnote_reference<'a>(
    node: &'a Node,
    contents: &Contents,
    ctx: &mut RenderContext<'a>,
) -> Result<String> {
    ctx.counters.footnotes += 1;
    let label = node.text_property("label").unwrap_or("");
    if !node.children.is_empty() || label.is_empty() {
        return Ok(format!("\\footnote{{{}}}", contents.text.trim()));
    }

    let definition = ctx.refs.footnote(label)?;
    let reference = sanitize_label(&format!("fn:{}", label));
    // Marked before rendering, so a definition citing itself cannot recurse.
    if !ctx.first_footnote_use(label) {
        return Ok(format!("\\note[{}]", reference));
    }
    let body = render_nodes(&definition.children, ctx)?;
    Ok(format!("\\footnote[{}]{{{}}}", reference, body.trim()))
}

// ============================================================================
// Math
// ============================================================================

/// Split inline math into (display, body).
fn split_math(value: &str) -> Option<(bool, &str)> {
    let value = value.trim();
    if let Some(inner) = delimited(value, "\\(", "\\)") {
        Some((false, inner))
    } else if let Some(inner) = delimited(value, "\\[", "\\]") {
        Some((true, inner))
    } else if let Some(inner) = delimited(value, "$$", "$$") {
        Some((true, inner))
    } else {
        delimited(value, "$", "$").map(|inner| (false, inner))
    }
}

fn delimited<'v>(value: &'v str, open: &str, close: &str) -> Option<&'v str> {
    value
        .strip_prefix(open)
        .and_then(|rest| rest.strip_suffix(close))
}

pub(super) fn inline_math(node: &Node) -> String {
    match split_math(node.value()) {
        Some((false, inner)) => format!("\\m{{{}}}", inner),
        Some((true, inner)) => format!("\\startformula {} \\stopformula", inner.trim()),
        None => node.value().to_string(),
    }
}

pub(super) fn math_run(node: &Node) -> String {
    format!("\\m{{{}}}", math_form_of_all(&node.children))
}

/// Form of a math-run member inside `\m{…}`.
fn math_form(node: &Node) -> String {
    match node.kind {
        NodeKind::InlineMath => split_math(node.value())
            .map_or(node.value(), |(_, inner)| inner)
            .to_string(),
        NodeKind::Subscript => format!("_{{{}}}", math_form_of_all(&node.children)),
        NodeKind::Superscript => format!("^{{{}}}", math_form_of_all(&node.children)),
        NodeKind::Entity => entity_latex(node),
        NodeKind::PlainText => node.value().to_string(),
        _ => math_form_of_all(&node.children),
    }
}

fn math_form_of_all(nodes: &[Node]) -> String {
    nodes.iter().map(math_form).collect()
}

fn entity_latex(node: &Node) -> String {
    node.text_property("latex")
        .map(str::to_string)
        .unwrap_or_else(|| format!("\\{}", node.text_property("name").unwrap_or("")))
}

pub(super) fn entity(node: &Node) -> String {
    if node.flag("math") {
        return format!("\\m{{{}}}", entity_latex(node));
    }
    match node.text_property("utf8").filter(|utf8| !utf8.is_empty()) {
        Some(utf8) => utf8.to_string(),
        None => escape_text(node.text_property("name").unwrap_or("")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;
    use crate::writer::render;
    use pretty_assertions::assert_eq;

    fn paragraph_of(children: Vec<Node>) -> Node {
        Node::new(NodeKind::Document).with_child(Node::new(NodeKind::Paragraph).with_children(children))
    }

    fn render_doc(doc: &Node) -> Result<String> {
        let config = RenderConfig::default();
        let mut ctx = RenderContext::new(doc, &config);
        Ok(render(doc, &mut ctx)?.unwrap_or_default())
    }

    fn link(link_type: &str, path: &str) -> Node {
        Node::new(NodeKind::Link)
            .with_property("type", link_type)
            .with_property("path", path)
    }

    #[test]
    fn test_external_links() {
        let doc = paragraph_of(vec![
            link("https", "//example.com/a_b").with_post_blank(1),
            link("https", "//example.com").with_child(Node::text("site")),
        ]);
        assert_eq!(
            render_doc(&doc).unwrap(),
            "\\hyphenatedurl{https://example.com/a_b} \\goto{site}[url(https://example.com)]\n"
        );
    }

    #[test]
    fn test_image_link_without_description() {
        let doc = paragraph_of(vec![link("file", "plots/fig.PNG")]);
        assert_eq!(render_doc(&doc).unwrap(), "\\externalfigure[plots/fig.PNG]\n");
    }

    #[test]
    fn test_link_to_numbered_heading_uses_in() {
        let doc = Node::new(NodeKind::Document)
            .with_child(Node::heading(1, "Intro").with_custom_id("intro"))
            .with_child(Node::new(NodeKind::Paragraph).with_children([
                Node::text("See").with_post_blank(1),
                link("custom-id", "#intro"),
            ]));
        let out = render_doc(&doc).unwrap();
        assert!(out.contains("reference={sec:intro}"));
        assert!(out.ends_with("See \\in[sec:intro]\n"));
    }

    #[test]
    fn test_link_to_target_uses_goto() {
        let doc = paragraph_of(vec![
            Node::new(NodeKind::Target).with_property("value", "here"),
            Node::text("x").with_post_blank(1),
            link("fuzzy", "here"),
        ]);
        assert_eq!(
            render_doc(&doc).unwrap(),
            "\\pagereference[ref0001]x \\goto{here}[ref0001]\n"
        );
    }

    #[test]
    fn test_unresolved_link_is_fatal() {
        let doc = paragraph_of(vec![link("fuzzy", "nowhere")]);
        assert_eq!(
            render_doc(&doc).unwrap_err(),
            RenderError::reference("fuzzy", "nowhere")
        );
    }

    #[test]
    fn test_coderef_link() {
        let block = Node::new(NodeKind::CodeBlock)
            .with_property("value", "a\nb (ref:two)\n")
            .with_property("number-lines", true);
        let doc = Node::new(NodeKind::Document)
            .with_child(block)
            .with_child(Node::new(NodeKind::Paragraph).with_children([
                link("coderef", "two").with_child(Node::text("line %s")),
            ]));
        let out = render_doc(&doc).unwrap();
        assert!(out.ends_with("line 2\n"));
    }

    #[test]
    fn test_footnote_first_and_later_use() {
        let reference = || Node::new(NodeKind::FootnoteReference).with_property("label", "1");
        let doc = Node::new(NodeKind::Document)
            .with_child(Node::new(NodeKind::Paragraph).with_children([
                Node::text("a"),
                reference(),
                Node::text("b"),
                reference(),
            ]))
            .with_child(
                Node::new(NodeKind::FootnoteDefinition)
                    .with_property("label", "1")
                    .with_child(Node::paragraph("Note.")),
            );
        assert_eq!(
            render_doc(&doc).unwrap(),
            "a\\footnote[fn:1]{Note.}b\\note[fn:1]\n"
        );
    }

    #[test]
    fn test_inline_footnote() {
        let doc = paragraph_of(vec![
            Node::new(NodeKind::FootnoteReference).with_child(Node::text("inline")),
        ]);
        assert_eq!(render_doc(&doc).unwrap(), "\\footnote{inline}\n");
    }

    #[test]
    fn test_missing_footnote_definition() {
        let doc = paragraph_of(vec![
            Node::new(NodeKind::FootnoteReference).with_property("label", "9"),
        ]);
        assert_eq!(
            render_doc(&doc).unwrap_err(),
            RenderError::reference("footnote", "9")
        );
    }

    #[test]
    fn test_unbalanced_quotes_fall_back_with_warning() {
        let doc = paragraph_of(vec![Node::text("\"a' b")]);
        let config = RenderConfig::default();
        let mut ctx = RenderContext::new(&doc, &config);
        let out = render(&doc, &mut ctx).unwrap().unwrap();
        assert_eq!(out, "\"a' b\n");
        assert_eq!(ctx.warnings.len(), 1);
        assert_eq!(ctx.warnings[0].kind, WarningKind::QuoteMismatch);
    }

    #[test]
    fn test_math_forms() {
        let math = |value: &str| Node::new(NodeKind::InlineMath).with_property("value", value);
        assert_eq!(inline_math(&math("$x^2$")), "\\m{x^2}");
        assert_eq!(inline_math(&math("\\[ y \\]")), "\\startformula y \\stopformula");

        let run = Node::new(NodeKind::MathRun).with_children([
            math("$x$"),
            Node::new(NodeKind::Subscript).with_child(Node::text("i")),
            Node::new(NodeKind::Entity)
                .with_property("name", "alpha")
                .with_property("math", true),
        ]);
        assert_eq!(math_run(&run), "\\m{x_{i}\\alpha}");
    }

    #[test]
    fn test_entities() {
        let entity_node = Node::new(NodeKind::Entity)
            .with_property("name", "eacute")
            .with_property("utf8", "é");
        assert_eq!(entity(&entity_node), "é");
        let math_entity = Node::new(NodeKind::Entity)
            .with_property("latex", "\\rightarrow")
            .with_property("math", true);
        assert_eq!(entity(&math_entity), "\\m{\\rightarrow}");
    }

    #[test]
    fn test_image_dimensions() {
        let img = Node::new(NodeKind::Image)
            .with_property("path", "a.pdf")
            .with_property("width", "5cm");
        assert_eq!(image(&img), "\\externalfigure[a.pdf][width={5cm}]");
    }
}
