/*
 * writer/blocks.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Element handlers.
//!
//! Every handler returns text ending in a newline; the dispatcher adds the
//! element's trailing blank lines.

use context_export_types::{Node, NodeKind, Zone};

use super::{Contents, caption, render_nodes, terminate};
use crate::context::RenderContext;
use crate::error::Result;
use crate::escape::{escape_text, sanitize_command};
use crate::format::{fill, format_options};
use crate::references::{
    MathEnvironment, check_declared_coderefs, coderef_pattern, is_figure_paragraph,
};

/// `\start<name><options>` … `\stop<name>` around `body`.
pub(super) fn environment(name: &str, options: &str, body: &str) -> String {
    let body = body.trim_end();
    if body.is_empty() {
        format!("\\start{name}{options}\n\\stop{name}\n")
    } else {
        format!("\\start{name}{options}\n{body}\n\\stop{name}\n")
    }
}

/// Like [`environment`], for verbatim text whose leading whitespace matters.
pub(super) fn verbatim_block(name: &str, options: &str, value: &str) -> String {
    let value = value.trim_end_matches('\n');
    format!("\\start{name}{options}\n{value}\n\\stop{name}\n")
}

// ============================================================================
// Headings
// ============================================================================

pub(super) fn heading<'a>(
    node: &'a Node,
    contents: &Contents,
    ctx: &mut RenderContext<'a>,
) -> Result<Option<String>> {
    let config = ctx.config;
    let title = decorated_title(node, ctx)?;
    let label = ctx.refs.get_label(node, false);
    let alt = node
        .text_property("alt-title")
        .map(escape_text)
        .unwrap_or_default();
    let numbered = !node.flag("unnumbered");
    let body = contents.text.trim_end();

    let text = match config.sections.command(node.level(), numbered) {
        Some(command) => {
            let options = format_options(
                [
                    ("title", title.as_str()),
                    ("reference", label.as_deref().unwrap_or("")),
                    ("list", alt.as_str()),
                ],
                false,
            );
            environment(command, &options, body)
        }
        // Past the deepest sectioning level headings turn into list entries.
        None => {
            let anchor = label
                .map(|label| format!("\\pagereference[{}]", label))
                .unwrap_or_default();
            let entry = if body.is_empty() {
                format!("\\item {anchor}{title}")
            } else {
                format!("\\item {anchor}{title}\n\n{body}")
            };
            environment(&config.environments.itemize, "", &entry)
        }
    };

    // A zoned heading inside another zoned heading travels with its ancestor.
    let zone = node.zone();
    let nested = (0..)
        .map_while(|depth| ctx.ancestor(depth))
        .any(|ancestor| ancestor.kind == NodeKind::Heading && ancestor.zone() != Zone::Body);
    if zone != Zone::Body && !nested {
        tracing::debug!(zone = %zone, title = %node.title_text(), "Diverting heading");
        ctx.zones.push(zone, text);
        return Ok(None);
    }
    Ok(Some(text))
}

/// The title with its todo keyword, priority cookie and tags, as enabled.
fn decorated_title<'a>(node: &'a Node, ctx: &mut RenderContext<'a>) -> Result<String> {
    let config = ctx.config;
    let title = render_nodes(&node.title, ctx)?;
    let mut parts = Vec::new();

    if config.with_todo_keywords
        && let Some(todo) = node.text_property("todo")
    {
        parts.push(format!("{{\\sansbold {}}}", escape_text(todo)));
    }
    if config.with_priority
        && let Some(priority) = node.text_property("priority")
    {
        parts.push(format!("[\\#{}]", escape_text(priority)));
    }
    parts.push(title.trim().to_string());

    let mut decorated = parts.join(" ");
    let tags = node.list_property("tags");
    if config.with_tags && !tags.is_empty() {
        decorated.push_str(&format!("\\hfill{{}}{{\\tt :{}:}}", escape_text(&tags.join(":"))));
    }
    Ok(decorated)
}

// ============================================================================
// Paragraphs and lists
// ============================================================================

pub(super) fn paragraph<'a>(
    node: &'a Node,
    contents: &Contents,
    ctx: &mut RenderContext<'a>,
) -> Result<Option<String>> {
    let text = format!("{}\n", contents.text.trim_end());
    if !is_figure_paragraph(node) {
        return Ok(Some(text));
    }

    let title = caption(node, ctx)?;
    let label = ctx.refs.get_label(node, false);
    if title.is_empty() && label.is_none() {
        return Ok(Some(text));
    }
    let options = format_options(
        [("title", title), ("reference", label.unwrap_or_default())],
        false,
    );
    Ok(Some(format!(
        "\\startplacefigure{options}\n{text}\\stopplacefigure\n"
    )))
}

pub(super) fn plain_list(node: &Node, contents: &Contents, ctx: &RenderContext<'_>) -> Option<String> {
    let itemize = &ctx.config.environments.itemize;
    match node.text_property("type") {
        // Descriptive items carry their own environment.
        Some("descriptive") => Some(contents.text.clone()),
        Some("ordered") => Some(environment(itemize, "[n]", &contents.text)),
        _ => Some(environment(itemize, "", &contents.text)),
    }
}

pub(super) fn item<'a>(
    node: &'a Node,
    contents: &Contents,
    ctx: &mut RenderContext<'a>,
) -> Result<Option<String>> {
    let body = contents.text.trim_end();
    let descriptive = ctx
        .parent()
        .is_some_and(|list| list.text_property("type") == Some("descriptive"));

    if descriptive {
        let term = render_nodes(&node.title, ctx)?;
        let options = format!("{{{}}}", term.trim());
        return Ok(Some(environment(
            &ctx.config.environments.description,
            &options,
            body,
        )));
    }

    let marker = match node.text_property("checkbox") {
        Some("on") => "\\sym{$\\boxtimes$}",
        Some("off") => "\\sym{$\\square$}",
        Some("trans") => "\\sym{$\\boxminus$}",
        _ => "\\item",
    };
    Ok(Some(format!("{marker} {body}\n")))
}

pub(super) fn special_block(node: &Node, contents: &Contents) -> Option<String> {
    let name = sanitize_command(node.text_property("type").unwrap_or(""));
    if name.is_empty() {
        Some(contents.text.clone())
    } else {
        Some(environment(&name, "", &contents.text))
    }
}

// ============================================================================
// Code
// ============================================================================

pub(super) fn code_block<'a>(node: &'a Node, ctx: &mut RenderContext<'a>) -> Result<String> {
    check_declared_coderefs(node)?;
    ctx.counters.listings += 1;
    let config = ctx.config;

    let value = if node.flag("retain-labels") {
        node.value().to_string()
    } else {
        strip_coderef_markers(node)
    };
    let language = node
        .text_property("language")
        .filter(|language| !language.trim().is_empty())
        .map(|language| ctx.translate_language(language))
        .unwrap_or_default();
    let numbered = node.flag("number-lines");
    let start = node
        .number_property("number-start")
        .filter(|_| numbered)
        .map(|start| start.to_string())
        .unwrap_or_default();
    let options = format_options(
        [
            ("option", language),
            ("numbering", if numbered { "line".to_string() } else { String::new() }),
            ("start", start),
        ],
        true,
    );
    let block = verbatim_block(&config.environments.code, &options, &value);

    let title = caption(node, ctx)?;
    let label = ctx.refs.get_label(node, false);
    if title.is_empty() && label.is_none() {
        return Ok(block);
    }
    let float = format_options(
        [("title", title), ("reference", label.unwrap_or_default())],
        false,
    );
    Ok(format!("\\startplacelisting{float}\n{block}\\stopplacelisting\n"))
}

fn strip_coderef_markers(node: &Node) -> String {
    let Some(pattern) = coderef_pattern(node) else {
        return node.value().to_string();
    };
    node.value()
        .split('\n')
        .map(|line| pattern.replace(line, ""))
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// Keywords
// ============================================================================

pub(super) fn keyword(node: &Node) -> Option<String> {
    let key = node.text_property("key")?.to_uppercase();
    let value = node.value();
    match key.as_str() {
        "TOC" => {
            let directive = value
                .split_whitespace()
                .next()
                .unwrap_or("")
                .to_lowercase();
            let command = match directive.as_str() {
                "headlines" => "\\placecontent",
                "tables" => "\\placelistoftables",
                "figures" | "images" => "\\placelistoffigures",
                "listings" => "\\placelistoflistings",
                _ => {
                    tracing::debug!(directive = %value, "Ignoring unknown TOC directive");
                    return None;
                }
            };
            Some(format!("{command}\n"))
        }
        "CONTEXT" => Some(terminate(value.to_string())),
        "INDEX" => Some(format!("\\index{{{}}}\n", escape_text(value.trim()))),
        _ => None,
    }
}

// ============================================================================
// Math
// ============================================================================

pub(super) fn math_environment<'a>(node: &'a Node, ctx: &mut RenderContext<'a>) -> String {
    let value = node.value();
    let Some(env) = MathEnvironment::parse(value) else {
        return terminate(value.to_string());
    };
    let inner = MathEnvironment::inner(value).trim();
    let formula = if env.is_aligned() {
        format!(
            "\\startformula\n\\startalign\n{}\n\\stopalign\n\\stopformula\n",
            aligned_rows(inner)
        )
    } else {
        format!("\\startformula\n{inner}\n\\stopformula\n")
    };
    if !env.numbered {
        return formula;
    }
    let label = ctx.refs.get_label(node, true).unwrap_or_default();
    let options = format_options([("reference", label)], true);
    format!("\\startplaceformula{options}\n{formula}\\stopplaceformula\n")
}

/// `a & b \\ c & d` as `\NC a \NC b \NR` rows.
fn aligned_rows(inner: &str) -> String {
    inner
        .split("\\\\")
        .map(str::trim)
        .filter(|row| !row.is_empty())
        .map(|row| {
            let cells: Vec<String> = row
                .split('&')
                .map(|cell| format!("\\NC {}", cell.trim()))
                .collect();
            format!("{} \\NR", cells.join(" "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// Planning
// ============================================================================

pub(super) fn planning(node: &Node, ctx: &RenderContext<'_>) -> Option<String> {
    if !ctx.config.with_planning {
        return None;
    }
    let timestamp = &ctx.config.markup.timestamp;
    let parts: Vec<String> = [
        ("CLOSED", "closed"),
        ("DEADLINE", "deadline"),
        ("SCHEDULED", "scheduled"),
    ]
    .into_iter()
    .filter_map(|(keyword, key)| {
        node.text_property(key)
            .map(|raw| format!("{}: {}", keyword, fill(timestamp, &escape_text(raw))))
    })
    .collect();
    if parts.is_empty() {
        None
    } else {
        Some(format!("{}\n", parts.join(" ")))
    }
}
