/*
 * writer/tables.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Table handlers.
//!
//! Tables are emitted as ConTeXt `xtable`s. Layout decisions (sections,
//! roles, widths) come from the table's [`TableGeometry`], computed once
//! per pass; the handlers here only turn them into markup.
//!
//! [`TableGeometry`]: crate::table::TableGeometry

use context_export_types::{Node, NodeKind};

use super::{Contents, caption};
use crate::config::TableConfig;
use crate::context::RenderContext;
use crate::error::Result;
use crate::format::format_options;
use crate::table::{RowType, TableSection, cell_span, style_for};

/// `[style]`, or nothing.
fn bracket(style: Option<String>) -> String {
    style.map(|style| format!("[{}]", style)).unwrap_or_default()
}

fn index_of(parent: &Node, child: &Node) -> Option<usize> {
    parent
        .children
        .iter()
        .position(|candidate| std::ptr::eq(candidate, child))
}

pub(super) fn cell<'a>(
    node: &'a Node,
    contents: &Contents,
    ctx: &mut RenderContext<'a>,
) -> Option<String> {
    let body = contents.text.trim();
    let (Some(row), Some(table)) = (ctx.parent(), ctx.ancestor(1)) else {
        return Some(body.to_string());
    };
    if table.kind != NodeKind::Table {
        return Some(body.to_string());
    }
    if RowType::of(row) != RowType::Standard {
        return None;
    }

    let row_index = index_of(table, row)?;
    let column: usize = row
        .children
        .iter()
        .take_while(|sibling| !std::ptr::eq(*sibling, node))
        .map(cell_span)
        .sum();
    let span = cell_span(node);
    let geometry = ctx.table_geometry(table);
    let style = geometry
        .cell_role(row_index, column, span)
        .key()
        .and_then(|key| style_for(table, &ctx.config.table, key));

    let align = match node.text_property("align") {
        Some("left") => "flushleft",
        Some("right") => "flushright",
        Some("center") => "middle",
        _ => "",
    };
    let nx = if span > 1 { span.to_string() } else { String::new() };
    let settings = format_options([("align", align.to_string()), ("nx", nx)], true);

    let open = format!("\\startxcell{}{}", bracket(style), settings);
    Some(if body.is_empty() {
        format!("{open} \\stopxcell")
    } else {
        format!("{open} {body} \\stopxcell")
    })
}

pub(super) fn row<'a>(
    node: &'a Node,
    contents: &Contents,
    ctx: &mut RenderContext<'a>,
) -> Option<String> {
    if RowType::of(node) != RowType::Standard {
        return None;
    }
    let Some(table) = ctx.parent().filter(|parent| parent.kind == NodeKind::Table) else {
        return Some(contents.text.clone());
    };
    let index = index_of(table, node)?;
    let geometry = ctx.table_geometry(table);
    let style = geometry
        .row_role(index)
        .key()
        .and_then(|key| style_for(table, &ctx.config.table, key));

    let mut out = format!("\\startxrow{}\n", bracket(style));
    for cell in contents.parts.iter().flatten() {
        out.push_str("  ");
        out.push_str(cell.trim_end());
        out.push('\n');
    }
    out.push_str("\\stopxrow\n");
    Some(out)
}

pub(super) fn table<'a>(
    node: &'a Node,
    contents: &Contents,
    ctx: &mut RenderContext<'a>,
) -> Result<Option<String>> {
    let render_config = ctx.config;
    let config = &render_config.table;
    let geometry = ctx.table_geometry(node);

    let mut head = Vec::new();
    let mut body = Vec::new();
    let mut foot = Vec::new();
    for (index, part) in contents.parts.iter().enumerate() {
        let Some(text) = part else { continue };
        match geometry.section(index) {
            Some(TableSection::Head) => head.push(text.as_str()),
            Some(TableSection::Body) => body.push(text.as_str()),
            Some(TableSection::Foot) => foot.push(text.as_str()),
            None => {}
        }
    }

    let split = node.flag("split") || config.split;
    // Repeating only matters once the table may break across pages.
    let repeat_header = !geometry.header.is_empty()
        && (split
            || node
                .text_property("header")
                .is_some_and(|header| header.eq_ignore_ascii_case("repeat")));
    let footer = if geometry.footer.is_empty() {
        ""
    } else {
        node.property("footer")
            .filter(|footer| footer.is_truthy())
            .and_then(|footer| footer.as_str())
            .unwrap_or(&config.footer)
    };
    let options = format_options(
        [
            ("split", if split { "yes" } else { "" }),
            ("header", if repeat_header { "repeat" } else { "" }),
            ("footer", footer),
        ],
        true,
    );
    let table_style = node
        .text_property("style")
        .map(str::to_string)
        .or_else(|| style_for(node, config, "table"));

    let mut xtable = format!("\\startxtable{}{}\n", bracket(table_style), options);
    let sizing = if geometry.has_widths() {
        sizing_row(&geometry.widths)
    } else {
        String::new()
    };
    push_section(&mut xtable, "xtablehead", style_for(node, config, "head"), "", &head);
    push_section(&mut xtable, "xtablebody", style_for(node, config, "body"), &sizing, &body);
    push_section(&mut xtable, "xtablefoot", foot_style(node, config), "", &foot);
    xtable.push_str("\\stopxtable\n");

    let title = caption(node, ctx)?;
    let label = ctx.refs.get_label(node, false);
    if title.is_empty() && label.is_none() {
        return Ok(Some(xtable));
    }
    let location = node
        .text_property("location")
        .unwrap_or(config.location.as_str());
    let float = format_options(
        [
            ("title", title.as_str()),
            ("reference", label.as_deref().unwrap_or("")),
            ("location", location),
        ],
        false,
    );
    Ok(Some(format!(
        "\\startplacetable{float}\n{xtable}\\stopplacetable\n"
    )))
}

/// Style of the footer section.
///
/// A per-table `style-foot` wins, then the global `footer-style`, then the
/// regular role lookup.
fn foot_style(table: &Node, config: &TableConfig) -> Option<String> {
    [table.text_property("style-foot"), Some(config.footer_style.as_str())]
        .into_iter()
        .flatten()
        .find(|style| !style.is_empty())
        .map(str::to_string)
        .or_else(|| style_for(table, config, "foot"))
}

fn push_section(out: &mut String, name: &str, style: Option<String>, prefix: &str, rows: &[&str]) {
    if rows.is_empty() && prefix.is_empty() {
        return;
    }
    out.push_str(&format!("\\start{}{}\n", name, bracket(style)));
    out.push_str(prefix);
    for row in rows {
        out.push_str(row);
    }
    out.push_str(&format!("\\stop{}\n", name));
}

/// Zero-height row fixing column widths.
fn sizing_row(widths: &[Option<i64>]) -> String {
    let mut out = String::from("\\startxrow[height=0pt]\n");
    for width in widths {
        match width {
            Some(width) => out.push_str(&format!("  \\startxcell[width={{{}em}}] \\stopxcell\n", width)),
            None => out.push_str("  \\startxcell \\stopxcell\n"),
        }
    }
    out.push_str("\\stopxrow\n");
    out
}
