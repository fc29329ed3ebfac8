/*
 * table.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Table layout decisions.
//!
//! A [`TableGeometry`] is derived from a table node and never stored in the
//! tree. It answers which rows form the header and footer, which role every
//! row and cell plays, and which style each role maps to.
//!
//! Row indices used here are indices into the table's `children`, so rule
//! and column-group rows keep their slots but never appear in any group.

use std::collections::BTreeSet;

use context_export_types::Node;

use crate::config::TableConfig;

/// The `type` of a table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowType {
    Standard,
    /// Horizontal rule; separates row groups.
    Rule,
    /// Column-group markers (`<`, `>`, `<>`).
    ColGroup,
}

impl RowType {
    pub fn of(row: &Node) -> Self {
        match row.text_property("type") {
            Some("rule") => RowType::Rule,
            Some("colgroup") => RowType::ColGroup,
            _ => RowType::Standard,
        }
    }
}

/// The xtable section a row is emitted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableSection {
    Head,
    Body,
    Foot,
}

/// Role of a row, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowRole {
    /// The only row of a header or footer. Carries no extra style.
    HeadFootSingle,
    HeaderTop,
    FooterTop,
    HeaderBottom,
    FooterBottom,
    HeaderMid,
    FooterMid,
    FirstRow,
    LastRow,
    GroupStart,
    GroupEnd,
    None,
}

impl RowRole {
    /// Style key, as used by `cell-styles` and `style-<key>` properties.
    pub fn key(&self) -> Option<&'static str> {
        match self {
            RowRole::HeadFootSingle | RowRole::None => None,
            RowRole::HeaderTop => Some("header-top"),
            RowRole::FooterTop => Some("footer-top"),
            RowRole::HeaderBottom => Some("header-bottom"),
            RowRole::FooterBottom => Some("footer-bottom"),
            RowRole::HeaderMid => Some("header-mid"),
            RowRole::FooterMid => Some("footer-mid"),
            RowRole::FirstRow => Some("first-row"),
            RowRole::LastRow => Some("last-row"),
            RowRole::GroupStart => Some("group-start"),
            RowRole::GroupEnd => Some("group-end"),
        }
    }
}

/// Role of a cell, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellRole {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Left,
    Right,
    ColGroupStart,
    ColGroupEnd,
    None,
}

impl CellRole {
    pub fn key(&self) -> Option<&'static str> {
        match self {
            CellRole::TopLeft => Some("top-left"),
            CellRole::TopRight => Some("top-right"),
            CellRole::BottomLeft => Some("bottom-left"),
            CellRole::BottomRight => Some("bottom-right"),
            CellRole::Left => Some("left"),
            CellRole::Right => Some("right"),
            CellRole::ColGroupStart => Some("colgroup-start"),
            CellRole::ColGroupEnd => Some("colgroup-end"),
            CellRole::None => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableGeometry {
    /// Standard rows in order.
    pub rows: Vec<usize>,
    /// Maximal non-empty runs of standard rows between rules.
    pub groups: Vec<Vec<usize>>,
    pub header: Vec<usize>,
    pub footer: Vec<usize>,
    /// Widest row, counting spans.
    pub columns: usize,
    pub colgroup_starts: BTreeSet<usize>,
    pub colgroup_ends: BTreeSet<usize>,
    /// Widths (em) from the first standard row, one entry per cell.
    pub widths: Vec<Option<i64>>,
}

/// Widest span a single cell may claim.
const MAX_SPAN: i64 = 1024;

/// Number of columns a cell covers, between 1 and [`MAX_SPAN`].
pub fn cell_span(cell: &Node) -> usize {
    cell.number_property("span")
        .map(|span| span.clamp(1, MAX_SPAN) as usize)
        .unwrap_or(1)
}

/// Whether a header is requested for `table`.
///
/// A per-table `header` property overrides the global switch.
pub fn header_enabled(table: &Node, config: &TableConfig) -> bool {
    table
        .property("header")
        .map_or(config.header, |value| value.is_truthy())
}

/// Whether `table` has any footer source configured.
pub fn footer_requested(table: &Node, config: &TableConfig) -> bool {
    table.has_property("footer") || !config.footer_style.is_empty() || !config.footer.is_empty()
}

impl TableGeometry {
    pub fn compute(table: &Node, config: &TableConfig) -> Self {
        let mut geometry = TableGeometry::default();
        let mut current = Vec::new();

        for (index, row) in table.children.iter().enumerate() {
            match RowType::of(row) {
                RowType::Standard => {
                    geometry.rows.push(index);
                    current.push(index);
                    let width: usize = row.children.iter().map(cell_span).sum();
                    geometry.columns = geometry.columns.max(width);
                }
                RowType::Rule => {
                    if !current.is_empty() {
                        geometry.groups.push(std::mem::take(&mut current));
                    }
                }
                RowType::ColGroup => geometry.read_colgroups(row),
            }
        }
        if !current.is_empty() {
            geometry.groups.push(current);
        }

        if header_enabled(table, config) {
            geometry.header = match geometry.groups.as_slice() {
                [] => Vec::new(),
                [single] if single.len() > 1 => vec![single[0]],
                [_] => Vec::new(),
                [first, ..] => first.clone(),
            };
        }
        if geometry.groups.len() > 2 && footer_requested(table, config) {
            geometry.footer = geometry.groups.last().cloned().unwrap_or_default();
        }

        if let Some(&first) = geometry.rows.first() {
            geometry.widths = table.children[first]
                .children
                .iter()
                .map(|cell| cell.number_property("width"))
                .collect();
        }

        geometry
    }

    fn read_colgroups(&mut self, row: &Node) {
        let mut column = 0;
        for cell in &row.children {
            let span = cell_span(cell);
            match cell.plain_text().trim() {
                "<" => {
                    self.colgroup_starts.insert(column);
                }
                ">" => {
                    self.colgroup_ends.insert(column + span - 1);
                }
                "<>" => {
                    self.colgroup_starts.insert(column);
                    self.colgroup_ends.insert(column + span - 1);
                }
                _ => {}
            }
            column += span;
        }
    }

    pub fn has_widths(&self) -> bool {
        self.widths.iter().any(Option::is_some)
    }

    /// Section of a row, or `None` for rules and column-group rows.
    pub fn section(&self, row: usize) -> Option<TableSection> {
        if self.header.contains(&row) {
            Some(TableSection::Head)
        } else if self.footer.contains(&row) {
            Some(TableSection::Foot)
        } else if self.rows.contains(&row) {
            Some(TableSection::Body)
        } else {
            None
        }
    }

    pub fn row_role(&self, row: usize) -> RowRole {
        let header = [RowRole::HeaderTop, RowRole::HeaderBottom, RowRole::HeaderMid];
        if let Some(role) = edge_role(&self.header, row, header) {
            return role;
        }
        let footer = [RowRole::FooterTop, RowRole::FooterBottom, RowRole::FooterMid];
        if let Some(role) = edge_role(&self.footer, row, footer) {
            return role;
        }
        if self.rows.first() == Some(&row) {
            return RowRole::FirstRow;
        }
        if self.rows.last() == Some(&row) {
            return RowRole::LastRow;
        }
        for group in &self.groups {
            if group.first() == Some(&row) {
                return RowRole::GroupStart;
            }
            if group.last() == Some(&row) {
                return RowRole::GroupEnd;
            }
        }
        RowRole::None
    }

    /// Role of the cell starting at `column` and covering `span` columns.
    pub fn cell_role(&self, row: usize, column: usize, span: usize) -> CellRole {
        let top = self.rows.first() == Some(&row);
        let bottom = self.rows.last() == Some(&row);
        let left = column == 0;
        let right = column + span >= self.columns;

        match (top, bottom, left, right) {
            (true, _, true, _) => CellRole::TopLeft,
            (true, _, _, true) => CellRole::TopRight,
            (_, true, true, _) => CellRole::BottomLeft,
            (_, true, _, true) => CellRole::BottomRight,
            (_, _, true, _) => CellRole::Left,
            (_, _, _, true) => CellRole::Right,
            _ if self.colgroup_starts.contains(&column) => CellRole::ColGroupStart,
            _ if self.colgroup_ends.contains(&(column + span - 1)) => CellRole::ColGroupEnd,
            _ => CellRole::None,
        }
    }
}

/// Role of `row` inside a header or footer; `roles` is top, bottom, mid.
fn edge_role(rows: &[usize], row: usize, roles: [RowRole; 3]) -> Option<RowRole> {
    let [top, bottom, mid] = roles;
    if !rows.contains(&row) {
        return None;
    }
    Some(match rows {
        [_] => RowRole::HeadFootSingle,
        [first, ..] if *first == row => top,
        [.., last] if *last == row => bottom,
        _ => mid,
    })
}

/// Style for a role key.
///
/// Per-table `style-<key>` properties win over the global per-position
/// overrides, which win over the configured role styles. Empty styles
/// count as absent.
pub fn style_for(table: &Node, config: &TableConfig, key: &str) -> Option<String> {
    let own = table.text_property(&format!("style-{}", key));
    own.or_else(|| config.cell_styles.get(key).map(String::as_str))
        .or_else(|| config.styles.by_key(key))
        .filter(|style| !style.is_empty())
        .map(str::to_string)
}
