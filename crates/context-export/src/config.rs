/*
 * config.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Render configuration.
 */

//! Render configuration.
//!
//! The configuration is injected by the caller, already resolved. Every
//! field has a default, so callers only specify what they change; from
//! JSON this looks like:
//!
//! ```json
//! {
//!   "body-only": true,
//!   "template": "book",
//!   "templates": { "book": "\\startfrontmatter\n%f\n\\stopfrontmatter\n%c" },
//!   "table": { "footer": "repeat" }
//! }
//! ```

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::quotes::QuoteStyle;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RenderConfig {
    /// Return only the assembled content, without preamble and
    /// `\starttext … \stoptext`.
    pub body_only: bool,
    /// Name of the template used to assemble zones.
    pub template: Option<String>,
    /// Named templates with `%f %c %a %b %i %o` placeholders.
    pub templates: HashMap<String, String>,
    /// Named preamble fragments.
    pub snippets: HashMap<String, String>,
    /// Snippets inserted into the preamble, in order.
    pub use_snippets: Vec<String>,
    /// Free-form text appended to the preamble.
    pub preamble: String,

    /// Document language, unless the document sets one.
    pub language: String,
    /// Quote delimiters per language.
    pub quotes: HashMap<String, QuoteStyle>,
    /// Source-language name translations for code blocks.
    pub languages: HashMap<String, String>,

    pub with_smart_quotes: bool,
    pub with_special_strings: bool,
    pub with_todo_keywords: bool,
    pub with_priority: bool,
    pub with_tags: bool,
    pub with_planning: bool,
    pub with_drawers: bool,
    pub with_title: bool,
    pub with_author: bool,
    pub with_date: bool,
    pub with_email: bool,
    pub with_toc: bool,

    pub sections: SectionCommands,
    pub environments: EnvironmentNames,
    pub markup: TextMarkup,
    pub table: TableConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            body_only: false,
            template: None,
            templates: HashMap::new(),
            snippets: HashMap::new(),
            use_snippets: Vec::new(),
            preamble: String::new(),
            language: "en".to_string(),
            quotes: HashMap::new(),
            languages: default_language_names(),
            with_smart_quotes: true,
            with_special_strings: true,
            with_todo_keywords: true,
            with_priority: false,
            with_tags: true,
            with_planning: false,
            with_drawers: true,
            with_title: true,
            with_author: true,
            with_date: true,
            with_email: false,
            with_toc: false,
            sections: SectionCommands::default(),
            environments: EnvironmentNames::default(),
            markup: TextMarkup::default(),
            table: TableConfig::default(),
        }
    }
}

impl RenderConfig {
    /// Parse a configuration object from JSON.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Quote delimiters for `language`, falling back to the defaults.
    pub fn quote_style(&self, language: &str) -> QuoteStyle {
        self.quotes.get(language).cloned().unwrap_or_default()
    }
}

fn default_language_names() -> HashMap<String, String> {
    [
        ("emacs-lisp", "lisp"),
        ("elisp", "lisp"),
        ("sh", "bash"),
        ("shell", "bash"),
        ("c++", "cpp"),
        ("js", "javascript"),
        ("py", "python"),
        ("rs", "rust"),
    ]
    .into_iter()
    .map(|(from, to)| (from.to_string(), to.to_string()))
    .collect()
}

/// Sectioning commands by heading level (index 0 is level 1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SectionCommands {
    pub numbered: Vec<String>,
    pub unnumbered: Vec<String>,
}

impl Default for SectionCommands {
    fn default() -> Self {
        Self {
            numbered: ["section", "subsection", "subsubsection", "subsubsubsection"]
                .map(String::from)
                .to_vec(),
            unnumbered: ["subject", "subsubject", "subsubsubject", "subsubsubsubject"]
                .map(String::from)
                .to_vec(),
        }
    }
}

impl SectionCommands {
    /// Command for a heading, or `None` past the deepest configured level.
    pub fn command(&self, level: usize, numbered: bool) -> Option<&str> {
        let table = if numbered {
            &self.numbered
        } else {
            &self.unnumbered
        };
        table.get(level.checked_sub(1)?).map(String::as_str)
    }
}

/// ConTeXt environment names used for block elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct EnvironmentNames {
    pub quote: String,
    pub example: String,
    pub fixed_width: String,
    pub verse: String,
    pub code: String,
    pub itemize: String,
    pub description: String,
}

impl Default for EnvironmentNames {
    fn default() -> Self {
        Self {
            quote: "quotation".to_string(),
            example: "typing".to_string(),
            fixed_width: "typing".to_string(),
            verse: "lines".to_string(),
            code: "typing".to_string(),
            itemize: "itemize".to_string(),
            description: "description".to_string(),
        }
    }
}

/// `%s` templates for inline markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TextMarkup {
    pub bold: String,
    pub italic: String,
    pub underline: String,
    pub strike_through: String,
    pub subscript: String,
    pub superscript: String,
    pub timestamp: String,
}

impl Default for TextMarkup {
    fn default() -> Self {
        Self {
            bold: "\\bold{%s}".to_string(),
            italic: "\\emph{%s}".to_string(),
            underline: "\\underbar{%s}".to_string(),
            strike_through: "\\overstrike{%s}".to_string(),
            subscript: "\\low{%s}".to_string(),
            superscript: "\\high{%s}".to_string(),
            timestamp: "{\\tt %s}".to_string(),
        }
    }
}

/// Table options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TableConfig {
    /// Turn the first row group into a header.
    pub header: bool,
    /// Global footer option, e.g. `repeat`. Non-empty enables footers.
    pub footer: String,
    /// Style for footer sections. Non-empty enables footers.
    pub footer_style: String,
    /// Let tables break across pages.
    pub split: bool,
    /// Float location of captioned tables.
    pub location: String,
    pub styles: TableStyles,
    /// Per-position overrides, keyed by role (`top-left`, `header-top`, …).
    pub cell_styles: HashMap<String, String>,
    /// Setup arguments per style name, emitted as `\setupxtable` in the
    /// preamble.
    pub definitions: BTreeMap<String, String>,
}

impl Default for TableConfig {
    fn default() -> Self {
        let styles = TableStyles::default();
        let definitions = [
            (&styles.table, "frame=off"),
            (&styles.header_top, "topframe=on"),
            (&styles.header_bottom, "bottomframe=on"),
            (&styles.footer_top, "topframe=on"),
            (&styles.footer_bottom, "bottomframe=on"),
            (&styles.first_row, "topframe=on"),
            (&styles.last_row, "bottomframe=on"),
            (&styles.group_start, "topframe=on"),
            (&styles.left, "leftframe=off"),
            (&styles.right, "rightframe=off"),
            (&styles.colgroup_start, "leftframe=on"),
            (&styles.colgroup_end, "rightframe=on"),
        ]
        .into_iter()
        .map(|(name, setup)| (name.clone(), setup.to_string()))
        .collect();
        Self {
            header: true,
            footer: String::new(),
            footer_style: String::new(),
            split: false,
            location: "here".to_string(),
            styles,
            cell_styles: HashMap::new(),
            definitions,
        }
    }
}

/// Style names for table sections and row/cell roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TableStyles {
    pub table: String,
    pub head: String,
    pub body: String,
    pub foot: String,
    pub header_top: String,
    pub header_mid: String,
    pub header_bottom: String,
    pub footer_top: String,
    pub footer_mid: String,
    pub footer_bottom: String,
    pub first_row: String,
    pub last_row: String,
    pub group_start: String,
    pub group_end: String,
    pub top_left: String,
    pub top_right: String,
    pub bottom_left: String,
    pub bottom_right: String,
    pub left: String,
    pub right: String,
    pub colgroup_start: String,
    pub colgroup_end: String,
}

impl Default for TableStyles {
    fn default() -> Self {
        let name = |s: &str| format!("DocTable{}", s);
        Self {
            table: name(""),
            head: name("Head"),
            body: name("Body"),
            foot: name("Foot"),
            header_top: name("HeaderTop"),
            header_mid: name("HeaderMid"),
            header_bottom: name("HeaderBottom"),
            footer_top: name("FooterTop"),
            footer_mid: name("FooterMid"),
            footer_bottom: name("FooterBottom"),
            first_row: name("FirstRow"),
            last_row: name("LastRow"),
            group_start: name("GroupStart"),
            group_end: name("GroupEnd"),
            top_left: name("TopLeft"),
            top_right: name("TopRight"),
            bottom_left: name("BottomLeft"),
            bottom_right: name("BottomRight"),
            left: name("Left"),
            right: name("Right"),
            colgroup_start: name("ColGroupStart"),
            colgroup_end: name("ColGroupEnd"),
        }
    }
}

impl TableStyles {
    /// Style for a role key, as used by `cell-styles` overrides.
    pub fn by_key(&self, key: &str) -> Option<&str> {
        let style = match key {
            "table" => &self.table,
            "head" => &self.head,
            "body" => &self.body,
            "foot" => &self.foot,
            "header-top" => &self.header_top,
            "header-mid" => &self.header_mid,
            "header-bottom" => &self.header_bottom,
            "footer-top" => &self.footer_top,
            "footer-mid" => &self.footer_mid,
            "footer-bottom" => &self.footer_bottom,
            "first-row" => &self.first_row,
            "last-row" => &self.last_row,
            "group-start" => &self.group_start,
            "group-end" => &self.group_end,
            "top-left" => &self.top_left,
            "top-right" => &self.top_right,
            "bottom-left" => &self.bottom_left,
            "bottom-right" => &self.bottom_right,
            "left" => &self.left,
            "right" => &self.right,
            "colgroup-start" => &self.colgroup_start,
            "colgroup-end" => &self.colgroup_end,
            _ => return None,
        };
        Some(style.as_str())
    }
}
