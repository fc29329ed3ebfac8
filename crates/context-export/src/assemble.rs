/*
 * assemble.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Zone assembly and standalone document wrapping.
 */

//! Zone assembly and standalone document wrapping.
//!
//! The body stream and the zone buffers are combined into one text through
//! a named template whose `%x` placeholders stand for zones:
//!
//! - `%f` frontmatter, `%c` body, `%a` appendix
//! - `%b` backmatter, `%i` index, `%o` copying
//!
//! Without a usable template, the built-in layout concatenates the zones in
//! the order frontmatter, body, appendix, index, backmatter, copying.
//!
//! [`wrap_document`] then adds the preamble and `\starttext … \stoptext`.

use std::collections::HashMap;

use context_export_types::{Node, NodeKind, Zone};

use crate::context::{RenderContext, ZoneBuffers};
use crate::error::{RenderWarning, WarningKind};
use crate::escape::escape_text;
use crate::format::{format_options, substitute_placeholders};

/// Template placeholders and the zones they stand for.
pub const ZONE_PLACEHOLDERS: [(char, Zone); 6] = [
    ('f', Zone::Frontmatter),
    ('c', Zone::Body),
    ('a', Zone::Appendix),
    ('b', Zone::Backmatter),
    ('i', Zone::Index),
    ('o', Zone::Copying),
];

/// Zone order of the built-in template.
const BUILTIN_ORDER: [Zone; 6] = [
    Zone::Frontmatter,
    Zone::Body,
    Zone::Appendix,
    Zone::Index,
    Zone::Backmatter,
    Zone::Copying,
];

/// Metadata properties copied into `\setvariables[document]`.
const DOCUMENT_VARIABLES: [&str; 8] = [
    "title",
    "subtitle",
    "author",
    "email",
    "date",
    "keywords",
    "description",
    "subject",
];

/// Combine the body stream with the zone buffers.
///
/// A named template that does not exist falls back to the built-in layout
/// and records a [`WarningKind::MissingTemplate`] warning.
pub fn assemble_document(
    body: &str,
    zones: &ZoneBuffers,
    template_name: Option<&str>,
    templates: &HashMap<String, String>,
    warnings: &mut Vec<RenderWarning>,
) -> String {
    let zone_text = |zone: Zone| match zone {
        Zone::Body => body.trim_end().to_string(),
        other => zones.joined(other),
    };

    let template = template_name.and_then(|name| {
        let found = templates.get(name);
        if found.is_none() {
            let warning = RenderWarning::new(
                WarningKind::MissingTemplate,
                format!("Template '{}' not found; using the built-in layout", name),
            );
            tracing::warn!(kind = ?warning.kind, "{}", warning.message);
            warnings.push(warning);
        }
        found
    });

    match template {
        Some(template) => substitute_placeholders(template, |key| {
            ZONE_PLACEHOLDERS
                .iter()
                .find(|(placeholder, _)| *placeholder == key)
                .map(|(_, zone)| zone_text(*zone))
        }),
        None => {
            let mut out = BUILTIN_ORDER
                .into_iter()
                .map(&zone_text)
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
                .join("\n\n");
            if !out.is_empty() {
                out.push('\n');
            }
            out
        }
    }
}

/// Metadata value of the document, list values joined by commas.
///
/// Without a document property of that name, matching metadata keywords
/// supply the value.
fn metadata(root: &Node, key: &str) -> String {
    let mut values = root.list_property(key);
    if values.is_empty() {
        values = metadata_keywords(root)
            .filter(|keyword| {
                keyword
                    .text_property("key")
                    .is_some_and(|name| name.eq_ignore_ascii_case(key))
            })
            .map(|keyword| keyword.value().trim())
            .filter(|value| !value.is_empty())
            .collect();
    }
    escape_text(&values.join(", "))
}

/// Keywords at the top level of `root` or directly in its first section.
fn metadata_keywords(root: &Node) -> impl Iterator<Item = &Node> {
    let first_section = root
        .children
        .iter()
        .find(|node| node.kind == NodeKind::Section)
        .map(|section| section.children.as_slice())
        .unwrap_or_default();
    root.children
        .iter()
        .chain(first_section)
        .filter(|node| node.kind == NodeKind::Keyword)
}

/// Wrap assembled content in a standalone ConTeXt document.
pub fn wrap_document<'a>(content: &str, root: &'a Node, ctx: &mut RenderContext<'a>) -> String {
    let config = ctx.config;
    let mut out = String::new();

    out.push_str(&format!("\\mainlanguage[{}]\n", ctx.language));

    let author = if config.with_author {
        metadata(root, "author")
    } else {
        String::new()
    };
    let interaction = format_options(
        [
            ("state", "start".to_string()),
            ("title", metadata(root, "title")),
            ("subtitle", metadata(root, "subtitle")),
            ("author", author.clone()),
            ("keyword", metadata(root, "keywords")),
        ],
        false,
    );
    out.push_str(&format!("\\setupinteraction{}\n", interaction));
    out.push_str("\\definefloat[listing][listings]\n");

    for (name, setup) in &config.table.definitions {
        if !name.is_empty() {
            out.push_str(&format!("\\setupxtable[{}][{}]\n", name, setup));
        }
    }

    for name in &config.use_snippets {
        match config.snippets.get(name) {
            Some(snippet) => {
                out.push_str(snippet.trim_end());
                out.push('\n');
            }
            None => ctx.warn(
                WarningKind::UnknownSnippet,
                format!("Snippet '{}' not found", name),
            ),
        }
    }

    if !config.preamble.trim().is_empty() {
        out.push_str(config.preamble.trim_end());
        out.push('\n');
    }

    let variables = format_options(
        DOCUMENT_VARIABLES.map(|key| (key, metadata(root, key))),
        false,
    );
    if !variables.is_empty() {
        out.push_str(&format!("\\setvariables[document]{}\n", variables));
    }

    out.push_str("\\starttext\n");
    if config.with_title {
        out.push_str(&title_block(root, config, &author));
    }
    if config.with_toc {
        out.push_str("\\placecontent\n\\page\n");
    }
    out.push_str(content.trim_end());
    if !content.trim().is_empty() {
        out.push('\n');
    }
    out.push_str("\\stoptext\n");
    out
}

fn title_block(root: &Node, config: &crate::config::RenderConfig, author: &str) -> String {
    let title = metadata(root, "title");
    if title.is_empty() {
        return String::new();
    }
    let mut lines = vec![format!("  {{\\tfd {}}}", title)];
    let subtitle = metadata(root, "subtitle");
    if !subtitle.is_empty() {
        lines.push(format!("  {{\\tfb {}}}", subtitle));
    }
    if !author.is_empty() {
        lines.push(format!("  {{\\tfa {}}}", author));
    }
    let email = metadata(root, "email");
    if config.with_email && !email.is_empty() {
        lines.push(format!("  {{\\tt {}}}", email));
    }
    let date = metadata(root, "date");
    if config.with_date && !date.is_empty() {
        lines.push(format!("  {}", date));
    }
    format!(
        "\\startalignment[middle]\n{}\n\\stopalignment\n\\blank[big]\n",
        lines.join("\n  \\blank[medium]\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderConfig;
    use pretty_assertions::assert_eq;

    fn zones() -> ZoneBuffers {
        let mut zones = ZoneBuffers::new();
        zones.push(Zone::Appendix, "APPENDIX\n".to_string());
        zones.push(Zone::Frontmatter, "FRONT\n".to_string());
        zones.push(Zone::Copying, "COPY".to_string());
        zones
    }

    #[test]
    fn test_builtin_layout_order() {
        let mut warnings = Vec::new();
        let out = assemble_document("BODY\n\n", &zones(), None, &HashMap::new(), &mut warnings);
        assert_eq!(out, "FRONT\n\nBODY\n\nAPPENDIX\n\nCOPY\n");
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_named_template_placeholders() {
        let templates = HashMap::from([(
            "book".to_string(),
            "\\startappendices\n%a\n\\stopappendices\n%c\n%z".to_string(),
        )]);
        let mut warnings = Vec::new();
        let out = assemble_document("BODY", &zones(), Some("book"), &templates, &mut warnings);
        assert_eq!(out, "\\startappendices\nAPPENDIX\n\\stopappendices\nBODY\n%z");
    }

    #[test]
    fn test_missing_template_warns_and_falls_back() {
        let mut warnings = Vec::new();
        let out = assemble_document("BODY", &ZoneBuffers::new(), Some("nope"), &HashMap::new(), &mut warnings);
        assert_eq!(out, "BODY\n");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::MissingTemplate);
    }

    #[test]
    fn test_wrap_document_layout() {
        let root = Node::new(NodeKind::Document)
            .with_property("title", "A & B")
            .with_property("author", "Ada");
        let config = RenderConfig {
            use_snippets: vec!["fonts".to_string(), "missing".to_string()],
            snippets: HashMap::from([("fonts".to_string(), "\\setupbodyfont[11pt]".to_string())]),
            preamble: "\\setuppapersize[A4]".to_string(),
            with_toc: true,
            ..RenderConfig::default()
        };
        let mut ctx = RenderContext::new(&root, &config);
        let out = wrap_document("Hello\n", &root, &mut ctx);

        let order = [
            "\\mainlanguage[en]\n",
            "\\setupinteraction[state={start},\n   title={A \\& B},\n   author={Ada}]\n",
            "\\definefloat[listing][listings]\n",
            "\\setupxtable[DocTable][frame=off]\n",
            "\\setupbodyfont[11pt]\n",
            "\\setuppapersize[A4]\n",
            "\\setvariables[document][title={A \\& B},\n   author={Ada}]\n",
            "\\starttext\n",
            "{\\tfd A \\& B}",
            "\\placecontent\n",
            "Hello\n\\stoptext\n",
        ];
        let mut position = 0;
        for expected in order {
            let found = out[position..]
                .find(expected)
                .unwrap_or_else(|| panic!("missing {:?} in\n{}", expected, out));
            position += found + expected.len();
        }
        assert_eq!(ctx.warnings.len(), 1);
        assert_eq!(ctx.warnings[0].kind, WarningKind::UnknownSnippet);
    }

    #[test]
    fn test_metadata_falls_back_to_keywords() {
        let keyword = |key: &str, value: &str| {
            Node::new(NodeKind::Keyword)
                .with_property("key", key)
                .with_property("value", value)
        };
        let root = Node::new(NodeKind::Document)
            .with_property("date", "2024")
            .with_child(keyword("TITLE", "Q & A"))
            .with_child(keyword("author", "Ann"))
            .with_child(keyword("DATE", "1999"))
            .with_child(
                Node::new(NodeKind::Section)
                    .with_child(keyword("Author", " Bob "))
                    .with_child(keyword("SUBTITLE", "")),
            )
            .with_child(Node::new(NodeKind::Section).with_child(keyword("EMAIL", "x@y")));

        assert_eq!(metadata(&root, "title"), "Q \\& A");
        assert_eq!(metadata(&root, "author"), "Ann, Bob");
        assert_eq!(metadata(&root, "date"), "2024");
        assert_eq!(metadata(&root, "subtitle"), "");
        assert_eq!(metadata(&root, "email"), "");
    }

    #[test]
    fn test_title_block_needs_title() {
        let root = Node::new(NodeKind::Document).with_property("author", "Ada");
        let config = RenderConfig::default();
        let mut ctx = RenderContext::new(&root, &config);
        let out = wrap_document("x", &root, &mut ctx);
        assert!(!out.contains("\\tfd"));
        assert!(out.ends_with("\\starttext\nx\n\\stoptext\n"));
    }
}
