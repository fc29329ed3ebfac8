/*
 * escape.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Character escaping for ConTeXt output.
//!
//! All functions here are pure string transforms.
//!
//! # Character classes
//!
//! | Class | Characters | Replacement |
//! |---|---|---|
//! | active / grouping | `\ { }` | `\textbackslash{}`, `\{`, `\}` |
//! | catcode specials | `$ % # & _` | backslash-prefixed |
//! | accents / ties | `~ ^ \|` | `\textasciitilde{}`, `\textasciicircum{}`, `\textbar{}` |
//!
//! # Special strings
//!
//! When enabled, `---`, `--`, `...` and `\-` in running text become
//! `\emdash{}`, `\endash{}`, `\dots{}` and a discretionary hyphen.

/// Replacement for a single character in running text, if it needs one.
fn escape_char(c: char) -> Option<&'static str> {
    match c {
        '\\' => Some("\\textbackslash{}"),
        '{' => Some("\\{"),
        '}' => Some("\\}"),
        '$' => Some("\\$"),
        '%' => Some("\\%"),
        '#' => Some("\\#"),
        '&' => Some("\\&"),
        '_' => Some("\\_"),
        '~' => Some("\\textasciitilde{}"),
        '^' => Some("\\textasciicircum{}"),
        '|' => Some("\\textbar{}"),
        _ => None,
    }
}

/// Special string table, longest first.
const SPECIAL_STRINGS: [(&str, &str); 4] = [
    ("---", "\\emdash{}"),
    ("--", "\\endash{}"),
    ("...", "\\dots{}"),
    ("\\-", "\\-"),
];

/// Escape running text.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match escape_char(c) {
            Some(replacement) => out.push_str(replacement),
            None => out.push(c),
        }
    }
    out
}

/// Escape running text, converting special strings first.
pub fn escape_with_special_strings(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    'outer: while let Some(c) = rest.chars().next() {
        for (pattern, replacement) in SPECIAL_STRINGS {
            if let Some(tail) = rest.strip_prefix(pattern) {
                out.push_str(replacement);
                rest = tail;
                continue 'outer;
            }
        }
        match escape_char(c) {
            Some(replacement) => out.push_str(replacement),
            None => out.push(c),
        }
        rest = &rest[c.len_utf8()..];
    }
    out
}

/// Escape a URL for use inside `url(…)` or `\hyphenatedurl{…}`.
pub fn escape_url(url: &str) -> String {
    let mut out = String::with_capacity(url.len());
    for c in url.chars() {
        match c {
            '%' => out.push_str("\\%"),
            '#' => out.push_str("\\#"),
            '\\' => out.push_str("\\letterbackslash{}"),
            '{' => out.push_str("\\{"),
            '}' => out.push_str("\\}"),
            _ => out.push(c),
        }
    }
    out
}

/// Restrict a label to characters that survive ConTeXt reference handling.
pub fn sanitize_label(label: &str) -> String {
    label
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, ':' | '-' | '_' | '.') {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// Keep only ASCII letters, for names spliced into `\start<name>`.
pub fn sanitize_command(name: &str) -> String {
    name.chars().filter(char::is_ascii_alphabetic).collect()
}

/// Inline verbatim text.
///
/// `\type{…}` needs balanced braces; anything else uses the `<<…>>`
/// delimiter form. Newlines are folded into spaces.
pub fn verbatim_inline(text: &str) -> String {
    let text = text.replace('\n', " ");
    if braces_balanced(&text) {
        format!("\\type{{{}}}", text)
    } else {
        format!("\\type<<{}>>", text)
    }
}

fn braces_balanced(text: &str) -> bool {
    let mut depth: i64 = 0;
    for c in text.chars() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}
