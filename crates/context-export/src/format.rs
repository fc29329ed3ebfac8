/*
 * format.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Argument and template formatting.
//!
//! ConTeXt setups take `[key={value},key={value}]` argument lists. These
//! helpers serialize ordered key/value pairs into that syntax and fill
//! `%x` placeholders in configured template strings.

/// Separator between arguments in multi-line form.
const ARG_SEPARATOR: &str = ",\n   ";

/// Render `key={value}` pairs, dropping pairs whose value is empty.
///
/// Pairs are joined by `,\n   `, or by `,` when `oneline` is set. The
/// order of the surviving pairs is the input order.
pub fn format_args<K, V>(pairs: impl IntoIterator<Item = (K, V)>, oneline: bool) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let separator = if oneline { "," } else { ARG_SEPARATOR };
    pairs
        .into_iter()
        .filter(|(_, value)| !value.as_ref().is_empty())
        .map(|(key, value)| format!("{}={{{}}}", key.as_ref(), value.as_ref()))
        .collect::<Vec<_>>()
        .join(separator)
}

/// Like [`format_args`], wrapped in brackets. Returns the empty string when
/// every pair was dropped, so an absent option list leaves no `[]` behind.
pub fn format_options<K, V>(pairs: impl IntoIterator<Item = (K, V)>, oneline: bool) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let args = format_args(pairs, oneline);
    if args.is_empty() {
        String::new()
    } else {
        format!("[{}]", args)
    }
}

/// Replace `%x` tokens using `lookup`.
///
/// Tokens the lookup does not know are left untouched, including `%%` and
/// a trailing lone `%`.
pub fn substitute_placeholders(template: &str, lookup: impl Fn(char) -> Option<String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some(key) => match lookup(key) {
                Some(value) => {
                    chars.next();
                    out.push_str(&value);
                }
                None => out.push('%'),
            },
            None => out.push('%'),
        }
    }
    out
}

/// Fill the `%s` slot of a markup template such as `\bold{%s}`.
pub fn fill(template: &str, value: &str) -> String {
    substitute_placeholders(template, |key| (key == 's').then(|| value.to_string()))
}
