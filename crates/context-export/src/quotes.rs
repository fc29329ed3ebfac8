/*
 * quotes.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Smart quote conversion.
//!
//! Straight `"` and `'` quotes in a single text node are classified as
//! opening, closing, apostrophe or literal, and matched on a stack. Double
//! quotes are the primary level, single quotes the secondary one. The
//! delimiters come from a per-language [`QuoteStyle`].
//!
//! Matching is all-or-nothing per node: any imbalance yields a
//! [`QuoteMismatch`] and the caller falls back to the unprocessed text.

use serde::{Deserialize, Serialize};

/// Quote delimiters for one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct QuoteStyle {
    pub primary_open: String,
    pub primary_close: String,
    pub secondary_open: String,
    pub secondary_close: String,
    pub apostrophe: String,
}

impl Default for QuoteStyle {
    fn default() -> Self {
        Self {
            primary_open: "\\quotation{".to_string(),
            primary_close: "}".to_string(),
            secondary_open: "\\quote{".to_string(),
            secondary_close: "}".to_string(),
            apostrophe: "'".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Open(Level),
    Close(Level),
    Apostrophe,
    Literal,
}

/// Open/close imbalance at a byte offset of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteMismatch {
    pub position: usize,
}

/// Characters after which a quote opens.
const OPENING_CONTEXT: &[char] = &['(', '[', '{', '-', '/', '\u{2014}'];

fn classify(
    quote: char,
    prev: Option<char>,
    next: Option<char>,
    after_open: bool,
    secondary_open: bool,
) -> Token {
    let opening_context = after_open
        || prev.is_none_or(|p| p.is_whitespace() || OPENING_CONTEXT.contains(&p));
    let followed = next.is_some_and(|n| !n.is_whitespace());
    let preceded = prev.is_some_and(|p| !p.is_whitespace());

    if quote == '"' {
        if opening_context && followed {
            Token::Open(Level::Primary)
        } else if preceded {
            Token::Close(Level::Primary)
        } else {
            Token::Literal
        }
    } else if prev.is_some_and(char::is_alphanumeric) && next.is_some_and(char::is_alphanumeric) {
        Token::Apostrophe
    } else if opening_context && followed {
        Token::Open(Level::Secondary)
    } else if preceded {
        // A trailing single quote closing nothing is a possessive.
        if secondary_open {
            Token::Close(Level::Secondary)
        } else {
            Token::Apostrophe
        }
    } else {
        Token::Literal
    }
}

/// Replace straight quotes in `text` with the delimiters of `style`.
///
/// The text between quotes is passed through `escape`.
pub fn apply_smart_quotes(
    text: &str,
    style: &QuoteStyle,
    escape: impl Fn(&str) -> String,
) -> Result<String, QuoteMismatch> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut out = String::with_capacity(text.len() + 16);
    let mut stack: Vec<Level> = Vec::new();
    let mut segment_start = 0;
    let mut after_open = false;

    for (i, &(pos, c)) in chars.iter().enumerate() {
        if c != '"' && c != '\'' {
            after_open = false;
            continue;
        }
        let prev = i.checked_sub(1).map(|j| chars[j].1);
        let next = chars.get(i + 1).map(|&(_, n)| n);

        let token = classify(c, prev, next, after_open, stack.contains(&Level::Secondary));
        if token == Token::Literal {
            after_open = false;
            continue;
        }

        out.push_str(&escape(&text[segment_start..pos]));
        segment_start = pos + c.len_utf8();
        after_open = false;

        match token {
            Token::Open(level) => {
                out.push_str(match level {
                    Level::Primary => &style.primary_open,
                    Level::Secondary => &style.secondary_open,
                });
                stack.push(level);
                after_open = true;
            }
            Token::Close(level) => {
                if stack.pop() != Some(level) {
                    return Err(QuoteMismatch { position: pos });
                }
                out.push_str(match level {
                    Level::Primary => &style.primary_close,
                    Level::Secondary => &style.secondary_close,
                });
            }
            Token::Apostrophe => out.push_str(&style.apostrophe),
            Token::Literal => {}
        }
    }

    if !stack.is_empty() {
        return Err(QuoteMismatch {
            position: text.len(),
        });
    }
    out.push_str(&escape(&text[segment_start..]));
    Ok(out)
}
