/*
 * zone.rs
 * Copyright (c) 2025 Posit, PBC
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named document region that headings can be routed into instead of the
/// main body flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Body,
    Frontmatter,
    Backmatter,
    Appendix,
    Copying,
    Index,
}

impl Zone {
    pub const ALL: [Zone; 6] = [
        Zone::Body,
        Zone::Frontmatter,
        Zone::Backmatter,
        Zone::Appendix,
        Zone::Copying,
        Zone::Index,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Zone::Body => "body",
            Zone::Frontmatter => "frontmatter",
            Zone::Backmatter => "backmatter",
            Zone::Appendix => "appendix",
            Zone::Copying => "copying",
            Zone::Index => "index",
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Zone {
    type Err = String;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Zone::ALL
            .into_iter()
            .find(|zone| zone.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown zone '{}'", s))
    }
}
