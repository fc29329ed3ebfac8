/*
 * property.rs
 * Copyright (c) 2025 Posit, PBC
 */

use hashlink::LinkedHashMap;
use serde::{Deserialize, Serialize};

/// Property map of a node. Insertion order is the order the parser saw the
/// properties in, which keeps serialized trees stable.
pub type Properties = LinkedHashMap<String, PropertyValue>;

/// A single property value.
///
/// Serialized untagged so that JSON trees can use plain scalars:
/// `{"level": 1, "unnumbered": true, "todo": "TODO", "tags": ["a", "b"]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Flag(bool),
    Number(i64),
    Text(String),
    List(Vec<String>),
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numbers are also accepted in their textual form, since some parsers
    /// keep every keyword value as a string.
    pub fn as_number(&self) -> Option<i64> {
        match self {
            PropertyValue::Number(n) => Some(*n),
            PropertyValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Truthiness of a flag-like property.
    ///
    /// - `Flag(b)` is `b`
    /// - `Number(n)` is `n != 0`
    /// - `Text` is true unless empty, `"nil"`, `"no"` or `"false"`
    /// - `List` is true when non-empty
    pub fn is_truthy(&self) -> bool {
        match self {
            PropertyValue::Flag(b) => *b,
            PropertyValue::Number(n) => *n != 0,
            PropertyValue::Text(s) => {
                let s = s.trim();
                !(s.is_empty()
                    || s.eq_ignore_ascii_case("nil")
                    || s.eq_ignore_ascii_case("no")
                    || s.eq_ignore_ascii_case("false"))
            }
            PropertyValue::List(items) => !items.is_empty(),
        }
    }

    /// List view. A single text value is treated as a one-element list.
    pub fn as_list(&self) -> Vec<&str> {
        match self {
            PropertyValue::List(items) => items.iter().map(String::as_str).collect(),
            PropertyValue::Text(s) if !s.is_empty() => vec![s.as_str()],
            _ => Vec::new(),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Text(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Flag(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Number(value)
    }
}

impl From<Vec<String>> for PropertyValue {
    fn from(value: Vec<String>) -> Self {
        PropertyValue::List(value)
    }
}
