/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error and warning types for rendering.
//!
//! Errors abort the whole render; warnings are collected on the render
//! context and returned alongside the output.

use std::fmt;
use thiserror::Error;

/// Fatal rendering errors. No partial document is produced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    /// A link, radio target, id or footnote label resolves to nothing.
    #[error("Unresolved {kind} reference: {target}")]
    Reference { kind: String, target: String },

    /// A code-line reference is missing from its code block.
    #[error("Code reference '{label}' not found")]
    CodeRefNotFound { label: String },
}

impl RenderError {
    pub fn reference(kind: impl Into<String>, target: impl Into<String>) -> Self {
        RenderError::Reference {
            kind: kind.into(),
            target: target.into(),
        }
    }

    pub fn coderef(label: impl Into<String>) -> Self {
        RenderError::CodeRefNotFound {
            label: label.into(),
        }
    }
}

/// Result type for rendering operations.
pub type Result<T> = std::result::Result<T, RenderError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// Smart quotes could not be balanced; the text was emitted unprocessed.
    QuoteMismatch,
    /// The configured template does not exist; the built-in one was used.
    MissingTemplate,
    /// A requested snippet does not exist and was skipped.
    UnknownSnippet,
}

/// A non-fatal condition recovered from during rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderWarning {
    pub kind: WarningKind,
    pub message: String,
}

impl RenderWarning {
    pub fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for RenderWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}
