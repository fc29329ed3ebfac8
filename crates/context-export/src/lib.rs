/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! ConTeXt export for structured document trees.
//!
//! This crate turns a [`Node`] tree, as produced by an external parser, into
//! ConTeXt markup ready for the `context` toolchain.
//!
//! # Architecture
//!
//! - [`transforms`] - Tree rewrites run before rendering (math runs,
//!   annotation stripping)
//! - [`references`] - Reference ids, labels and link resolution
//! - [`table`] - Table layout decisions (sections, roles, widths)
//! - [`context`] - Per-pass mutable state
//! - [`writer`] - Per-node-kind transcoding
//! - [`assemble`] - Zone assembly and the standalone wrapper
//! - [`render`] - The top-level [`render_document`] entry point
//!
//! # Example
//!
//! ```ignore
//! use context_export::{RenderConfig, render_document};
//! use context_export_types::Node;
//!
//! let tree: Node = serde_json::from_str(json)?;
//! let output = render_document(&tree, &RenderConfig::default())?;
//! for warning in &output.warnings {
//!     eprintln!("warning: {}", warning);
//! }
//! std::fs::write("document.tex", output.text)?;
//! ```
//!
//! [`Node`]: context_export_types::Node

pub mod assemble;
pub mod config;
pub mod context;
pub mod error;
pub mod escape;
pub mod format;
pub mod quotes;
pub mod references;
pub mod render;
pub mod table;
pub mod transforms;
pub mod writer;

// Re-export commonly used types
pub use config::{RenderConfig, TableConfig};
pub use context::RenderContext;
pub use error::{RenderError, RenderWarning, Result, WarningKind};
pub use render::{RenderOutput, render_document};
pub use transforms::{TransformPipeline, TreeTransform};
