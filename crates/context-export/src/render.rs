/*
 * render.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Top-level document rendering.
 */

//! Top-level document rendering.
//!
//! A render pass runs in four steps:
//!
//! 1. The standard [`TransformPipeline`] rewrites a copy of the tree
//! 2. The writer renders the rewritten tree into the body stream, diverting
//!    zone headings into their buffers
//! 3. The assembler combines body and zones through the configured template
//! 4. Unless `body-only` is set, the result is wrapped in a standalone
//!    document
//!
//! Errors abort the pass; no partial output is returned.

use context_export_types::Node;

use crate::assemble::{assemble_document, wrap_document};
use crate::config::RenderConfig;
use crate::context::RenderContext;
use crate::error::{RenderWarning, Result};
use crate::transforms::TransformPipeline;
use crate::writer::render;

/// Output of a successful render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOutput {
    /// The rendered ConTeXt text.
    pub text: String,
    /// Non-fatal warnings collected during rendering.
    pub warnings: Vec<RenderWarning>,
}

/// Render a document tree to ConTeXt.
pub fn render_document(root: &Node, config: &RenderConfig) -> Result<RenderOutput> {
    let pipeline = TransformPipeline::standard();
    let tree = pipeline.execute(root.clone());

    let mut ctx = RenderContext::new(&tree, config);
    let body = render(&tree, &mut ctx)?.unwrap_or_default();
    tracing::debug!(
        bytes = body.len(),
        warnings = ctx.warnings.len(),
        "Rendered body"
    );

    let content = assemble_document(
        &body,
        &ctx.zones,
        config.template.as_deref(),
        &config.templates,
        &mut ctx.warnings,
    );
    let text = if config.body_only {
        content
    } else {
        wrap_document(&content, &tree, &mut ctx)
    };

    Ok(RenderOutput {
        text,
        warnings: ctx.warnings,
    })
}
