/*
 * transforms/mod.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Tree rewrite passes run before rendering.
 */

//! Tree rewrite passes run before rendering.
//!
//! - [`TreeTransform`] - The trait implemented by all passes
//! - [`TransformPipeline`] - Ordered collection of passes to execute
//!
//! Passes consume a tree and return the rewritten one; the renderer only
//! ever sees the final tree. Every pass is idempotent: running it on its
//! own output returns an identical tree.
//!
//! The standard pipeline runs, in order:
//!
//! - [`MathRunTransform`] - Wraps adjacent inline math in one math-run node
//! - [`AnnotationTransform`] - Strips Texinfo-style annotations from metadata

mod annotations;
mod math_runs;

pub use annotations::{AnnotationTransform, strip_annotations};
pub use math_runs::{MathRunTransform, is_math_like};

use context_export_types::Node;

/// A pure tree-to-tree rewrite.
pub trait TreeTransform {
    /// Human-readable name for this pass.
    ///
    /// Used for logging and debugging.
    fn name(&self) -> &str;

    /// Rewrite `root`, returning the new tree.
    fn transform(&self, root: Node) -> Node;
}

/// A pipeline of passes, executed in insertion order.
pub struct TransformPipeline {
    transforms: Vec<Box<dyn TreeTransform>>,
}

impl TransformPipeline {
    /// Create a new empty pipeline.
    pub fn new() -> Self {
        Self {
            transforms: Vec::new(),
        }
    }

    /// The passes every render runs, in their fixed order.
    pub fn standard() -> Self {
        let mut pipeline = Self::new();
        pipeline.push(Box::new(MathRunTransform));
        pipeline.push(Box::new(AnnotationTransform));
        pipeline
    }

    /// Add a pass to the pipeline.
    pub fn push(&mut self, transform: Box<dyn TreeTransform>) {
        self.transforms.push(transform);
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Run every pass in order.
    pub fn execute(&self, root: Node) -> Node {
        self.transforms.iter().fold(root, |tree, transform| {
            tracing::debug!(transform = transform.name(), "Running transform");
            transform.transform(tree)
        })
    }

    /// List the names of all passes in execution order.
    pub fn transform_names(&self) -> Vec<&str> {
        self.transforms.iter().map(|t| t.name()).collect()
    }
}

impl Default for TransformPipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Rebuild `node` bottom-up, applying `rewrite` to every child list
/// (children, title and caption) after their own descendants were rebuilt.
///
/// `descend` decides whether a node's contents are visited at all.
pub(crate) fn rebuild(
    mut node: Node,
    descend: &impl Fn(&Node) -> bool,
    rewrite: &impl Fn(Vec<Node>) -> Vec<Node>,
) -> Node {
    if !descend(&node) {
        return node;
    }
    let rebuild_all = |nodes: Vec<Node>| -> Vec<Node> {
        let nodes = nodes
            .into_iter()
            .map(|child| rebuild(child, descend, rewrite))
            .collect();
        rewrite(nodes)
    };
    node.children = rebuild_all(std::mem::take(&mut node.children));
    node.title = rebuild_all(std::mem::take(&mut node.title));
    node.caption = node.caption.take().map(&rebuild_all);
    node
}
