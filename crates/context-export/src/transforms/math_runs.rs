/*
 * math_runs.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Transform that merges adjacent inline math into math runs.
 */

//! Math-run merging.
//!
//! Inline math written back to back (`$a$$b$`, or `$x$` directly followed
//! by a subscript) must end up in a single `\m{…}`, otherwise ConTeXt sets
//! the pieces as separate formulas. This pass wraps every maximal run of
//! two or more math-like objects, where no member but the last is followed
//! by a blank, into a [`NodeKind::MathRun`] container.
//!
//! The container takes the last member's `post_blank`. Existing math runs
//! are never descended into, which makes the pass idempotent.

use context_export_types::{Node, NodeKind};

use super::{TreeTransform, rebuild};

pub struct MathRunTransform;

impl TreeTransform for MathRunTransform {
    fn name(&self) -> &str {
        "math-runs"
    }

    fn transform(&self, root: Node) -> Node {
        rebuild(root, &|node| node.kind != NodeKind::MathRun, &merge_runs)
    }
}

/// Objects that can join a math run.
///
/// Inline math counts only in its inline forms (`$…$`, `\(…\)`); display
/// math stands alone.
pub fn is_math_like(node: &Node) -> bool {
    match node.kind {
        NodeKind::InlineMath => {
            let value = node.value().trim();
            (value.starts_with("\\(") && value.ends_with("\\)"))
                || (value.starts_with('$') && !value.starts_with("$$") && value.len() > 1)
        }
        NodeKind::Subscript | NodeKind::Superscript => true,
        NodeKind::Entity => node.flag("math"),
        _ => false,
    }
}

fn merge_runs(nodes: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    let mut run: Vec<Node> = Vec::new();

    for node in nodes {
        if is_math_like(&node) {
            let joins = run.last().is_some_and(|last| last.post_blank == 0);
            if !joins {
                flush(&mut run, &mut out);
            }
            run.push(node);
        } else {
            flush(&mut run, &mut out);
            out.push(node);
        }
    }
    flush(&mut run, &mut out);
    out
}

fn flush(run: &mut Vec<Node>, out: &mut Vec<Node>) {
    if run.len() < 2 {
        out.append(run);
        return;
    }
    let members = std::mem::take(run);
    let post_blank = members.last().map_or(0, |last| last.post_blank);
    out.push(
        Node::new(NodeKind::MathRun)
            .with_children(members)
            .with_post_blank(post_blank),
    );
}
