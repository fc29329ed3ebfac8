/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Document tree type definitions for the ConTeXt exporter.
 *
 * This crate provides pure data type definitions for the document tree
 * handed to the renderer by an external parser. It has minimal
 * dependencies (serde, hashlink) so that parsers can build trees without
 * pulling in the rendering engine.
 */

pub mod kind;
pub mod node;
pub mod property;
pub mod zone;

// Re-export commonly used types at the crate root
pub use kind::NodeKind;
pub use node::{Node, Nodes};
pub use property::{Properties, PropertyValue};
pub use zone::Zone;
