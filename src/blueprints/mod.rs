//! Block templates and in-block reference resolution
//!
//! Components inside a block may take a dimension from another component of
//! the same block (`bond.od = "clad.id"`). This module parses those values,
//! builds the per-block reference graph, resolves it, and stamps resolved
//! templates out into independent block instances.

pub mod expression;
pub mod graph;
pub mod instance;
pub mod registry;
pub mod resolver;
pub mod schema;
pub mod shape;

pub use expression::{AttributeKey, AttributeValue, ExpressionError};
pub use graph::DependencyGraph;
pub use instance::*;
pub use registry::{BlockTemplateRegistry, TemplateId};
pub use resolver::resolve_block;
pub use schema::{BlockTemplate, ComponentSpec};
pub use shape::{DimensionSpec, Shape};
