//! Per-block reference graph.
//!
//! Nodes are `(component, attribute)` pairs. An edge `a -> b` means `a` copies
//! its value from `b`. Every reference target is checked before anything is
//! evaluated, so a malformed block is rejected the same way whatever order the
//! resolver would have picked.

use std::collections::BTreeMap;

use super::expression::{AttributeKey, AttributeValue};
use super::schema::BlockTemplate;
use crate::core::error::{BlueprintError, Result};

/// Reference edges of one block, in both directions
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    depends_on: BTreeMap<AttributeKey, AttributeKey>,
    dependents: BTreeMap<AttributeKey, Vec<AttributeKey>>,
}

impl DependencyGraph {
    /// Build the graph for a template, reporting every dangling reference at once
    pub fn build(template: &BlockTemplate) -> Result<Self> {
        let mut graph = DependencyGraph::default();
        let mut errors = Vec::new();

        for component in template.components() {
            for (attribute, value) in &component.dimensions {
                let AttributeValue::Reference(target) = value else {
                    continue;
                };

                let declared = template
                    .component(&target.component)
                    .is_some_and(|c| c.shape.declares(&target.attribute));
                if !declared {
                    errors.push(BlueprintError::DanglingReference {
                        block: template.name().to_string(),
                        component: component.name.clone(),
                        attribute: attribute.clone(),
                        target: target.to_string(),
                    });
                    continue;
                }

                let node = AttributeKey::new(&component.name, attribute);
                graph
                    .dependents
                    .entry(target.clone())
                    .or_default()
                    .push(node.clone());
                graph.depends_on.insert(node, target.clone());
            }
        }

        match BlueprintError::collect(errors) {
            Some(err) => Err(err),
            None => Ok(graph),
        }
    }

    /// The node `key` copies from, if it is a reference
    pub fn dependency(&self, key: &AttributeKey) -> Option<&AttributeKey> {
        self.depends_on.get(key)
    }

    /// Nodes that copy from `key`
    pub fn dependents(&self, key: &AttributeKey) -> &[AttributeKey] {
        self.dependents.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All reference edges as `(node, target)`
    pub fn edges(&self) -> impl Iterator<Item = (&AttributeKey, &AttributeKey)> {
        self.depends_on.iter()
    }

    pub fn edge_count(&self) -> usize {
        self.depends_on.len()
    }

    pub fn is_empty(&self) -> bool {
        self.depends_on.is_empty()
    }
}
