//! Topological evaluation of block references.
//!
//! Literal nodes seed a work queue. Whenever a node gets a value, every node
//! that copies from it takes the same value and joins the queue. Values are
//! plain copies, so the result does not depend on queue order. Whatever is
//! left afterwards hangs off a cycle.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use super::expression::{AttributeKey, AttributeValue};
use super::graph::DependencyGraph;
use super::instance::{ResolvedComponent, ResolvedTemplate};
use super::schema::BlockTemplate;
use crate::core::error::{BlueprintError, Result};

/// Build the reference graph of a template and evaluate it
pub fn resolve_block(template: &BlockTemplate) -> Result<ResolvedTemplate> {
    let graph = DependencyGraph::build(template)?;
    resolve(template, &graph)
}

/// Evaluate a template against its (already validated) reference graph
pub fn resolve(template: &BlockTemplate, graph: &DependencyGraph) -> Result<ResolvedTemplate> {
    let mut values: BTreeMap<AttributeKey, f64> = BTreeMap::new();
    let mut queue = VecDeque::new();

    for component in template.components() {
        for (attribute, value) in &component.dimensions {
            if let AttributeValue::Literal(v) = value {
                let key = AttributeKey::new(&component.name, attribute);
                values.insert(key.clone(), *v);
                queue.push_back(key);
            }
        }
    }

    while let Some(key) = queue.pop_front() {
        let value = values[&key];
        for dependent in graph.dependents(&key) {
            if !values.contains_key(dependent) {
                values.insert(dependent.clone(), value);
                queue.push_back(dependent.clone());
            }
        }
    }

    let unresolved: BTreeSet<&AttributeKey> = graph
        .edges()
        .map(|(node, _)| node)
        .filter(|node| !values.contains_key(*node))
        .collect();
    if !unresolved.is_empty() {
        let members = cycle_members(&unresolved, graph);
        return Err(BlueprintError::CyclicReference {
            block: template.name().to_string(),
            attributes: members.iter().map(|k| k.to_string()).collect(),
        });
    }

    tracing::debug!(
        block = template.name(),
        references = graph.edge_count(),
        "resolved block template"
    );

    let mut components = Vec::with_capacity(template.len());
    for component in template.components() {
        let mut dimensions = BTreeMap::new();
        for attribute in component.dimensions.keys() {
            let key = AttributeKey::new(&component.name, attribute);
            match values.get(&key) {
                Some(v) => {
                    dimensions.insert(attribute.clone(), *v);
                }
                None => {
                    return Err(BlueprintError::MissingRequiredAttribute {
                        block: template.name().to_string(),
                        component: component.name.clone(),
                        attribute: attribute.clone(),
                    })
                }
            }
        }
        components.push(ResolvedComponent {
            name: component.name.clone(),
            shape: component.shape,
            material: component.material.clone(),
            t_input: component.t_input,
            t_hot: component.t_hot,
            flags: component.flags.clone(),
            dimensions,
            material_modifications: BTreeMap::new(),
        });
    }

    Ok(ResolvedTemplate {
        name: template.name().to_string(),
        components,
    })
}

/// Nodes lying on a cycle among the unresolved set.
///
/// Each node references at most one other node, so following the chain from
/// any unresolved node must eventually revisit a node; the revisited stretch
/// is a cycle. Nodes that only lead into a cycle are not members.
fn cycle_members<'a>(
    unresolved: &BTreeSet<&'a AttributeKey>,
    graph: &'a DependencyGraph,
) -> BTreeSet<&'a AttributeKey> {
    let mut members = BTreeSet::new();
    let mut finished: BTreeSet<&AttributeKey> = BTreeSet::new();

    for &start in unresolved {
        let mut path: Vec<&AttributeKey> = Vec::new();
        let mut position: BTreeMap<&AttributeKey, usize> = BTreeMap::new();
        let mut current = Some(start);

        while let Some(node) = current {
            if finished.contains(node) {
                break;
            }
            if let Some(&index) = position.get(node) {
                members.extend(path[index..].iter().copied());
                break;
            }
            position.insert(node, path.len());
            path.push(node);
            current = graph.dependency(node);
        }

        finished.extend(path);
    }

    members
}
