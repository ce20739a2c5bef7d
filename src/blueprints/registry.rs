//! Block template registry.
//!
//! This module provides the `BlockTemplateRegistry` which owns the block
//! templates of one load, resolves each template at most once, and stamps out
//! independent block instances for every axial position that uses it.

use ahash::AHashMap;
use serde::Serialize;
use std::rc::Rc;

use super::instance::{BlockInstance, PositionOverrides, ResolvedTemplate};
use super::resolver;
use super::schema::BlockTemplate;
use crate::core::error::{BlueprintError, Result};

/// Identity of a registered template.
///
/// Every usage site naming the same template shares this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TemplateId(pub u32);

/// Registry for the block templates of a single load
pub struct BlockTemplateRegistry {
    /// Templates indexed by ID
    templates: AHashMap<TemplateId, BlockTemplate>,
    /// Map from name to ID for fast lookup
    by_name: AHashMap<String, TemplateId>,
    /// Memoized resolutions
    resolved: AHashMap<TemplateId, Rc<ResolvedTemplate>>,
    /// Next template ID to assign
    next_id: u32,
    /// How many times a template was actually resolved
    resolutions: usize,
}

impl BlockTemplateRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            templates: AHashMap::new(),
            by_name: AHashMap::new(),
            resolved: AHashMap::new(),
            next_id: 1,
            resolutions: 0,
        }
    }

    /// Register a template and return its assigned ID
    pub fn register(&mut self, template: BlockTemplate) -> Result<TemplateId> {
        if self.by_name.contains_key(template.name()) {
            return Err(BlueprintError::DuplicateBlockTemplate(
                template.name().to_string(),
            ));
        }

        let id = TemplateId(self.next_id);
        self.next_id += 1;

        self.by_name.insert(template.name().to_string(), id);
        self.templates.insert(id, template);

        Ok(id)
    }

    /// Parse and register every template of a `blocks` table.
    ///
    /// Problems in different blocks are reported together.
    pub fn register_all(&mut self, blocks: &toml::Table) -> Result<Vec<TemplateId>> {
        let mut ids = Vec::with_capacity(blocks.len());
        let mut errors = Vec::new();

        for (name, value) in blocks {
            match BlockTemplate::from_value(name, value).and_then(|t| self.register(t)) {
                Ok(id) => ids.push(id),
                Err(e) => errors.push(e),
            }
        }

        match BlueprintError::collect(errors) {
            Some(err) => Err(err),
            None => Ok(ids),
        }
    }

    /// Get a template by ID
    pub fn get(&self, id: TemplateId) -> Option<&BlockTemplate> {
        self.templates.get(&id)
    }

    /// Get a template by name
    pub fn get_by_name(&self, name: &str) -> Option<&BlockTemplate> {
        self.by_name
            .get(name)
            .and_then(|id| self.templates.get(id))
    }

    /// Get template ID by name
    pub fn id_by_name(&self, name: &str) -> Option<TemplateId> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Resolve a template, reusing the earlier result if there is one
    pub fn resolve(&mut self, id: TemplateId) -> Result<Rc<ResolvedTemplate>> {
        if let Some(resolved) = self.resolved.get(&id) {
            return Ok(Rc::clone(resolved));
        }

        let template = self.templates.get(&id).ok_or_else(|| {
            BlueprintError::structure("block templates", format!("no template with {:?}", id))
        })?;
        let resolved = Rc::new(resolver::resolve_block(template)?);
        self.resolutions += 1;
        self.resolved.insert(id, Rc::clone(&resolved));

        Ok(resolved)
    }

    /// Resolve every registered template
    pub fn resolve_all(&mut self) -> Result<()> {
        let mut ids: Vec<TemplateId> = self.templates.keys().copied().collect();
        ids.sort();
        let mut errors = Vec::new();
        for id in ids {
            if let Err(e) = self.resolve(id) {
                errors.push(e);
            }
        }
        match BlueprintError::collect(errors) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Create an independent block instance from a resolved template
    pub fn instantiate(
        &self,
        resolved: &ResolvedTemplate,
        overrides: &PositionOverrides,
    ) -> Result<BlockInstance> {
        let instance = BlockInstance::from_template(resolved, overrides)?;
        tracing::trace!(
            block = resolved.name.as_str(),
            xs_type = ?instance.xs_type,
            "instantiated block"
        );
        Ok(instance)
    }

    /// Number of resolutions actually performed (memoized calls excluded)
    pub fn resolution_count(&self) -> usize {
        self.resolutions
    }
}

impl Default for BlockTemplateRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprints::expression::AttributeValue;
    use crate::blueprints::schema::ComponentSpec;
    use crate::blueprints::shape::Shape;

    fn create_test_template(name: &str) -> BlockTemplate {
        BlockTemplate::new(
            name,
            vec![
                ComponentSpec::new("fuel", Shape::Circle, "UZr", 25.0, 600.0)
                    .with_dimension("od", AttributeValue::Literal(0.76))
                    .with_dimension("mult", AttributeValue::Literal(169.0)),
                ComponentSpec::new("clad", Shape::Circle, "HT9", 25.0, 450.0)
                    .with_dimension("id", AttributeValue::Literal(0.808))
                    .with_dimension("od", AttributeValue::Literal(0.89))
                    .with_dimension("mult", AttributeValue::reference("fuel", "mult")),
                ComponentSpec::new("bond", Shape::Circle, "Sodium", 450.0, 450.0)
                    .with_dimension("id", AttributeValue::reference("fuel", "od"))
                    .with_dimension("od", AttributeValue::reference("clad", "id"))
                    .with_dimension("mult", AttributeValue::reference("fuel", "mult")),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = BlockTemplateRegistry::new();
        let id = registry.register(create_test_template("fuel")).unwrap();

        assert_eq!(registry.get(id).unwrap().name(), "fuel");
        assert_eq!(registry.get_by_name("fuel").unwrap().len(), 3);
        assert_eq!(registry.id_by_name("fuel"), Some(id));
        assert_eq!(registry.id_by_name("plenum"), None);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = BlockTemplateRegistry::new();
        registry.register(create_test_template("fuel")).unwrap();
        assert!(matches!(
            registry.register(create_test_template("fuel")),
            Err(BlueprintError::DuplicateBlockTemplate(ref n)) if n == "fuel"
        ));
    }

    #[test]
    fn test_resolve_is_memoized() {
        let mut registry = BlockTemplateRegistry::new();
        let id = registry.register(create_test_template("fuel")).unwrap();

        let first = registry.resolve(id).unwrap();
        let second = registry.resolve(id).unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(registry.resolution_count(), 1);

        let bond = first.component("bond").unwrap();
        assert_eq!(bond.dimensions["id"], 0.76);
        assert_eq!(bond.dimensions["od"], 0.808);
        assert_eq!(bond.dimensions["mult"], 169.0);
    }

    #[test]
    fn test_resolve_all() {
        let mut registry = BlockTemplateRegistry::new();
        registry.register(create_test_template("fuel")).unwrap();
        registry.register(create_test_template("fuel2")).unwrap();
        registry.resolve_all().unwrap();
        registry.resolve_all().unwrap();
        assert_eq!(registry.resolution_count(), 2);
    }

    #[test]
    fn test_instantiate_twice_is_independent() {
        let mut registry = BlockTemplateRegistry::new();
        let id = registry.register(create_test_template("fuel")).unwrap();
        let resolved = registry.resolve(id).unwrap();

        let mut overrides = PositionOverrides::new();
        overrides.set_xs_type("A");
        let mut lower = registry.instantiate(&resolved, &overrides).unwrap();
        let upper = registry.instantiate(&resolved, &overrides).unwrap();
        assert_eq!(lower, upper);

        lower.component_mut("bond").unwrap().dimensions.insert("od".into(), 1.5);
        lower.xs_type = Some("Z".into());
        assert_eq!(upper.dimension("bond", "od"), Some(0.808));
        assert_eq!(upper.xs_type.as_deref(), Some("A"));
    }

    #[test]
    fn test_register_all_from_table() {
        let table: toml::Table = toml::from_str(
            r#"
[plenum.clad]
shape = "Circle"
material = "HT9"
Tinput = 25.0
Thot = 450.0
id = 0.808
od = 0.89

[plenum.gap]
shape = "Circle"
material = "Void"
Tinput = 450.0
Thot = 450.0
od = "clad.id"

[broken.pin]
shape = "Circle"
material = "UZr"
Tinput = 25.0
Thot = 600.0

[broken2.pin]
shape = "Blob"
material = "UZr"
Tinput = 25.0
Thot = 600.0
"#,
        )
        .unwrap();

        let mut registry = BlockTemplateRegistry::new();
        let err = registry.register_all(&table).unwrap_err();
        assert_eq!(err.flatten().len(), 2);
        // The valid block is still registered
        assert!(registry.id_by_name("plenum").is_some());
    }
}
