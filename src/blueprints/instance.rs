//! Resolved templates and the block instances stamped out of them.
//!
//! Everything in this module holds plain numbers: a reference can no longer
//! appear once a template has been resolved.

use serde::Serialize;
use std::collections::BTreeMap;

use super::expression::AttributeKey;
use super::shape::Shape;
use crate::core::error::{BlueprintError, Result};

/// A component with every dimension reduced to a literal
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedComponent {
    pub name: String,
    pub shape: Shape,
    pub material: String,
    pub t_input: f64,
    pub t_hot: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<String>,
    pub dimensions: BTreeMap<String, f64>,
    /// Material modifications in effect for this component at its position
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub material_modifications: BTreeMap<String, f64>,
}

impl ResolvedComponent {
    pub fn dimension(&self, name: &str) -> Option<f64> {
        self.dimensions.get(name).copied()
    }
}

/// Output of resolving one block template
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTemplate {
    pub name: String,
    pub components: Vec<ResolvedComponent>,
}

impl ResolvedTemplate {
    pub fn component(&self, name: &str) -> Option<&ResolvedComponent> {
        self.components.iter().find(|c| c.name == name)
    }
}

/// Per-position substitutions applied after resolution.
///
/// Each setter overwrites any earlier value for the same field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionOverrides {
    /// Cross-section type tag for the position
    pub xs_type: Option<String>,
    /// Material modifications applied to every component
    pub material_fractions: BTreeMap<String, f64>,
    /// Material modifications for a single component; wins over the block-wide value
    pub component_material_fractions: BTreeMap<String, BTreeMap<String, f64>>,
    /// Literal replacements for resolved dimensions
    pub dimensions: BTreeMap<AttributeKey, f64>,
}

impl PositionOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_xs_type(&mut self, xs_type: impl Into<String>) -> &mut Self {
        self.xs_type = Some(xs_type.into());
        self
    }

    pub fn set_material_fraction(&mut self, name: impl Into<String>, value: f64) -> &mut Self {
        self.material_fractions.insert(name.into(), value);
        self
    }

    pub fn set_component_material_fraction(
        &mut self,
        component: impl Into<String>,
        name: impl Into<String>,
        value: f64,
    ) -> &mut Self {
        self.component_material_fractions
            .entry(component.into())
            .or_default()
            .insert(name.into(), value);
        self
    }

    pub fn set_dimension(&mut self, key: AttributeKey, value: f64) -> &mut Self {
        self.dimensions.insert(key, value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.xs_type.is_none()
            && self.material_fractions.is_empty()
            && self.component_material_fractions.is_empty()
            && self.dimensions.is_empty()
    }
}

/// A fully resolved block at one axial position.
///
/// Owns its components outright; no two instances share data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockInstance {
    /// Name of the template this block was stamped from
    pub template: String,
    /// Cross-section type tag, if one was assigned
    pub xs_type: Option<String>,
    /// Block-wide material modifications
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub material_modifications: BTreeMap<String, f64>,
    pub components: Vec<ResolvedComponent>,
}

impl BlockInstance {
    /// Deep-copy a resolved template and apply position overrides
    pub fn from_template(resolved: &ResolvedTemplate, overrides: &PositionOverrides) -> Result<Self> {
        let mut instance = BlockInstance {
            template: resolved.name.clone(),
            xs_type: None,
            material_modifications: BTreeMap::new(),
            components: resolved.components.clone(),
        };
        instance.apply_overrides(overrides)?;
        Ok(instance)
    }

    /// Apply overrides on top of the current values, last write wins
    pub fn apply_overrides(&mut self, overrides: &PositionOverrides) -> Result<()> {
        for component in overrides.component_material_fractions.keys() {
            if self.component(component).is_none() {
                return Err(BlueprintError::InvalidOverride {
                    target: component.clone(),
                    reason: format!("block '{}' has no such component", self.template),
                });
            }
        }
        for key in overrides.dimensions.keys() {
            let declared = self
                .component(&key.component)
                .is_some_and(|c| c.dimensions.contains_key(&key.attribute));
            if !declared {
                return Err(BlueprintError::InvalidOverride {
                    target: key.to_string(),
                    reason: format!("block '{}' has no such dimension", self.template),
                });
            }
        }

        if let Some(xs_type) = &overrides.xs_type {
            self.xs_type = Some(xs_type.clone());
        }
        for (name, value) in &overrides.material_fractions {
            self.material_modifications.insert(name.clone(), *value);
        }

        for component in &mut self.components {
            for (name, value) in &overrides.material_fractions {
                component.material_modifications.insert(name.clone(), *value);
            }
            if let Some(specific) = overrides.component_material_fractions.get(&component.name) {
                for (name, value) in specific {
                    component.material_modifications.insert(name.clone(), *value);
                }
            }
        }

        for (key, value) in &overrides.dimensions {
            if let Some(component) = self.component_mut(&key.component) {
                component.dimensions.insert(key.attribute.clone(), *value);
            }
        }

        Ok(())
    }

    pub fn component(&self, name: &str) -> Option<&ResolvedComponent> {
        self.components.iter().find(|c| c.name == name)
    }

    pub fn component_mut(&mut self, name: &str) -> Option<&mut ResolvedComponent> {
        self.components.iter_mut().find(|c| c.name == name)
    }

    /// Shorthand for a resolved dimension: `block.dimension("clad", "od")`
    pub fn dimension(&self, component: &str, attribute: &str) -> Option<f64> {
        self.component(component)?.dimension(attribute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved_fuel() -> ResolvedTemplate {
        let component = |name: &str, od: f64| ResolvedComponent {
            name: name.to_string(),
            shape: Shape::Circle,
            material: "UZr".to_string(),
            t_input: 25.0,
            t_hot: 600.0,
            flags: None,
            dimensions: [("od".to_string(), od), ("id".to_string(), 0.0), ("mult".to_string(), 169.0)]
                .into_iter()
                .collect(),
            material_modifications: BTreeMap::new(),
        };
        ResolvedTemplate {
            name: "fuel".to_string(),
            components: vec![component("fuel", 0.76), component("clad", 0.89)],
        }
    }

    #[test]
    fn test_instantiate_without_overrides() {
        let instance = BlockInstance::from_template(&resolved_fuel(), &PositionOverrides::new()).unwrap();
        assert_eq!(instance.template, "fuel");
        assert_eq!(instance.xs_type, None);
        assert!(instance.material_modifications.is_empty());
        assert_eq!(instance.dimension("clad", "od"), Some(0.89));
    }

    #[test]
    fn test_overrides_last_write_wins() {
        let mut overrides = PositionOverrides::new();
        overrides
            .set_xs_type("A")
            .set_xs_type("B")
            .set_material_fraction("U235_wt_frac", 0.1)
            .set_material_fraction("U235_wt_frac", 0.2);
        let instance = BlockInstance::from_template(&resolved_fuel(), &overrides).unwrap();
        assert_eq!(instance.xs_type.as_deref(), Some("B"));
        assert_eq!(instance.material_modifications["U235_wt_frac"], 0.2);
        assert_eq!(
            instance.component("clad").unwrap().material_modifications["U235_wt_frac"],
            0.2
        );
    }

    #[test]
    fn test_component_specific_fraction_wins() {
        let mut overrides = PositionOverrides::new();
        overrides
            .set_material_fraction("ZR_wt_frac", 0.1)
            .set_component_material_fraction("fuel", "ZR_wt_frac", 0.077);
        let instance = BlockInstance::from_template(&resolved_fuel(), &overrides).unwrap();
        assert_eq!(
            instance.component("fuel").unwrap().material_modifications["ZR_wt_frac"],
            0.077
        );
        assert_eq!(
            instance.component("clad").unwrap().material_modifications["ZR_wt_frac"],
            0.1
        );
    }

    #[test]
    fn test_zero_is_a_real_override() {
        let mut overrides = PositionOverrides::new();
        overrides.set_material_fraction("B10_wt_frac", 0.0);
        let instance = BlockInstance::from_template(&resolved_fuel(), &overrides).unwrap();
        assert_eq!(instance.material_modifications.get("B10_wt_frac"), Some(&0.0));
    }

    #[test]
    fn test_dimension_override() {
        let mut overrides = PositionOverrides::new();
        overrides.set_dimension(AttributeKey::new("clad", "od"), 0.95);
        let instance = BlockInstance::from_template(&resolved_fuel(), &overrides).unwrap();
        assert_eq!(instance.dimension("clad", "od"), Some(0.95));
        assert_eq!(instance.dimension("fuel", "od"), Some(0.76));
    }

    #[test]
    fn test_override_unknown_targets() {
        let mut overrides = PositionOverrides::new();
        overrides.set_dimension(AttributeKey::new("clad", "op"), 1.0);
        assert!(matches!(
            BlockInstance::from_template(&resolved_fuel(), &overrides),
            Err(BlueprintError::InvalidOverride { .. })
        ));

        let mut overrides = PositionOverrides::new();
        overrides.set_component_material_fraction("wire", "ZR_wt_frac", 0.1);
        assert!(matches!(
            BlockInstance::from_template(&resolved_fuel(), &overrides),
            Err(BlueprintError::InvalidOverride { .. })
        ));
    }

    #[test]
    fn test_instances_do_not_alias() {
        let resolved = resolved_fuel();
        let first = BlockInstance::from_template(&resolved, &PositionOverrides::new()).unwrap();
        let mut second = BlockInstance::from_template(&resolved, &PositionOverrides::new()).unwrap();
        assert_eq!(first, second);

        second.component_mut("clad").unwrap().dimensions.insert("od".into(), 2.0);
        assert_eq!(first.dimension("clad", "od"), Some(0.89));
        assert_eq!(resolved.component("clad").unwrap().dimensions["od"], 0.89);
        assert_ne!(first, second);
    }
}
