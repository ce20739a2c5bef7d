//! Block and component definitions as authored.
//!
//! A block template is an ordered list of components. Component dimensions are
//! kept as [`AttributeValue`]s until the resolver turns them into literals.

use std::collections::BTreeMap;

use super::expression::AttributeValue;
use super::shape::Shape;
use crate::core::error::{BlueprintError, Result};

/// Keys of a component table that are not dimensions
const SHAPE_KEY: &str = "shape";
const MATERIAL_KEY: &str = "material";
const T_INPUT_KEY: &str = "Tinput";
const T_HOT_KEY: &str = "Thot";
const FLAGS_KEY: &str = "flags";

/// One geometric/material piece of a block
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentSpec {
    /// Unique within the owning block
    pub name: String,
    pub shape: Shape,
    /// Material name, interpreted by an external material provider
    pub material: String,
    /// Input (cold) temperature
    pub t_input: f64,
    /// Hot operating temperature
    pub t_hot: f64,
    /// Optional free-form flag string
    pub flags: Option<String>,
    /// Dimension name -> authored value
    pub dimensions: BTreeMap<String, AttributeValue>,
}

impl ComponentSpec {
    pub fn new(
        name: impl Into<String>,
        shape: Shape,
        material: impl Into<String>,
        t_input: f64,
        t_hot: f64,
    ) -> Self {
        Self {
            name: name.into(),
            shape,
            material: material.into(),
            t_input,
            t_hot,
            flags: None,
            dimensions: BTreeMap::new(),
        }
    }

    pub fn with_dimension(mut self, name: impl Into<String>, value: AttributeValue) -> Self {
        self.dimensions.insert(name.into(), value);
        self
    }

    pub fn with_flags(mut self, flags: impl Into<String>) -> Self {
        self.flags = Some(flags.into());
        self
    }

    pub fn dimension(&self, name: &str) -> Option<&AttributeValue> {
        self.dimensions.get(name)
    }

    /// Check the dimensions against the shape vocabulary and fill defaults.
    fn finalize(mut self, block: &str) -> std::result::Result<Self, Vec<BlueprintError>> {
        let mut errors = Vec::new();

        for name in self.dimensions.keys() {
            if !self.shape.declares(name) {
                errors.push(BlueprintError::UnknownAttribute {
                    block: block.to_string(),
                    component: self.name.clone(),
                    attribute: name.clone(),
                });
            }
        }

        for spec in self.shape.dimensions() {
            if self.dimensions.contains_key(spec.name) {
                continue;
            }
            match spec.default {
                Some(default) => {
                    self.dimensions
                        .insert(spec.name.to_string(), AttributeValue::Literal(default));
                }
                None => errors.push(BlueprintError::MissingRequiredAttribute {
                    block: block.to_string(),
                    component: self.name.clone(),
                    attribute: spec.name.to_string(),
                }),
            }
        }

        if errors.is_empty() {
            Ok(self)
        } else {
            Err(errors)
        }
    }

    /// Parse one component table from the configuration tree
    fn from_value(
        block: &str,
        name: &str,
        value: &toml::Value,
    ) -> std::result::Result<Self, Vec<BlueprintError>> {
        let context = format!("blocks.{}.{}", block, name);
        let table = value
            .as_table()
            .ok_or_else(|| vec![BlueprintError::structure(&context, "component must be a table")])?;

        let mut errors = Vec::new();
        let missing = |attribute: &str| BlueprintError::MissingRequiredAttribute {
            block: block.to_string(),
            component: name.to_string(),
            attribute: attribute.to_string(),
        };

        let shape = match table.get(SHAPE_KEY) {
            Some(toml::Value::String(s)) => match s.parse::<Shape>() {
                Ok(shape) => Some(shape),
                Err(_) => {
                    errors.push(BlueprintError::UnknownShape {
                        block: block.to_string(),
                        component: name.to_string(),
                        shape: s.clone(),
                    });
                    None
                }
            },
            Some(_) => {
                errors.push(BlueprintError::structure(&context, "shape must be a string"));
                None
            }
            None => {
                errors.push(missing(SHAPE_KEY));
                None
            }
        };

        let material = match table.get(MATERIAL_KEY) {
            Some(toml::Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
            Some(_) => {
                errors.push(BlueprintError::structure(
                    &context,
                    "material must be a non-empty string",
                ));
                None
            }
            None => {
                errors.push(missing(MATERIAL_KEY));
                None
            }
        };

        let mut temperature = |key: &str| match table.get(key) {
            Some(v) => match as_number(v) {
                Some(t) => Some(t),
                None => {
                    errors.push(BlueprintError::structure(
                        &context,
                        format!("{} must be a number", key),
                    ));
                    None
                }
            },
            None => {
                errors.push(missing(key));
                None
            }
        };
        let t_input = temperature(T_INPUT_KEY);
        let t_hot = temperature(T_HOT_KEY);

        let flags = match table.get(FLAGS_KEY) {
            Some(toml::Value::String(s)) => Some(s.clone()),
            Some(_) => {
                errors.push(BlueprintError::structure(&context, "flags must be a string"));
                None
            }
            None => None,
        };

        let mut dimensions = BTreeMap::new();
        for (key, raw) in table {
            if matches!(
                key.as_str(),
                SHAPE_KEY | MATERIAL_KEY | T_INPUT_KEY | T_HOT_KEY | FLAGS_KEY
            ) {
                continue;
            }
            match AttributeValue::parse_value(raw) {
                Ok(Some(value)) => {
                    dimensions.insert(key.clone(), value);
                }
                // Empty sentinel: leave the dimension to its default
                Ok(None) => {}
                Err(e) => errors.push(BlueprintError::InvalidAttributeExpression {
                    block: block.to_string(),
                    component: name.to_string(),
                    attribute: key.clone(),
                    raw: e.raw,
                }),
            }
        }

        match (shape, material, t_input, t_hot) {
            (Some(shape), Some(material), Some(t_input), Some(t_hot)) if errors.is_empty() => {
                let mut spec = ComponentSpec::new(name, shape, material, t_input, t_hot);
                spec.flags = flags;
                spec.dimensions = dimensions;
                Ok(spec)
            }
            _ => Err(errors),
        }
    }
}

/// One block definition as authored, shared by every position that names it
#[derive(Debug, Clone, PartialEq)]
pub struct BlockTemplate {
    name: String,
    components: Vec<ComponentSpec>,
}

impl BlockTemplate {
    /// Build a template, validating every component against its shape.
    ///
    /// All component-level problems of the block are reported together.
    pub fn new(name: impl Into<String>, components: Vec<ComponentSpec>) -> Result<Self> {
        Self::assemble(name.into(), components.into_iter().map(Ok))
    }

    /// Parse a block table (`component name -> component table`)
    pub fn from_value(name: &str, value: &toml::Value) -> Result<Self> {
        let table = value.as_table().ok_or_else(|| {
            BlueprintError::structure(format!("blocks.{}", name), "block must be a table")
        })?;

        Self::assemble(
            name.to_string(),
            table.iter().map(|(component_name, component_value)| {
                ComponentSpec::from_value(name, component_name, component_value)
            }),
        )
    }

    /// Finalize every component that parsed, keeping the errors of those that did not
    fn assemble(
        name: String,
        components: impl IntoIterator<Item = std::result::Result<ComponentSpec, Vec<BlueprintError>>>,
    ) -> Result<Self> {
        let mut errors = Vec::new();
        let mut finalized: Vec<ComponentSpec> = Vec::new();
        let mut seen = ahash::AHashSet::new();

        for component in components {
            let component = match component {
                Ok(c) => c,
                Err(mut e) => {
                    errors.append(&mut e);
                    continue;
                }
            };
            if !seen.insert(component.name.clone()) {
                errors.push(BlueprintError::DuplicateComponent {
                    block: name.clone(),
                    component: component.name.clone(),
                });
                continue;
            }
            match component.finalize(&name) {
                Ok(c) => finalized.push(c),
                Err(mut e) => errors.append(&mut e),
            }
        }

        match BlueprintError::collect(errors) {
            Some(err) => Err(err),
            None => Ok(Self {
                name,
                components: finalized,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Components in authoring order
    pub fn components(&self) -> &[ComponentSpec] {
        &self.components
    }

    pub fn component(&self, name: &str) -> Option<&ComponentSpec> {
        self.components.iter().find(|c| c.name == name)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

pub(crate) fn as_number(value: &toml::Value) -> Option<f64> {
    match value {
        toml::Value::Integer(i) => Some(*i as f64),
        toml::Value::Float(f) if f.is_finite() => Some(*f),
        _ => None,
    }
}
