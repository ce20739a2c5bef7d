//! Assemblies: ordered stacks of block instances with per-position arrays.
//!
//! Every per-position array (height, axial mesh points, xs types, material
//! modifications) must have exactly one entry per block reference.

use serde::Serialize;

use crate::blueprints::expression::AttributeValue;
use crate::blueprints::instance::{BlockInstance, PositionOverrides};
use crate::blueprints::registry::{BlockTemplateRegistry, TemplateId};
use crate::blueprints::schema::as_number;
use crate::core::config::LoaderConfig;
use crate::core::error::{BlueprintError, Result};

pub(crate) const HEIGHT_FIELD: &str = "height";
pub(crate) const MESH_FIELD: &str = "axial mesh points";
pub(crate) const XS_FIELD: &str = "xs types";
pub(crate) const MODIFICATIONS_FIELD: &str = "material modifications";
pub(crate) const BY_COMPONENT_FIELD: &str = "by component";

/// One named material modification array.
///
/// `None` entries mark positions where the modification does not apply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialModification {
    pub name: String,
    /// Restricts the modification to one component of the block
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    pub values: Vec<Option<f64>>,
}

impl MaterialModification {
    pub fn new(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            component: None,
            values,
        }
    }

    pub fn for_component(
        component: impl Into<String>,
        name: impl Into<String>,
        values: Vec<Option<f64>>,
    ) -> Self {
        Self {
            name: name.into(),
            component: Some(component.into()),
            values,
        }
    }

    /// Field name used in error messages
    pub fn field_name(&self) -> String {
        match &self.component {
            None => format!("{}.{}", MODIFICATIONS_FIELD, self.name),
            Some(c) => format!(
                "{}.{}.{}.{}",
                MODIFICATIONS_FIELD, BY_COMPONENT_FIELD, c, self.name
            ),
        }
    }
}

/// An assembly as authored, before any validation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssemblyBlueprint {
    pub name: String,
    pub specifier: String,
    /// Template names, bottom to top
    pub blocks: Vec<String>,
    pub height: Vec<f64>,
    pub axial_mesh_points: Vec<i64>,
    pub xs_types: Vec<String>,
    pub material_modifications: Vec<MaterialModification>,
}

/// Look up a key that may be written with spaces or underscores
pub(crate) fn field<'a>(table: &'a toml::Table, key: &str) -> Option<&'a toml::Value> {
    table
        .get(key)
        .or_else(|| table.get(&key.replace(' ', "_")))
}

fn array<'a>(table: &'a toml::Table, key: &str, context: &str) -> Result<&'a [toml::Value]> {
    match field(table, key) {
        Some(toml::Value::Array(items)) => Ok(items.as_slice()),
        Some(_) => Err(BlueprintError::structure(context, format!("'{}' must be an array", key))),
        None => Err(BlueprintError::structure(context, format!("missing '{}'", key))),
    }
}

fn modification_values(values: &[toml::Value], context: &str) -> Result<Vec<Option<f64>>> {
    values
        .iter()
        .enumerate()
        .map(|(i, raw)| match AttributeValue::parse_value(raw) {
            Ok(None) => Ok(None),
            Ok(Some(AttributeValue::Literal(v))) => Ok(Some(v)),
            Ok(Some(AttributeValue::Reference(key))) => Err(BlueprintError::structure(
                format!("{}[{}]", context, i),
                format!("references such as '{}' are not allowed here", key),
            )),
            Err(e) => Err(BlueprintError::structure(format!("{}[{}]", context, i), e.to_string())),
        })
        .collect()
}

impl AssemblyBlueprint {
    /// Parse one entry of the `assemblies` table
    pub fn from_value(name: &str, value: &toml::Value) -> Result<Self> {
        let context = format!("assemblies.{}", name);
        let table = value
            .as_table()
            .ok_or_else(|| BlueprintError::structure(&context, "assembly must be a table"))?;

        let specifier = match table.get("specifier") {
            Some(toml::Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            Some(_) => {
                return Err(BlueprintError::structure(
                    &context,
                    "specifier must be a non-empty string",
                ))
            }
            None => return Err(BlueprintError::structure(&context, "missing 'specifier'")),
        };

        let blocks = array(table, "blocks", &context)?
            .iter()
            .enumerate()
            .map(|(i, v)| {
                v.as_str().map(str::to_string).ok_or_else(|| {
                    BlueprintError::structure(
                        format!("{}.blocks[{}]", context, i),
                        "block references are template names",
                    )
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let height = array(table, HEIGHT_FIELD, &context)?
            .iter()
            .enumerate()
            .map(|(i, v)| {
                as_number(v).ok_or_else(|| {
                    BlueprintError::structure(
                        format!("{}.{}[{}]", context, HEIGHT_FIELD, i),
                        "must be a number",
                    )
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let axial_mesh_points = array(table, MESH_FIELD, &context)?
            .iter()
            .enumerate()
            .map(|(i, v)| match v {
                toml::Value::Integer(n) => Ok(*n),
                toml::Value::Float(f) if f.fract() == 0.0 => Ok(*f as i64),
                _ => Err(BlueprintError::structure(
                    format!("{}.{}[{}]", context, MESH_FIELD, i),
                    "must be an integer",
                )),
            })
            .collect::<Result<Vec<_>>>()?;

        let xs_types = array(table, XS_FIELD, &context)?
            .iter()
            .enumerate()
            .map(|(i, v)| {
                v.as_str().map(str::to_string).ok_or_else(|| {
                    BlueprintError::structure(
                        format!("{}.{}[{}]", context, XS_FIELD, i),
                        "must be a string",
                    )
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut material_modifications = Vec::new();
        match field(table, MODIFICATIONS_FIELD) {
            None => {}
            Some(toml::Value::Table(mods)) => {
                for (mod_name, mod_value) in mods {
                    let mod_context = format!("{}.{}.{}", context, MODIFICATIONS_FIELD, mod_name);
                    if mod_name == BY_COMPONENT_FIELD || mod_name == "by_component" {
                        let by_component = mod_value.as_table().ok_or_else(|| {
                            BlueprintError::structure(&mod_context, "must be a table")
                        })?;
                        for (component, component_mods) in by_component {
                            let component_table = component_mods.as_table().ok_or_else(|| {
                                BlueprintError::structure(
                                    format!("{}.{}", mod_context, component),
                                    "must be a table",
                                )
                            })?;
                            for (inner_name, inner_value) in component_table {
                                let inner_context =
                                    format!("{}.{}.{}", mod_context, component, inner_name);
                                let values = inner_value.as_array().ok_or_else(|| {
                                    BlueprintError::structure(&inner_context, "must be an array")
                                })?;
                                material_modifications.push(MaterialModification::for_component(
                                    component.clone(),
                                    inner_name.clone(),
                                    modification_values(values, &inner_context)?,
                                ));
                            }
                        }
                        continue;
                    }

                    let values = mod_value
                        .as_array()
                        .ok_or_else(|| BlueprintError::structure(&mod_context, "must be an array"))?;
                    material_modifications.push(MaterialModification::new(
                        mod_name.clone(),
                        modification_values(values, &mod_context)?,
                    ));
                }
            }
            Some(_) => {
                return Err(BlueprintError::structure(
                    &context,
                    format!("'{}' must be a table", MODIFICATIONS_FIELD),
                ))
            }
        }

        Ok(Self {
            name: name.to_string(),
            specifier,
            blocks,
            height,
            axial_mesh_points,
            xs_types,
            material_modifications,
        })
    }
}

/// A validated assembly with one resolved block instance per axial position
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssemblyDefinition {
    name: String,
    specifier: String,
    blocks: Vec<BlockInstance>,
    heights: Vec<f64>,
    axial_mesh_points: Vec<u32>,
    xs_types: Vec<String>,
    material_modifications: Vec<MaterialModification>,
}

impl AssemblyDefinition {
    /// Validate an authored assembly and instantiate its blocks
    pub fn build(
        blueprint: &AssemblyBlueprint,
        registry: &mut BlockTemplateRegistry,
        config: &LoaderConfig,
    ) -> Result<Self> {
        let assembly = blueprint.name.as_str();
        let n = blueprint.blocks.len();
        if n == 0 {
            return Err(BlueprintError::structure(
                format!("assemblies.{}", assembly),
                "an assembly needs at least one block",
            ));
        }

        let mut errors = Vec::new();

        let mut lengths = vec![
            (HEIGHT_FIELD.to_string(), blueprint.height.len()),
            (MESH_FIELD.to_string(), blueprint.axial_mesh_points.len()),
            (XS_FIELD.to_string(), blueprint.xs_types.len()),
        ];
        lengths.extend(
            blueprint
                .material_modifications
                .iter()
                .map(|m| (m.field_name(), m.values.len())),
        );
        for (field, actual) in lengths {
            if actual != n {
                errors.push(BlueprintError::ArrayLengthMismatch {
                    assembly: assembly.to_string(),
                    field,
                    expected: n,
                    actual,
                });
            }
        }

        let mut template_ids: Vec<Option<TemplateId>> = Vec::with_capacity(n);
        let mut reported = ahash::AHashSet::new();
        for template in &blueprint.blocks {
            let id = registry.id_by_name(template);
            if id.is_none() && reported.insert(template.as_str()) {
                errors.push(BlueprintError::UnknownBlockTemplate {
                    assembly: assembly.to_string(),
                    template: template.clone(),
                });
            }
            template_ids.push(id);
        }

        for (position, xs_type) in blueprint.xs_types.iter().enumerate() {
            if xs_type.trim().is_empty() {
                errors.push(BlueprintError::InvalidXsType {
                    assembly: assembly.to_string(),
                    position,
                });
            }
        }

        for (position, &height) in blueprint.height.iter().enumerate() {
            if !(height.is_finite() && height > 0.0) {
                errors.push(BlueprintError::InvalidAxialValue {
                    assembly: assembly.to_string(),
                    field: HEIGHT_FIELD.to_string(),
                    position,
                    value: height,
                });
            }
        }
        for (position, &points) in blueprint.axial_mesh_points.iter().enumerate() {
            if points < 1 || points > i64::from(u32::MAX) {
                errors.push(BlueprintError::InvalidAxialValue {
                    assembly: assembly.to_string(),
                    field: MESH_FIELD.to_string(),
                    position,
                    value: points as f64,
                });
            }
        }

        for modification in &blueprint.material_modifications {
            if config.is_known_modification(&modification.name) {
                continue;
            }
            if config.strict_material_modifications {
                errors.push(BlueprintError::UnknownMaterialModification {
                    assembly: assembly.to_string(),
                    name: modification.name.clone(),
                });
            } else {
                tracing::warn!(
                    assembly,
                    modification = modification.name.as_str(),
                    "material modification is not known to any material and may be misspelled"
                );
            }
        }

        if let Some(err) = BlueprintError::collect(errors) {
            return Err(err);
        }

        let mut blocks = Vec::with_capacity(n);
        for (position, id) in template_ids.into_iter().enumerate() {
            let Some(id) = id else { continue };
            let resolved = registry.resolve(id)?;

            let mut overrides = PositionOverrides::new();
            overrides.set_xs_type(blueprint.xs_types[position].trim());
            for modification in &blueprint.material_modifications {
                let Some(value) = modification.values[position] else {
                    continue;
                };
                match &modification.component {
                    None => overrides.set_material_fraction(&modification.name, value),
                    Some(component) => {
                        overrides.set_component_material_fraction(component, &modification.name, value)
                    }
                };
            }

            let instance = registry.instantiate(&resolved, &overrides).map_err(|e| match e {
                BlueprintError::InvalidOverride { target, reason } => BlueprintError::InvalidOverride {
                    target: format!("{} position {} ({})", assembly, position, target),
                    reason,
                },
                other => other,
            })?;
            blocks.push(instance);
        }

        tracing::debug!(
            assembly,
            specifier = blueprint.specifier.as_str(),
            blocks = blocks.len(),
            "built assembly"
        );

        Ok(Self {
            name: blueprint.name.clone(),
            specifier: blueprint.specifier.clone(),
            blocks,
            heights: blueprint.height.clone(),
            axial_mesh_points: blueprint.axial_mesh_points.iter().map(|&p| p as u32).collect(),
            xs_types: blueprint.xs_types.iter().map(|x| x.trim().to_string()).collect(),
            material_modifications: blueprint.material_modifications.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn specifier(&self) -> &str {
        &self.specifier
    }

    /// Block instances, bottom to top
    pub fn blocks(&self) -> &[BlockInstance] {
        &self.blocks
    }

    pub fn block(&self, position: usize) -> Option<&BlockInstance> {
        self.blocks.get(position)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn heights(&self) -> &[f64] {
        &self.heights
    }

    pub fn axial_mesh_points(&self) -> &[u32] {
        &self.axial_mesh_points
    }

    pub fn xs_types(&self) -> &[String] {
        &self.xs_types
    }

    pub fn material_modifications(&self) -> &[MaterialModification] {
        &self.material_modifications
    }

    /// Block-wide modification array by name
    pub fn modification(&self, name: &str) -> Option<&[Option<f64>]> {
        self.material_modifications
            .iter()
            .find(|m| m.component.is_none() && m.name == name)
            .map(|m| m.values.as_slice())
    }

    pub fn total_height(&self) -> f64 {
        self.heights.iter().sum()
    }

    /// `(bottom, top)` elevation of every block, starting at zero
    pub fn axial_bounds(&self) -> Vec<(f64, f64)> {
        let mut bottom = 0.0;
        self.heights
            .iter()
            .map(|h| {
                let bounds = (bottom, bottom + h);
                bottom += h;
                bounds
            })
            .collect()
    }
}
