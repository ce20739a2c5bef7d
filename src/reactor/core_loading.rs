//! Core loading map: which assembly sits at which core location.

use ahash::AHashMap;
use serde::Serialize;
use std::collections::BTreeMap;

use super::assembly::AssemblyDefinition;
use super::geometry::CoreGeometry;
use crate::blueprints::instance::BlockInstance;
use crate::core::config::LoaderConfig;
use crate::core::error::{BlueprintError, Result};

/// One entry of the core loading map
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub location: String,
    pub specifier: String,
}

impl Placement {
    pub fn new(location: impl Into<String>, specifier: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            specifier: specifier.into(),
        }
    }
}

/// The fully resolved reactor core model.
///
/// Immutable once composed; everything is exposed through shared references.
#[derive(Debug, Clone, Serialize)]
pub struct CoreLoadingDefinition {
    geometry: CoreGeometry,
    assemblies: Vec<AssemblyDefinition>,
    placements: Vec<Placement>,
    #[serde(skip)]
    by_specifier: AHashMap<String, usize>,
    #[serde(skip)]
    by_name: AHashMap<String, usize>,
}

impl CoreLoadingDefinition {
    /// Bind placements to assemblies.
    ///
    /// Assemblies keep their authoring order, as do placements.
    pub fn compose(
        assemblies: Vec<AssemblyDefinition>,
        placements: Vec<Placement>,
        geometry: CoreGeometry,
        config: &LoaderConfig,
    ) -> Result<Self> {
        let mut errors = Vec::new();

        let mut by_specifier: AHashMap<String, usize> = AHashMap::with_capacity(assemblies.len());
        let mut by_name: AHashMap<String, usize> = AHashMap::with_capacity(assemblies.len());
        for (index, assembly) in assemblies.iter().enumerate() {
            if let Some(&first) = by_specifier.get(assembly.specifier()) {
                errors.push(BlueprintError::DuplicateSpecifier {
                    specifier: assembly.specifier().to_string(),
                    first: assemblies[first].name().to_string(),
                    second: assembly.name().to_string(),
                });
            } else {
                by_specifier.insert(assembly.specifier().to_string(), index);
            }
            by_name.entry(assembly.name().to_string()).or_insert(index);
        }

        let mut seen_locations = ahash::AHashSet::with_capacity(placements.len());
        for placement in &placements {
            if !seen_locations.insert(placement.location.as_str()) {
                errors.push(BlueprintError::DuplicateLocation(placement.location.clone()));
            }
            if !by_specifier.contains_key(&placement.specifier) {
                errors.push(BlueprintError::UnknownSpecifier {
                    location: placement.location.clone(),
                    specifier: placement.specifier.clone(),
                });
            }
        }

        if placements.is_empty() && !config.allow_empty_core {
            errors.push(BlueprintError::structure(
                "core.grid contents",
                "the core loading map places no assemblies",
            ));
        }

        if !config.allow_unplaced_assemblies {
            for assembly in &assemblies {
                if !placements.iter().any(|p| p.specifier == assembly.specifier()) {
                    errors.push(BlueprintError::structure(
                        format!("assemblies.{}", assembly.name()),
                        format!("specifier '{}' is never placed in the core", assembly.specifier()),
                    ));
                }
            }
        }

        if let Some(err) = BlueprintError::collect(errors) {
            return Err(err);
        }

        Ok(Self {
            geometry,
            assemblies,
            placements,
            by_specifier,
            by_name,
        })
    }

    pub fn geometry(&self) -> &CoreGeometry {
        &self.geometry
    }

    /// Assembly definition by specifier
    pub fn assembly(&self, specifier: &str) -> Option<&AssemblyDefinition> {
        self.by_specifier
            .get(specifier)
            .map(|&index| &self.assemblies[index])
    }

    pub fn assembly_by_name(&self, name: &str) -> Option<&AssemblyDefinition> {
        self.by_name.get(name).map(|&index| &self.assemblies[index])
    }

    /// Block at an axial index of the assembly with this specifier
    pub fn block(&self, specifier: &str, axial_index: usize) -> Option<&BlockInstance> {
        self.assembly(specifier)?.block(axial_index)
    }

    /// Assembly placed at a core location
    pub fn assembly_at(&self, location: &str) -> Option<&AssemblyDefinition> {
        let placement = self.placements.iter().find(|p| p.location == location)?;
        self.assembly(&placement.specifier)
    }

    /// Placements in authoring order
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    /// Assemblies in authoring order
    pub fn assemblies(&self) -> &[AssemblyDefinition] {
        &self.assemblies
    }

    pub fn placement_count(&self, specifier: &str) -> usize {
        self.placements
            .iter()
            .filter(|p| p.specifier == specifier)
            .count()
    }

    /// Placement counts for every specifier, including unplaced ones
    pub fn placement_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts: BTreeMap<&str, usize> = self
            .assemblies
            .iter()
            .map(|a| (a.specifier(), 0))
            .collect();
        for placement in &self.placements {
            if let Some(count) = counts.get_mut(placement.specifier.as_str()) {
                *count += 1;
            }
        }
        counts
    }

    /// Total number of block instances over all placed assemblies
    pub fn placed_block_count(&self) -> usize {
        self.placements
            .iter()
            .filter_map(|p| self.assembly(&p.specifier))
            .map(AssemblyDefinition::len)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprints::expression::AttributeValue;
    use crate::blueprints::registry::BlockTemplateRegistry;
    use crate::blueprints::schema::{BlockTemplate, ComponentSpec};
    use crate::blueprints::shape::Shape;
    use crate::reactor::assembly::AssemblyBlueprint;

    fn assemblies(specs: &[(&str, &str)]) -> Vec<AssemblyDefinition> {
        let mut registry = BlockTemplateRegistry::new();
        registry
            .register(
                BlockTemplate::new(
                    "fuel",
                    vec![ComponentSpec::new("fuel", Shape::Circle, "UZr", 25.0, 600.0)
                        .with_dimension("od", AttributeValue::Literal(0.76))],
                )
                .unwrap(),
            )
            .unwrap();

        specs
            .iter()
            .map(|(name, specifier)| {
                let blueprint = AssemblyBlueprint {
                    name: name.to_string(),
                    specifier: specifier.to_string(),
                    blocks: vec!["fuel".into(), "fuel".into()],
                    height: vec![50.0, 50.0],
                    axial_mesh_points: vec![2, 2],
                    xs_types: vec!["A".into(), "B".into()],
                    material_modifications: Vec::new(),
                };
                AssemblyDefinition::build(&blueprint, &mut registry, &LoaderConfig::default())
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_compose_and_lookup() {
        let core = CoreLoadingDefinition::compose(
            assemblies(&[("igniter fuel", "IC"), ("feed fuel", "FC")]),
            vec![
                Placement::new("001-001", "IC"),
                Placement::new("002-001", "FC"),
                Placement::new("002-002", "FC"),
            ],
            CoreGeometry::default(),
            &LoaderConfig::default(),
        )
        .unwrap();

        assert_eq!(core.assembly("IC").unwrap().name(), "igniter fuel");
        assert_eq!(core.assembly_by_name("feed fuel").unwrap().specifier(), "FC");
        assert_eq!(core.assembly_at("002-002").unwrap().specifier(), "FC");
        assert_eq!(core.block("FC", 1).unwrap().xs_type.as_deref(), Some("B"));
        assert!(core.block("FC", 2).is_none());
        assert_eq!(core.placement_count("FC"), 2);
        assert_eq!(core.placement_counts()["IC"], 1);
        assert_eq!(core.placed_block_count(), 6);
        assert_eq!(core.placements()[0].location, "001-001");
        assert_eq!(core.assemblies().len(), 2);
    }

    #[test]
    fn test_unknown_specifier() {
        let err = CoreLoadingDefinition::compose(
            assemblies(&[("feed fuel", "FC")]),
            vec![Placement::new("002-001", "IC")],
            CoreGeometry::default(),
            &LoaderConfig::default(),
        )
        .unwrap_err();
        match err {
            BlueprintError::UnknownSpecifier { location, specifier } => {
                assert_eq!(location, "002-001");
                assert_eq!(specifier, "IC");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_specifier() {
        let err = CoreLoadingDefinition::compose(
            assemblies(&[("igniter fuel", "IC"), ("other fuel", "IC")]),
            vec![Placement::new("001-001", "IC")],
            CoreGeometry::default(),
            &LoaderConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            BlueprintError::DuplicateSpecifier { ref first, ref second, .. }
                if first == "igniter fuel" && second == "other fuel"
        ));
    }

    #[test]
    fn test_duplicate_location() {
        let err = CoreLoadingDefinition::compose(
            assemblies(&[("igniter fuel", "IC")]),
            vec![Placement::new("001-001", "IC"), Placement::new("001-001", "IC")],
            CoreGeometry::default(),
            &LoaderConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, BlueprintError::DuplicateLocation(ref l) if l == "001-001"));
    }

    #[test]
    fn test_empty_core_and_unplaced_assemblies() {
        let defaults = LoaderConfig::default();
        assert!(CoreLoadingDefinition::compose(
            assemblies(&[("igniter fuel", "IC")]),
            Vec::new(),
            CoreGeometry::default(),
            &defaults,
        )
        .is_err());

        let permissive = LoaderConfig {
            allow_empty_core: true,
            ..LoaderConfig::default()
        };
        let core = CoreLoadingDefinition::compose(
            assemblies(&[("igniter fuel", "IC")]),
            Vec::new(),
            CoreGeometry::default(),
            &permissive,
        )
        .unwrap();
        assert_eq!(core.placement_count("IC"), 0);

        let strict = LoaderConfig {
            allow_unplaced_assemblies: false,
            ..LoaderConfig::default()
        };
        let err = CoreLoadingDefinition::compose(
            assemblies(&[("igniter fuel", "IC"), ("feed fuel", "FC")]),
            vec![Placement::new("001-001", "IC")],
            CoreGeometry::default(),
            &strict,
        )
        .unwrap_err();
        assert!(matches!(err, BlueprintError::InvalidStructure { ref context, .. } if context == "assemblies.feed fuel"));
    }

    #[test]
    fn test_output_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CoreLoadingDefinition>();
    }
}
