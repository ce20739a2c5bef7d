//! Load a core model from a TOML blueprint document
//!
//! This module provides `BlueprintLoader` which runs the whole pipeline:
//! block templates, assemblies, core geometry and the core loading map.

use std::path::Path;

use super::assembly::{field, AssemblyBlueprint, AssemblyDefinition};
use super::core_loading::{CoreLoadingDefinition, Placement};
use super::geometry::{CoreGeometry, GeomType, SymmetryType};
use crate::blueprints::registry::BlockTemplateRegistry;
use crate::core::config::LoaderConfig;
use crate::core::error::{BlueprintError, Result};

const REQUIRED_SECTIONS: [&str; 3] = ["blocks", "assemblies", "core"];

/// Sections other tools read from the same document
const SKIPPED_SECTIONS: [&str; 2] = ["nuclide flags", "custom isotopics"];

/// Sections that can carry a loading map this loader does not read
const UNSUPPORTED_SECTIONS: [&str; 2] = ["systems", "grids"];

const GRID_CONTENTS: &str = "grid contents";
const LATTICE_MAP: &str = "lattice map";

/// Lattice map token for an empty position
const EMPTY_POSITION: &str = "-";

/// Loader that turns a blueprint document into a `CoreLoadingDefinition`
pub struct BlueprintLoader<'a> {
    config: &'a LoaderConfig,
}

impl<'a> BlueprintLoader<'a> {
    /// Create a new loader with the given configuration
    pub fn new(config: &'a LoaderConfig) -> Self {
        Self { config }
    }

    /// Load a core model from a TOML string
    pub fn load_from_str(&self, content: &str) -> Result<CoreLoadingDefinition> {
        let document: toml::Value = toml::from_str(content)?;
        self.load_document(&document)
    }

    /// Load a core model from a TOML file on disk
    pub fn load_file(&self, path: &Path) -> Result<CoreLoadingDefinition> {
        let content = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "read blueprint file");
        self.load_from_str(&content)
    }

    /// Load a core model from an already parsed document
    pub fn load_document(&self, document: &toml::Value) -> Result<CoreLoadingDefinition> {
        let root = document
            .as_table()
            .ok_or_else(|| BlueprintError::structure("document", "top level must be a table"))?;

        let mut unsupported = Vec::new();
        for key in root.keys() {
            let key = key.as_str();
            if REQUIRED_SECTIONS.contains(&key) {
                continue;
            }
            let spaced = key.replace('_', " ");
            if SKIPPED_SECTIONS.contains(&spaced.as_str()) {
                tracing::debug!(section = key, "skipping section");
            } else if UNSUPPORTED_SECTIONS.contains(&key) {
                unsupported.push(BlueprintError::structure(
                    key,
                    "separate grid and system definitions are not supported; \
                     put the loading map under [core] as 'grid contents' or 'lattice map'",
                ));
            } else {
                tracing::warn!(section = key, "ignoring unknown section");
            }
        }
        if let Some(err) = BlueprintError::collect(unsupported) {
            return Err(err);
        }

        let missing: Vec<BlueprintError> = REQUIRED_SECTIONS
            .iter()
            .filter(|s| !root.contains_key(**s))
            .map(|s| BlueprintError::MissingSection(s.to_string()))
            .collect();
        if let Some(err) = BlueprintError::collect(missing) {
            return Err(err);
        }

        let blocks = section(root, "blocks")?;
        let assemblies = section(root, "assemblies")?;
        let core = section(root, "core")?;

        // One registry per load; nothing is shared between loads
        let mut registry = BlockTemplateRegistry::new();
        registry.register_all(blocks)?;
        registry.resolve_all()?;

        let definitions = self.build_assemblies(assemblies, &mut registry)?;
        let geometry = parse_geometry(core)?;
        let placements = parse_placements(core)?;

        let model = CoreLoadingDefinition::compose(definitions, placements, geometry, self.config)?;

        tracing::info!(
            templates = registry.len(),
            resolutions = registry.resolution_count(),
            assemblies = model.assemblies().len(),
            placements = model.placements().len(),
            geom = %model.geometry().geom,
            symmetry = %model.geometry().symmetry,
            "loaded core blueprints"
        );

        Ok(model)
    }

    fn build_assemblies(
        &self,
        assemblies: &toml::Table,
        registry: &mut BlockTemplateRegistry,
    ) -> Result<Vec<AssemblyDefinition>> {
        let mut definitions = Vec::with_capacity(assemblies.len());
        let mut errors = Vec::new();

        for (name, value) in assemblies {
            let built = AssemblyBlueprint::from_value(name, value)
                .and_then(|bp| AssemblyDefinition::build(&bp, registry, self.config));
            match built {
                Ok(definition) => definitions.push(definition),
                Err(e) => errors.push(e),
            }
        }

        match BlueprintError::collect(errors) {
            Some(err) => Err(err),
            None => Ok(definitions),
        }
    }
}

/// Load a core model from a TOML string
pub fn load_from_str(content: &str, config: &LoaderConfig) -> Result<CoreLoadingDefinition> {
    BlueprintLoader::new(config).load_from_str(content)
}

/// Load a core model from a TOML file on disk
pub fn load_file(path: &Path, config: &LoaderConfig) -> Result<CoreLoadingDefinition> {
    BlueprintLoader::new(config).load_file(path)
}

/// Load a core model from an already parsed document
pub fn load_document(document: &toml::Value, config: &LoaderConfig) -> Result<CoreLoadingDefinition> {
    BlueprintLoader::new(config).load_document(document)
}

fn section<'t>(root: &'t toml::Table, name: &str) -> Result<&'t toml::Table> {
    root.get(name)
        .ok_or_else(|| BlueprintError::MissingSection(name.to_string()))?
        .as_table()
        .ok_or_else(|| BlueprintError::structure(name, "section must be a table"))
}

fn optional_str<'t>(table: &'t toml::Table, key: &str, context: &str) -> Result<Option<&'t str>> {
    match table.get(key) {
        None => Ok(None),
        Some(toml::Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(BlueprintError::structure(context, format!("'{}' must be a string", key))),
    }
}

fn parse_geometry(core: &toml::Table) -> Result<CoreGeometry> {
    let geom = match optional_str(core, "geom", "core")? {
        Some(raw) => raw.parse::<GeomType>()?,
        None => GeomType::default(),
    };
    let symmetry = match optional_str(core, "symmetry", "core")? {
        Some(raw) => raw.parse::<SymmetryType>()?,
        None => SymmetryType::full_core(),
    };
    CoreGeometry::new(geom, symmetry)
}

fn parse_placements(core: &toml::Table) -> Result<Vec<Placement>> {
    match (field(core, GRID_CONTENTS), field(core, LATTICE_MAP)) {
        (None, None) => Ok(Vec::new()),
        (Some(contents), None) => parse_grid_contents(contents),
        (None, Some(toml::Value::String(map))) => parse_lattice_map(map),
        (None, Some(_)) => Err(BlueprintError::structure(
            "core",
            format!("'{}' must be a string", LATTICE_MAP),
        )),
        (Some(_), Some(_)) => Err(BlueprintError::structure(
            "core",
            format!("give either '{}' or '{}', not both", GRID_CONTENTS, LATTICE_MAP),
        )),
    }
}

fn parse_grid_contents(contents: &toml::Value) -> Result<Vec<Placement>> {
    let contents = contents.as_table().ok_or_else(|| {
        BlueprintError::structure("core", format!("'{}' must be a table", GRID_CONTENTS))
    })?;

    contents
        .iter()
        .map(|(location, specifier)| match specifier {
            toml::Value::String(s) if !s.trim().is_empty() => {
                Ok(Placement::new(location.trim(), s.trim()))
            }
            _ => Err(BlueprintError::structure(
                format!("core.{}.{}", GRID_CONTENTS, location),
                "placement must name an assembly specifier",
            )),
        })
        .collect()
}

/// Read an ASCII loading map, one row of specifiers per line.
///
/// The bottom line is row 1 and columns count from 1 at the left, giving
/// locations `RRR-CCC`. `-` marks an empty position.
fn parse_lattice_map(map: &str) -> Result<Vec<Placement>> {
    let rows: Vec<&str> = map.lines().filter(|line| !line.trim().is_empty()).collect();
    let mut placements = Vec::new();

    for (index, line) in rows.iter().enumerate() {
        let row = rows.len() - index;
        for (column, token) in line.split_whitespace().enumerate() {
            if token == EMPTY_POSITION {
                continue;
            }
            placements.push(Placement::new(format!("{:03}-{:03}", row, column + 1), token));
        }
    }

    Ok(placements)
}
