//! Loader configuration with documented defaults
//!
//! The loader has very few knobs. They mostly control how strictly the
//! author-facing parts of the input (material modification names, the core
//! loading map) are checked.

use serde::Deserialize;
use std::path::Path;

use super::error::{BlueprintError, Result};

/// Configuration for a single blueprint load
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Material modification names that downstream material providers understand
    ///
    /// Names outside this list are still applied to the block instances, but
    /// they are most likely spelling mistakes, so they are reported.
    pub known_material_modifications: Vec<String>,

    /// Reject unknown material modification names instead of warning
    pub strict_material_modifications: bool,

    /// Accept assemblies that are defined but never placed in the core
    pub allow_unplaced_assemblies: bool,

    /// Accept a core loading map with no placements at all
    pub allow_empty_core: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            known_material_modifications: [
                "U235_wt_frac",
                "ZR_wt_frac",
                "B10_wt_frac",
                "class1_wt_frac",
                "class1_custom_isotopics",
                "class2_custom_isotopics",
                "TD_frac",
                "POW_frac",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            strict_material_modifications: false,
            allow_unplaced_assemblies: true,
            allow_empty_core: false,
        }
    }
}

impl LoaderConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML text; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: LoaderConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Whether a material modification name is in the known vocabulary
    pub fn is_known_modification(&self, name: &str) -> bool {
        self.known_material_modifications.iter().any(|m| m == name)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        let mut seen = ahash::AHashSet::new();
        for name in &self.known_material_modifications {
            if name.trim().is_empty() {
                return Err(BlueprintError::InvalidConfig(
                    "known_material_modifications contains an empty name".into(),
                ));
            }
            if !seen.insert(name.as_str()) {
                return Err(BlueprintError::InvalidConfig(format!(
                    "known_material_modifications lists '{}' twice",
                    name
                )));
            }
        }
        Ok(())
    }
}
