//! Core Blueprints - reactor core model loading with in-block reference resolution

pub mod blueprints;
pub mod core;
pub mod reactor;

pub use crate::core::{BlueprintError, LoaderConfig, Result};
pub use crate::reactor::{load_document, load_file, load_from_str, CoreLoadingDefinition};
