//! Assemblies, the core loading map, and the document loader

pub mod assembly;
pub mod core_loading;
pub mod geometry;
pub mod loader;

pub use assembly::{AssemblyBlueprint, AssemblyDefinition, MaterialModification};
pub use core_loading::{CoreLoadingDefinition, Placement};
pub use geometry::{BoundaryType, CoreGeometry, DomainType, GeomType, SymmetryType};
pub use loader::{load_document, load_file, load_from_str, BlueprintLoader};
