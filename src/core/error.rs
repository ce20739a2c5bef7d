use thiserror::Error;

/// Errors raised while loading and resolving core blueprints.
///
/// Every variant aborts the load; none of them is retryable.
#[derive(Error, Debug)]
pub enum BlueprintError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing required section '{0}'")]
    MissingSection(String),

    #[error("Invalid structure in {context}: {message}")]
    InvalidStructure { context: String, message: String },

    #[error("Invalid attribute expression {raw:?} for {block}/{component}.{attribute}")]
    InvalidAttributeExpression {
        block: String,
        component: String,
        attribute: String,
        raw: String,
    },

    #[error("Dangling reference in block '{block}': {component}.{attribute} -> {target}")]
    DanglingReference {
        block: String,
        component: String,
        attribute: String,
        target: String,
    },

    #[error("Cyclic reference in block '{block}': {{{}}}", .attributes.join(", "))]
    CyclicReference {
        block: String,
        /// Sorted `component.attribute` names lying on a cycle
        attributes: Vec<String>,
    },

    #[error("Unknown shape '{shape}' for component '{component}' in block '{block}'")]
    UnknownShape {
        block: String,
        component: String,
        shape: String,
    },

    #[error("Missing required attribute '{attribute}' on {block}/{component}")]
    MissingRequiredAttribute {
        block: String,
        component: String,
        attribute: String,
    },

    #[error("Attribute '{attribute}' is not defined for the shape of {block}/{component}")]
    UnknownAttribute {
        block: String,
        component: String,
        attribute: String,
    },

    #[error("Duplicate component '{component}' in block '{block}'")]
    DuplicateComponent { block: String, component: String },

    #[error("Duplicate block template '{0}'")]
    DuplicateBlockTemplate(String),

    #[error("Assembly '{assembly}' references unknown block template '{template}'")]
    UnknownBlockTemplate { assembly: String, template: String },

    #[error("Array length mismatch in assembly '{assembly}': {field} has {actual} entries, expected {expected}")]
    ArrayLengthMismatch {
        assembly: String,
        field: String,
        expected: usize,
        actual: usize,
    },

    #[error("Assembly '{assembly}' has an empty xs type at position {position}")]
    InvalidXsType { assembly: String, position: usize },

    #[error("Assembly '{assembly}' has invalid {field} value {value} at position {position}")]
    InvalidAxialValue {
        assembly: String,
        field: String,
        position: usize,
        value: f64,
    },

    #[error("Invalid override '{target}': {reason}")]
    InvalidOverride { target: String, reason: String },

    #[error("Unknown material modification '{name}' in assembly '{assembly}'")]
    UnknownMaterialModification { assembly: String, name: String },

    #[error("Duplicate assembly specifier '{specifier}' ('{first}' and '{second}')")]
    DuplicateSpecifier {
        specifier: String,
        first: String,
        second: String,
    },

    #[error("Core location '{location}' references unknown specifier '{specifier}'")]
    UnknownSpecifier { location: String, specifier: String },

    #[error("Core location '{0}' is placed more than once")]
    DuplicateLocation(String),

    #[error("Invalid core geometry: {0}")]
    InvalidGeometry(String),

    #[error("Invalid loader configuration: {0}")]
    InvalidConfig(String),

    #[error("{} errors: {}", .0.len(), .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<BlueprintError>),
}

impl BlueprintError {
    /// Fold accumulated errors into a single error.
    ///
    /// Returns `None` when there is nothing to report, the error itself when
    /// there is exactly one, and `Multiple` otherwise.
    pub fn collect(mut errors: Vec<BlueprintError>) -> Option<BlueprintError> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(BlueprintError::Multiple(errors)),
        }
    }

    /// Flatten into the list of leaf errors.
    pub fn flatten(self) -> Vec<BlueprintError> {
        match self {
            BlueprintError::Multiple(errors) => {
                errors.into_iter().flat_map(BlueprintError::flatten).collect()
            }
            other => vec![other],
        }
    }

    pub(crate) fn structure(context: impl Into<String>, message: impl Into<String>) -> Self {
        BlueprintError::InvalidStructure {
            context: context.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BlueprintError>;
