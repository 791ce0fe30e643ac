//! Error types for cloud-catalog

use thiserror::Error;

/// Main error type for catalog loading and queries
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Invalid catalog: {0}")]
    Validation(#[from] ValidationError),

    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Unsupported catalog format: {0}")]
    UnsupportedFormat(String),

    #[error("Catalog already initialized")]
    AlreadyInitialized,

    #[error("Catalog not initialized")]
    NotInitialized,
}

impl CatalogError {
    /// Create a not-found error
    pub fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            key: key.into(),
        }
    }

    /// True for lookups that missed, which callers may recover from
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Malformed or contradictory catalog content
///
/// Every variant carries the document path of the offending element,
/// e.g. `clouds[2].instanceTypes[0].versions[1]`.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("{path}: missing or empty required field '{field}'")]
    MissingField { path: String, field: &'static str },

    #[error("{path}: keystoneHostname '{hostname}' already used by {first}")]
    DuplicateHostname {
        path: String,
        hostname: String,
        first: String,
    },

    #[error("{path}: more than one version marked primary ({first}, {second})")]
    MultiplePrimaryVersions {
        path: String,
        first: String,
        second: String,
    },

    #[error("{path}: imageFilters must be either {{uuid}} or {{name, visibility}}: {reason}")]
    InvalidImageFilter { path: String, reason: String },

    #[error("{path}: unknown image visibility '{value}'")]
    UnknownVisibility { path: String, value: String },

    #[error("{path}: restrictFlavorIds must be null or non-empty")]
    EmptyRestrictFlavorIds { path: String },

    #[error("{path}: invalid flavor pattern '{pattern}': {source}")]
    InvalidFlavorPattern {
        path: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("{path}: imageExcludeFilter needs both filterKey and filterValue")]
    IncompleteExcludeFilter { path: String },
}

impl ValidationError {
    /// Create a missing field error
    pub fn missing(path: impl Into<String>, field: &'static str) -> Self {
        Self::MissingField {
            path: path.into(),
            field,
        }
    }

    /// Create an image filter error
    pub fn image_filter(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidImageFilter {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
