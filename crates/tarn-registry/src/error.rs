//! Registry error types.

/// Errors that can occur while talking to a package registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The registry has no record for this package.
    #[error("package not found: {name}")]
    NotFound { name: String },

    /// The version record is absent or carries no tarball URL.
    #[error("no dist information for '{name}@{version}'")]
    MissingDistInfo { name: String, version: String },

    /// Transport-level failure or unexpected HTTP status.
    #[error("network error fetching {url}: {detail}")]
    Network { url: String, detail: String },

    /// The registry answered, but not with a package document.
    #[error("invalid metadata for '{name}': {detail}")]
    InvalidMetadata { name: String, detail: String },

    /// The package name cannot be used as a registry key or store path.
    #[error("invalid package name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RegistryError {
    /// Build a [`RegistryError::Network`] for `url`.
    pub fn network(url: &str, detail: impl ToString) -> Self {
        RegistryError::Network {
            url: url.to_string(),
            detail: detail.to_string(),
        }
    }
}

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
