//! Install pipeline error types.

use std::fmt;
use std::path::{Path, PathBuf};

use tarn_registry::RegistryError;

/// Errors that can occur while registering or materializing packages.
#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    /// Registry lookup or download failure.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Manifest or dependency store read/write/extraction failure.
    #[error("filesystem error at {path}: {detail}")]
    FileSystem { path: PathBuf, detail: String },

    /// The manifest exists but is not a JSON object of the expected shape.
    #[error("invalid manifest {path}: {detail}")]
    InvalidManifest { path: PathBuf, detail: String },

    /// An operation name that the front end does not know.
    #[error("unknown command '{input}' (expected 'add' or 'install')")]
    UnknownOperation { input: String },
}

/// Coarse classification of an [`InstallError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    MissingDistInfo,
    Network,
    FileSystem,
    InvalidName,
    InvalidMetadata,
    UnknownOperation,
}

impl InstallError {
    pub(crate) fn fs(path: &Path, detail: impl fmt::Display) -> Self {
        InstallError::FileSystem {
            path: path.to_path_buf(),
            detail: detail.to_string(),
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            InstallError::Registry(e) => match e {
                RegistryError::NotFound { .. } => ErrorKind::NotFound,
                RegistryError::MissingDistInfo { .. } => ErrorKind::MissingDistInfo,
                RegistryError::Network { .. } => ErrorKind::Network,
                RegistryError::InvalidMetadata { .. } | RegistryError::Json(_) => {
                    ErrorKind::InvalidMetadata
                }
                RegistryError::InvalidName { .. } => ErrorKind::InvalidName,
                RegistryError::Io(_) => ErrorKind::FileSystem,
            },
            InstallError::FileSystem { .. } | InstallError::InvalidManifest { .. } => {
                ErrorKind::FileSystem
            }
            InstallError::UnknownOperation { .. } => ErrorKind::UnknownOperation,
        }
    }
}

/// Result type alias for install operations.
pub type Result<T> = std::result::Result<T, InstallError>;
