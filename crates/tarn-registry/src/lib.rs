//! Package registry client for tarn.
//!
//! Resolves package names to registry documents and tarball URLs, and opens
//! tarball downloads as byte streams. Two backends are provided: an HTTP
//! client for npm-compatible registries and a local directory registry.
//!
//! Version selection is exact: a selector is either `"latest"` (mapped through
//! `dist-tags`) or a published version string.

pub mod client;
pub mod error;
pub mod http;
pub mod metadata;
pub mod name;

// Re-exports for convenience.
pub use client::{LocalRegistry, RegistryBackend, TarballStream};
pub use error::{RegistryError, Result};
pub use http::{HttpRegistry, DEFAULT_REGISTRY};
pub use metadata::{Dist, PackageMetadata, VersionRecord, LATEST};
pub use name::{is_scoped, validate_name};
