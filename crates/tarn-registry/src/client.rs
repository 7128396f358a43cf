//! Registry backend trait and local filesystem implementation.
//!
//! The `RegistryBackend` trait abstracts over different registry implementations
//! (HTTP, local directory). The `LocalRegistry` provides a filesystem-based
//! backend for offline development and testing.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{RegistryError, Result};
use crate::metadata::{Dist, PackageMetadata, VersionRecord, LATEST};
use crate::name::validate_name;

/// A streaming tarball body.
pub type TarballStream = Box<dyn Read>;

/// Abstract registry backend.
///
/// Implementations resolve package documents and open tarball downloads.
pub trait RegistryBackend {
    /// Fetch the metadata document for a package.
    fn fetch_metadata(&self, name: &str) -> Result<PackageMetadata>;

    /// Start downloading a tarball. The body is read lazily.
    fn open_tarball(&self, url: &str) -> Result<TarballStream>;
}

/// A local directory registry for development and testing.
///
/// Layout:
/// ```text
/// <root>/
///   <package-name>/
///     metadata.json
///     <package-name>-<version>.tgz
/// ```
///
/// Tarball URLs in the metadata are `file://` URLs pointing into the root.
pub struct LocalRegistry {
    root: PathBuf,
}

impl LocalRegistry {
    /// Create a local registry rooted at the given directory.
    pub fn new(root: PathBuf) -> Self {
        LocalRegistry { root }
    }

    /// Get the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn package_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Publish a tarball as `name@version` and make it the latest version.
    ///
    /// Returns the tarball URL recorded in the metadata.
    pub fn publish(&self, name: &str, version: &str, tarball: &[u8]) -> Result<String> {
        validate_name(name)?;
        let dir = self.package_dir(name);
        std::fs::create_dir_all(&dir)?;

        let file_stem = name.rsplit('/').next().unwrap_or(name);
        let tarball_path = dir.join(format!("{file_stem}-{version}.tgz"));
        std::fs::write(&tarball_path, tarball)?;
        let url = format!("file://{}", tarball_path.display());

        let mut metadata = match self.fetch_metadata(name) {
            Ok(existing) => existing,
            Err(RegistryError::NotFound { .. }) => PackageMetadata {
                name: name.to_string(),
                ..Default::default()
            },
            Err(e) => return Err(e),
        };
        metadata.versions.insert(
            version.to_string(),
            VersionRecord {
                version: Some(version.to_string()),
                dist: Some(Dist {
                    tarball: Some(url.clone()),
                }),
            },
        );
        metadata
            .dist_tags
            .insert(LATEST.to_string(), version.to_string());
        self.write_metadata(&metadata)?;

        Ok(url)
    }

    /// Overwrite the metadata document for a package as-is.
    pub fn write_metadata(&self, metadata: &PackageMetadata) -> Result<()> {
        let dir = self.package_dir(&metadata.name);
        std::fs::create_dir_all(&dir)?;
        std::fs::write(
            dir.join("metadata.json"),
            serde_json::to_string_pretty(metadata)?,
        )?;
        Ok(())
    }
}

impl RegistryBackend for LocalRegistry {
    fn fetch_metadata(&self, name: &str) -> Result<PackageMetadata> {
        validate_name(name)?;
        let path = self.package_dir(name).join("metadata.json");
        if !path.is_file() {
            return Err(RegistryError::NotFound {
                name: name.to_string(),
            });
        }
        debug!("reading metadata for {name} from {}", path.display());
        let body = std::fs::read_to_string(&path)?;
        PackageMetadata::from_json(name, &body)
    }

    fn open_tarball(&self, url: &str) -> Result<TarballStream> {
        let path = url.strip_prefix("file://").unwrap_or(url);
        let file = File::open(path).map_err(|e| RegistryError::network(url, e))?;
        Ok(Box::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_and_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let registry = LocalRegistry::new(dir.path().to_path_buf());

        let url = registry.publish("test-pkg", "1.0.0", b"fake tgz").unwrap();
        assert!(url.starts_with("file://"));

        let metadata = registry.fetch_metadata("test-pkg").unwrap();
        assert_eq!(metadata.name, "test-pkg");
        assert_eq!(metadata.latest_version(), Some("1.0.0"));
        assert_eq!(metadata.resolve_tarball("1.0.0").unwrap(), url);
    }

    #[test]
    fn publish_moves_latest() {
        let dir = tempfile::tempdir().unwrap();
        let registry = LocalRegistry::new(dir.path().to_path_buf());

        registry.publish("pkg", "1.0.0", b"one").unwrap();
        registry.publish("pkg", "1.1.0", b"two").unwrap();

        let metadata = registry.fetch_metadata("pkg").unwrap();
        assert_eq!(metadata.versions.len(), 2);
        assert_eq!(metadata.latest_version(), Some("1.1.0"));
    }

    #[test]
    fn open_published_tarball() {
        let dir = tempfile::tempdir().unwrap();
        let registry = LocalRegistry::new(dir.path().to_path_buf());

        let url = registry.publish("@scope/pkg", "0.1.0", b"bytes").unwrap();
        let mut body = Vec::new();
        registry
            .open_tarball(&url)
            .unwrap()
            .read_to_end(&mut body)
            .unwrap();
        assert_eq!(body, b"bytes");
    }

    #[test]
    fn fetch_nonexistent() {
        let dir = tempfile::tempdir().unwrap();
        let registry = LocalRegistry::new(dir.path().to_path_buf());

        let result = registry.fetch_metadata("nope");
        assert!(matches!(result, Err(RegistryError::NotFound { .. })));
    }

    #[test]
    fn missing_tarball_is_network_error() {
        let dir = tempfile::tempdir().unwrap();
        let registry = LocalRegistry::new(dir.path().to_path_buf());

        let url = format!("file://{}", dir.path().join("gone.tgz").display());
        assert!(matches!(
            registry.open_tarball(&url),
            Err(RegistryError::Network { .. })
        ));
    }

    #[test]
    fn invalid_name_is_rejected_before_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let registry = LocalRegistry::new(dir.path().to_path_buf());

        assert!(matches!(
            registry.fetch_metadata("../outside"),
            Err(RegistryError::InvalidName { .. })
        ));
    }
}
