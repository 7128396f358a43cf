//! Package documents as served by an npm-style registry.
//!
//! Only the fields the installer needs are modelled; everything else in the
//! document (readme, maintainers, time, ...) is ignored on parse.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, Result};

/// Version selector that stands for `dist-tags.latest`.
pub const LATEST: &str = "latest";

/// Metadata for a single package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageMetadata {
    /// Package name as reported by the registry.
    #[serde(default)]
    pub name: String,
    /// Named version pointers (`latest`, `next`, ...).
    #[serde(default, rename = "dist-tags")]
    pub dist_tags: BTreeMap<String, String>,
    /// Every published version, keyed by exact version string.
    #[serde(default)]
    pub versions: BTreeMap<String, VersionRecord>,
}

/// One published version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dist: Option<Dist>,
}

/// Distribution info for a version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dist {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tarball: Option<String>,
}

impl PackageMetadata {
    /// Parse a registry document.
    pub fn from_json(name: &str, body: &str) -> Result<Self> {
        let mut metadata: PackageMetadata =
            serde_json::from_str(body).map_err(|e| RegistryError::InvalidMetadata {
                name: name.to_string(),
                detail: e.to_string(),
            })?;
        if metadata.name.is_empty() {
            metadata.name = name.to_string();
        }
        Ok(metadata)
    }

    /// The registry's current version, from `dist-tags.latest`.
    pub fn latest_version(&self) -> Option<&str> {
        self.dist_tags.get(LATEST).map(String::as_str)
    }

    /// Map a selector to the exact version it names.
    ///
    /// `"latest"` is replaced by `dist-tags.latest`; anything else is taken
    /// as an exact version string. No range matching is attempted.
    pub fn resolve_version<'a>(&'a self, selector: &'a str) -> Result<&'a str> {
        if selector == LATEST {
            self.latest_version()
                .ok_or_else(|| self.missing_dist(selector))
        } else {
            Ok(selector)
        }
    }

    /// Resolve a selector to the tarball URL of the matching version.
    pub fn resolve_tarball(&self, selector: &str) -> Result<&str> {
        let version = self.resolve_version(selector)?;
        self.versions
            .get(version)
            .and_then(|record| record.dist.as_ref())
            .and_then(|dist| dist.tarball.as_deref())
            .ok_or_else(|| self.missing_dist(version))
    }

    fn missing_dist(&self, version: &str) -> RegistryError {
        RegistryError::MissingDistInfo {
            name: self.name.clone(),
            version: version.to_string(),
        }
    }
}
