//! Register and materialize operations.
//!
//! `register` records intent in the manifest without downloading anything.
//! `materialize` walks the manifest and installs every entry, one at a time,
//! carrying on past failures.

use std::path::{Path, PathBuf};

use tarn_registry::{validate_name, RegistryBackend};
use tracing::{debug, info, warn};

use crate::archive::ArchiveInstaller;
use crate::error::{InstallError, Result};
use crate::manifest::{DependencyGroup, Manifest, ManifestStore};

/// Manifest file name inside a project.
pub const MANIFEST_FILE: &str = "package.json";
/// Dependency store directory inside a project.
pub const STORE_DIR: &str = "node_modules";

/// Where the installer reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallerConfig {
    /// Path of the manifest file.
    pub manifest_path: PathBuf,
    /// Root of the dependency store.
    pub store_root: PathBuf,
}

impl InstallerConfig {
    /// Defaults for a project directory: `package.json` and `node_modules`.
    pub fn for_project(dir: &Path) -> Self {
        InstallerConfig {
            manifest_path: dir.join(MANIFEST_FILE),
            store_root: dir.join(STORE_DIR),
        }
    }

    /// Use a different manifest file.
    pub fn manifest_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest_path = path.into();
        self
    }

    /// Use a different dependency store root.
    pub fn store_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_root = path.into();
        self
    }
}

/// One package to resolve and install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionRequest {
    pub name: String,
    /// `"latest"` or an exact version.
    pub selector: String,
    /// Group the selector was taken from.
    pub group: DependencyGroup,
}

/// A dependency recorded by [`Installer::register`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registered {
    pub name: String,
    pub version: String,
    pub group: DependencyGroup,
}

/// Outcome of installing one manifest entry.
#[derive(Debug)]
pub struct PackageOutcome {
    pub request: ResolutionRequest,
    /// Store entry on success.
    pub result: Result<PathBuf>,
}

/// Per-package results of [`Installer::materialize`], in install order.
#[derive(Debug, Default)]
pub struct MaterializeReport {
    pub outcomes: Vec<PackageOutcome>,
}

impl MaterializeReport {
    pub fn installed(&self) -> impl Iterator<Item = &PackageOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = &PackageOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    /// True when every entry installed (vacuously true for an empty manifest).
    pub fn is_success(&self) -> bool {
        self.failed().next().is_none()
    }
}

/// Merge both dependency groups into one ordered resolution set.
///
/// `dependencies` come first, then `devDependencies`, each in file order. A
/// name listed in both
/// groups appears once, at its `dependencies` position, with the
/// `devDependencies` selector.
pub fn resolution_set(manifest: &Manifest) -> Vec<ResolutionRequest> {
    let mut set: Vec<ResolutionRequest> = manifest
        .group(DependencyGroup::Dependencies)
        .map(|(name, selector)| ResolutionRequest {
            name: name.to_string(),
            selector: selector.to_string(),
            group: DependencyGroup::Dependencies,
        })
        .collect();

    for (name, selector) in manifest.group(DependencyGroup::DevDependencies) {
        match set.iter_mut().find(|r| r.name == name) {
            Some(existing) => {
                warn!(
                    "{name} is listed in dependencies ({}) and devDependencies ({selector}); using devDependencies",
                    existing.selector
                );
                existing.selector = selector.to_string();
                existing.group = DependencyGroup::DevDependencies;
            }
            None => set.push(ResolutionRequest {
                name: name.to_string(),
                selector: selector.to_string(),
                group: DependencyGroup::DevDependencies,
            }),
        }
    }
    set
}

/// Ties the registry, manifest store, and archive installer together.
pub struct Installer {
    registry: Box<dyn RegistryBackend>,
    manifest: ManifestStore,
    store: ArchiveInstaller,
}

impl Installer {
    pub fn new(config: InstallerConfig, registry: Box<dyn RegistryBackend>) -> Self {
        Installer {
            registry,
            manifest: ManifestStore::new(config.manifest_path),
            store: ArchiveInstaller::new(config.store_root),
        }
    }

    pub fn manifest_store(&self) -> &ManifestStore {
        &self.manifest
    }

    pub fn archive_installer(&self) -> &ArchiveInstaller {
        &self.store
    }

    /// Record `name` at the registry's latest version. Nothing is downloaded.
    ///
    /// The manifest is left untouched if any step fails.
    pub fn register(&self, name: &str, dev: bool) -> Result<Registered> {
        validate_name(name)?;
        let metadata = self.registry.fetch_metadata(name)?;
        let version = metadata
            .latest_version()
            .ok_or_else(|| tarn_registry::RegistryError::MissingDistInfo {
                name: name.to_string(),
                version: tarn_registry::LATEST.to_string(),
            })?
            .to_string();
        debug!("{name} latest is {version}");

        self.manifest.update(name, &version, dev)?;
        Ok(Registered {
            name: name.to_string(),
            version,
            group: DependencyGroup::from_dev(dev),
        })
    }

    /// Install every manifest entry.
    ///
    /// Fails only if the manifest cannot be loaded; per-package failures are
    /// collected in the report.
    pub fn materialize(&self) -> Result<MaterializeReport> {
        let manifest = self.manifest.load()?;
        let set = resolution_set(&manifest);
        info!("installing {} packages", set.len());

        let mut report = MaterializeReport::default();
        for request in set {
            let result = self.install_one(&request);
            if let Err(e) = &result {
                warn!("failed to install {}@{}: {e}", request.name, request.selector);
            }
            report.outcomes.push(PackageOutcome { request, result });
        }
        Ok(report)
    }

    fn install_one(&self, request: &ResolutionRequest) -> Result<PathBuf> {
        let metadata = self.registry.fetch_metadata(&request.name)?;
        let url = metadata.resolve_tarball(&request.selector)?;
        info!("installing {}@{} from {url}", request.name, request.selector);
        self.store.install(self.registry.as_ref(), url, &request.name)
    }

    /// Dispatch a decoded front-end request.
    pub fn handle(&self, request: Request) -> Result<Response> {
        match request {
            Request::Register { name, dev } => self.register(&name, dev).map(Response::Registered),
            Request::Materialize => self.materialize().map(Response::Materialized),
        }
    }
}

/// An operation requested by a front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Register { name: String, dev: bool },
    Materialize,
}

/// Result of a handled [`Request`].
#[derive(Debug)]
pub enum Response {
    Registered(Registered),
    Materialized(MaterializeReport),
}

/// Operation words accepted by interactive front ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Install,
}

impl std::str::FromStr for Operation {
    type Err = InstallError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "add" => Ok(Operation::Add),
            "install" => Ok(Operation::Install),
            _ => Err(InstallError::UnknownOperation {
                input: s.trim().to_string(),
            }),
        }
    }
}
