//! Install pipeline for tarn.
//!
//! - [`manifest`] — `package.json` load/save and single-entry updates
//! - [`archive`] — streaming tarball extraction into the dependency store
//! - [`orchestrator`] — the `register` and `materialize` operations and the
//!   typed request surface front ends dispatch through
//!
//! Everything runs sequentially on the calling thread. The manifest assumes a
//! single writer.

pub mod archive;
pub mod error;
pub mod manifest;
pub mod orchestrator;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

// Re-exports for convenience.
pub use archive::ArchiveInstaller;
pub use error::{ErrorKind, InstallError, Result};
pub use manifest::{DependencyGroup, Manifest, ManifestStore};
pub use orchestrator::{
    resolution_set, Installer, InstallerConfig, MaterializeReport, Operation, PackageOutcome,
    Registered, Request, ResolutionRequest, Response, MANIFEST_FILE, STORE_DIR,
};
