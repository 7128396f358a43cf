//! Tarball download, extraction, and promotion into the dependency store.
//!
//! Layout:
//! ```text
//! <store_root>/
//!   <package-name>/        — promoted package contents
//!   @scope/<package-name>/ — scoped packages
//!   .staging-XXXXXX/       — per-attempt extraction area, removed afterwards
//! ```
//!
//! A package directory only ever appears under its final name through a
//! single rename, after extraction has fully succeeded.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tarn_registry::{is_scoped, validate_name, RegistryBackend, RegistryError};
use tracing::{debug, info, warn};

use crate::error::{InstallError, Result};

const STAGING_PREFIX: &str = ".staging-";
/// Top-level directory npm tarballs wrap their contents in.
const PACKAGE_DIR: &str = "package";

/// Installs package tarballs into a dependency store directory.
#[derive(Debug, Clone)]
pub struct ArchiveInstaller {
    root: PathBuf,
}

impl ArchiveInstaller {
    /// Create an installer for the store rooted at `root`.
    pub fn new(root: PathBuf) -> Self {
        ArchiveInstaller { root }
    }

    /// Get the store root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory a package is installed to.
    pub fn entry_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Whether a package currently has a store entry.
    pub fn is_installed(&self, name: &str) -> bool {
        self.entry_path(name).is_dir()
    }

    /// Download `tarball_url` through `registry` and install it as `name`.
    ///
    /// Returns the path of the store entry.
    pub fn install(
        &self,
        registry: &dyn RegistryBackend,
        tarball_url: &str,
        name: &str,
    ) -> Result<PathBuf> {
        validate_name(name)?;
        self.ensure_root()?;
        let stream = registry.open_tarball(tarball_url)?;
        self.install_stream(stream, tarball_url, name)
    }

    /// Extract a gzip tar stream and install it as `name`.
    ///
    /// Read errors from `stream` are reported as network errors against
    /// `source_url`; everything else is a filesystem error.
    pub fn install_stream<R: Read>(&self, stream: R, source_url: &str, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        self.ensure_root()?;

        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(&self.root)
            .map_err(|e| InstallError::fs(&self.root, format!("creating staging directory: {e}")))?;
        let unpacked = staging.path().join("unpacked");
        debug!("extracting {name} into {}", unpacked.display());

        let mut source = SourceReader::new(stream);
        let extracted = {
            let mut archive = tar::Archive::new(GzDecoder::new(&mut source));
            archive.set_overwrite(true);
            archive.unpack(&unpacked)
        };
        if let Err(e) = extracted {
            return Err(match source.failure.take() {
                Some(read_err) => RegistryError::network(source_url, read_err).into(),
                None => InstallError::fs(&unpacked, format!("extracting archive: {e}")),
            });
        }

        let content = content_root(&unpacked)?;
        let dest = self.promote(&content, staging.path(), name)?;

        // Removing the staging directory also removes any replaced entry.
        discard_staging(staging);

        info!("installed {name} into {}", dest.display());
        Ok(dest)
    }

    fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root)
            .map_err(|e| InstallError::fs(&self.root, format!("creating dependency store: {e}")))
    }

    /// Rename `content` to the package's final location.
    ///
    /// An existing entry is moved into `staging` first and restored if the
    /// rename fails, so the final name is never left half-written.
    fn promote(&self, content: &Path, staging: &Path, name: &str) -> Result<PathBuf> {
        let dest = self.entry_path(name);
        if is_scoped(name) {
            if let Some(scope_dir) = dest.parent() {
                fs::create_dir_all(scope_dir)
                    .map_err(|e| InstallError::fs(scope_dir, format!("creating scope directory: {e}")))?;
            }
        }

        let replaced = staging.join("replaced");
        let had_previous = dest.exists();
        if had_previous {
            warn!("replacing existing installation of {name}");
            fs::rename(&dest, &replaced)
                .map_err(|e| InstallError::fs(&dest, format!("moving previous installation aside: {e}")))?;
        }

        if let Err(e) = fs::rename(content, &dest) {
            if had_previous {
                if let Err(restore) = fs::rename(&replaced, &dest) {
                    warn!("could not restore previous installation of {name}: {restore}");
                }
            }
            return Err(InstallError::fs(&dest, format!("promoting package: {e}")));
        }
        Ok(dest)
    }
}

/// The directory whose contents become the package.
///
/// npm tarballs wrap everything in a top-level `package/` directory; when it
/// is present only its contents are installed and any sibling entries are
/// dropped. Archives without it are installed as-is.
fn content_root(unpacked: &Path) -> Result<PathBuf> {
    let wrapper = unpacked.join(PACKAGE_DIR);
    if wrapper.is_dir() {
        return Ok(wrapper);
    }

    let mut entries = fs::read_dir(unpacked)
        .map_err(|e| InstallError::fs(unpacked, format!("reading extracted archive: {e}")))?;
    match entries.next() {
        None => Err(InstallError::fs(unpacked, "archive contains no files")),
        Some(Err(e)) => Err(InstallError::fs(unpacked, format!("reading extracted archive: {e}"))),
        Some(Ok(_)) => Ok(unpacked.to_path_buf()),
    }
}

/// Remove an install attempt's staging directory.
///
/// Runs after promotion, so a failure here only leaves a stray staging
/// directory behind; it never undoes the install.
fn discard_staging(staging: tempfile::TempDir) {
    let path = staging.path().to_path_buf();
    if let Err(e) = staging.close() {
        warn!("could not remove staging directory {}: {e}", path.display());
    }
}

/// Remembers the first error raised by the download stream, so it can be
/// told apart from decompression and filesystem errors.
struct SourceReader<R> {
    inner: R,
    failure: Option<io::Error>,
}

impl<R: Read> SourceReader<R> {
    fn new(inner: R) -> Self {
        SourceReader {
            inner,
            failure: None,
        }
    }
}

impl<R: Read> Read for SourceReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.inner.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Err(e),
            Err(e) => {
                let relayed = io::Error::new(e.kind(), e.to_string());
                self.failure.get_or_insert(e);
                Err(relayed)
            }
        }
    }
}
