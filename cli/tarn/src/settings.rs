//! Front-end configuration.
//!
//! Values are layered, later sources winning:
//! built-in defaults < `tarn.toml` in the project directory < `TARN_REGISTRY`
//! environment variable < command-line flags.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tarn_install::{Installer, InstallerConfig};
use tarn_registry::{HttpRegistry, LocalRegistry, RegistryBackend, DEFAULT_REGISTRY};

/// Name of the optional per-project settings file.
pub const SETTINGS_FILE: &str = "tarn.toml";
/// Environment variable overriding the registry.
pub const REGISTRY_ENV: &str = "TARN_REGISTRY";

/// Contents of `tarn.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    /// Registry URL or local registry directory.
    #[serde(default)]
    registry: Option<String>,
    /// Manifest path, relative to the project directory.
    #[serde(default)]
    manifest: Option<PathBuf>,
    /// Dependency store path, relative to the project directory.
    #[serde(default)]
    store: Option<PathBuf>,
}

/// Fully resolved settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Registry URL (`http(s)://`), `file://` URL, or directory.
    pub registry: String,
    pub installer: InstallerConfig,
}

impl Settings {
    /// Resolve settings for `project_dir`.
    pub fn load(
        project_dir: &Path,
        registry_flag: Option<&str>,
        registry_env: Option<String>,
    ) -> Result<Self> {
        let file = read_settings_file(project_dir)?;

        let mut installer = InstallerConfig::for_project(project_dir);
        if let Some(manifest) = file.manifest {
            installer = installer.manifest_path(project_dir.join(manifest));
        }
        if let Some(store) = file.store {
            installer = installer.store_root(project_dir.join(store));
        }

        let registry = registry_flag
            .map(str::to_string)
            .or(registry_env.filter(|value| !value.trim().is_empty()))
            .or(file.registry)
            .unwrap_or_else(|| DEFAULT_REGISTRY.to_string());

        Ok(Settings {
            registry,
            installer,
        })
    }

    /// Build the installer these settings describe.
    pub fn installer(&self) -> Result<Installer> {
        let registry = open_registry(&self.registry)?;
        Ok(Installer::new(self.installer.clone(), registry))
    }
}

fn read_settings_file(project_dir: &Path) -> Result<SettingsFile> {
    let path = project_dir.join(SETTINGS_FILE);
    if !path.is_file() {
        return Ok(SettingsFile::default());
    }
    let content =
        std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

/// Pick a registry backend for `location`.
///
/// `http://` and `https://` select the HTTP client; a `file://` URL or an
/// existing directory selects a local registry.
pub fn open_registry(location: &str) -> Result<Box<dyn RegistryBackend>> {
    if location.starts_with("http://") || location.starts_with("https://") {
        let registry = HttpRegistry::new(location).context("creating HTTP client")?;
        return Ok(Box::new(registry));
    }
    let path = location.strip_prefix("file://").unwrap_or(location);
    if Path::new(path).is_dir() {
        return Ok(Box::new(LocalRegistry::new(PathBuf::from(path))));
    }
    bail!("registry '{location}' is neither an http(s) URL nor an existing directory")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(dir.path(), None, None).unwrap();
        assert_eq!(settings.registry, DEFAULT_REGISTRY);
        assert_eq!(settings.installer.manifest_path, dir.path().join("package.json"));
        assert_eq!(settings.installer.store_root, dir.path().join("node_modules"));
    }

    #[test]
    fn settings_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILE),
            "registry = \"https://npm.internal.example\"\nstore = \"vendor/js\"\n",
        )
        .unwrap();

        let settings = Settings::load(dir.path(), None, None).unwrap();
        assert_eq!(settings.registry, "https://npm.internal.example");
        assert_eq!(settings.installer.store_root, dir.path().join("vendor/js"));
        assert_eq!(settings.installer.manifest_path, dir.path().join("package.json"));
    }

    #[test]
    fn env_beats_file_and_flag_beats_env() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SETTINGS_FILE), "registry = \"https://file\"\n").unwrap();

        let env = Some("https://env".to_string());
        let settings = Settings::load(dir.path(), None, env.clone()).unwrap();
        assert_eq!(settings.registry, "https://env");

        let settings = Settings::load(dir.path(), Some("https://flag"), env).unwrap();
        assert_eq!(settings.registry, "https://flag");

        let settings = Settings::load(dir.path(), None, Some("  ".to_string())).unwrap();
        assert_eq!(settings.registry, "https://file");
    }

    #[test]
    fn reject_unknown_settings_keys() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SETTINGS_FILE), "regsitry = \"typo\"\n").unwrap();
        assert!(Settings::load(dir.path(), None, None).is_err());
    }

    #[test]
    fn open_registry_kinds() {
        let dir = tempfile::tempdir().unwrap();
        assert!(open_registry("https://registry.npmjs.org").is_ok());
        assert!(open_registry(&dir.path().display().to_string()).is_ok());
        assert!(open_registry(&format!("file://{}", dir.path().display())).is_ok());
        assert!(open_registry("ftp://nope").is_err());
        assert!(open_registry(&dir.path().join("missing").display().to_string()).is_err());
    }
}
