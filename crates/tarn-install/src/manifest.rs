//! `package.json` manifest store.
//!
//! Only the two dependency groups are interpreted. The file is kept as one
//! ordered JSON object, so every top-level field, the position of each group,
//! and the order of entries inside a group survive load/save untouched.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::{InstallError, Result};

/// A parsed manifest file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    document: Map<String, Value>,
}

/// Which dependency group an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyGroup {
    Dependencies,
    DevDependencies,
}

impl DependencyGroup {
    pub fn from_dev(dev: bool) -> Self {
        if dev {
            DependencyGroup::DevDependencies
        } else {
            DependencyGroup::Dependencies
        }
    }

    /// Key of the group in the manifest file.
    pub fn key(self) -> &'static str {
        match self {
            DependencyGroup::Dependencies => "dependencies",
            DependencyGroup::DevDependencies => "devDependencies",
        }
    }
}

impl std::fmt::Display for DependencyGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl Manifest {
    /// Parse manifest JSON text.
    ///
    /// The document must be an object, and each dependency group present
    /// must map names to version strings. A `null` group reads as absent.
    pub fn parse(path: &Path, text: &str) -> Result<Self> {
        let invalid = |detail: String| InstallError::InvalidManifest {
            path: path.to_path_buf(),
            detail,
        };
        let manifest: Manifest = serde_json::from_str(text).map_err(|e| invalid(e.to_string()))?;

        for group in [DependencyGroup::Dependencies, DependencyGroup::DevDependencies] {
            match manifest.document.get(group.key()) {
                None | Some(Value::Null) => {}
                Some(Value::Object(entries)) => {
                    if let Some((name, _)) = entries.iter().find(|(_, v)| !v.is_string()) {
                        return Err(invalid(format!(
                            "{group}.{name} must be a version string"
                        )));
                    }
                }
                Some(_) => return Err(invalid(format!("{group} must be an object"))),
            }
        }
        Ok(manifest)
    }

    /// A top-level field the installer does not interpret.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.document.get(key)
    }

    /// Whether a group is present in the manifest.
    pub fn has_group(&self, group: DependencyGroup) -> bool {
        self.document
            .get(group.key())
            .is_some_and(Value::is_object)
    }

    /// Entries of one group in file order; absent groups read as empty.
    pub fn group(&self, group: DependencyGroup) -> impl Iterator<Item = (&str, &str)> {
        self.document
            .get(group.key())
            .and_then(Value::as_object)
            .into_iter()
            .flatten()
            .filter_map(|(name, version)| Some((name.as_str(), version.as_str()?)))
    }

    /// Look up the selector recorded for `name` in one group.
    pub fn get(&self, group: DependencyGroup, name: &str) -> Option<&str> {
        self.document
            .get(group.key())?
            .get(name)?
            .as_str()
    }

    /// Record `name = version` in a group, creating the group if needed.
    ///
    /// Returns the previous selector, if any. The new value always wins, and
    /// an existing entry keeps its position.
    pub fn set(&mut self, group: DependencyGroup, name: &str, version: &str) -> Option<String> {
        let slot = self
            .document
            .entry(group.key())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        let entries = slot.as_object_mut()?;
        match entries.insert(name.to_string(), Value::String(version.to_string())) {
            Some(Value::String(previous)) => Some(previous),
            _ => None,
        }
    }

    /// Write as two-space indented JSON with a trailing newline.
    pub fn write_to(&self, mut writer: impl Write) -> std::io::Result<()> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")
    }
}

/// Reads and writes one manifest file.
#[derive(Debug, Clone)]
pub struct ManifestStore {
    path: PathBuf,
}

impl ManifestStore {
    pub fn new(path: PathBuf) -> Self {
        ManifestStore { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the manifest. A missing file is an error.
    pub fn load(&self) -> Result<Manifest> {
        let text = std::fs::read_to_string(&self.path)
            .map_err(|e| InstallError::fs(&self.path, format!("reading manifest: {e}")))?;
        Manifest::parse(&self.path, &text)
    }

    /// Persist the manifest, replacing the file atomically.
    pub fn save(&self, manifest: &Manifest) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .map_err(|e| InstallError::fs(dir, format!("creating temp manifest: {e}")))?;
        manifest
            .write_to(&mut tmp)
            .and_then(|()| tmp.flush())
            .map_err(|e| InstallError::fs(tmp.path(), format!("writing manifest: {e}")))?;
        // Keep the mode of the file being replaced.
        if let Ok(existing) = std::fs::metadata(&self.path) {
            std::fs::set_permissions(tmp.path(), existing.permissions())
                .map_err(|e| InstallError::fs(tmp.path(), e))?;
        }
        tmp.persist(&self.path)
            .map_err(|e| InstallError::fs(&self.path, format!("replacing manifest: {}", e.error)))?;

        debug!("wrote {}", self.path.display());
        Ok(())
    }

    /// Set one dependency entry and persist. Last write wins.
    ///
    /// If the manifest file does not exist yet it is created.
    pub fn update(&self, name: &str, version: &str, dev: bool) -> Result<()> {
        let mut manifest = if self.path.exists() {
            self.load()?
        } else {
            Manifest::default()
        };

        let group = DependencyGroup::from_dev(dev);
        if let Some(previous) = manifest.set(group, name, version) {
            debug!("replacing {name}@{previous} in {group}");
        }
        self.save(&manifest)?;

        info!("added {name}@{version} to {group} in {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(text: &str) -> (tempfile::TempDir, ManifestStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.json");
        std::fs::write(&path, text).unwrap();
        (dir, ManifestStore::new(path))
    }

    #[test]
    fn missing_groups_read_as_empty() {
        let (_dir, store) = store_with(r#"{"name": "app"}"#);
        let manifest = store.load().unwrap();
        assert_eq!(manifest.group(DependencyGroup::Dependencies).count(), 0);
        assert_eq!(manifest.group(DependencyGroup::DevDependencies).count(), 0);
    }

    #[test]
    fn load_missing_file_is_filesystem_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = ManifestStore::new(dir.path().join("package.json"));
        let err = store.load().unwrap_err();
        assert!(matches!(err, InstallError::FileSystem { .. }));
    }

    #[test]
    fn reject_malformed_manifest() {
        let (_dir, store) = store_with("{ not json");
        assert!(matches!(
            store.load(),
            Err(InstallError::InvalidManifest { .. })
        ));

        let (_dir, store) = store_with(r#"{"dependencies": {"foo": 1}}"#);
        assert!(store.load().is_err());

        let (_dir, store) = store_with(r#"{"devDependencies": ["foo"]}"#);
        assert!(store.load().is_err());

        let (_dir, store) = store_with("[]");
        assert!(store.load().is_err());
    }

    #[test]
    fn null_group_reads_as_absent() {
        let (_dir, store) = store_with(r#"{"dependencies": null}"#);
        let mut manifest = store.load().unwrap();
        assert!(!manifest.has_group(DependencyGroup::Dependencies));

        manifest.set(DependencyGroup::Dependencies, "foo", "1.0.0");
        assert_eq!(manifest.get(DependencyGroup::Dependencies, "foo"), Some("1.0.0"));
    }

    #[test]
    fn save_load_round_trip() {
        let text = r#"{
  "name": "app",
  "version": "1.0.0",
  "scripts": { "test": "node test.js" },
  "dependencies": { "foo": "1.0.0", "bar": "2.1.3" },
  "devDependencies": { "baz": "0.0.1" }
}"#;
        let (_dir, store) = store_with(text);
        let manifest = store.load().unwrap();
        store.save(&manifest).unwrap();

        let reloaded = store.load().unwrap();
        assert_eq!(reloaded, manifest);

        let original: serde_json::Value = serde_json::from_str(text).unwrap();
        let saved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(original, saved);
    }

    #[test]
    fn unchanged_save_is_byte_identical() {
        let text = "{\n  \"name\": \"app\",\n  \"dependencies\": {\n    \"zeta\": \"1.0.0\",\n    \"alpha\": \"2.0.0\"\n  },\n  \"scripts\": {\n    \"test\": \"node test.js\"\n  },\n  \"devDependencies\": {\n    \"mocha\": \"10.0.0\"\n  }\n}\n";
        let (_dir, store) = store_with(text);
        store.save(&store.load().unwrap()).unwrap();
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), text);
    }

    #[test]
    fn group_iterates_in_file_order() {
        let (_dir, store) = store_with(r#"{"dependencies": {"zeta": "1.0.0", "alpha": "1.0.0", "mid": "1.0.0"}}"#);
        let manifest = store.load().unwrap();
        let names: Vec<_> = manifest
            .group(DependencyGroup::Dependencies)
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn update_keeps_layout() {
        let (_dir, store) = store_with(r#"{"dependencies": {"zeta": "1.0.0", "alpha": "1.0.0"}, "scripts": {"test": "x"}}"#);
        store.update("zeta", "2.0.0", false).unwrap();
        store.update("beta", "1.0.0", false).unwrap();

        assert_eq!(
            std::fs::read_to_string(store.path()).unwrap(),
            "{\n  \"dependencies\": {\n    \"zeta\": \"2.0.0\",\n    \"alpha\": \"1.0.0\",\n    \"beta\": \"1.0.0\"\n  },\n  \"scripts\": {\n    \"test\": \"x\"\n  }\n}\n"
        );
    }

    #[test]
    fn save_failure_names_the_manifest_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = ManifestStore::new(dir.path().join("missing/package.json"));
        let err = store.save(&Manifest::default()).unwrap_err();
        match err {
            InstallError::FileSystem { path, .. } => assert_eq!(path, dir.path().join("missing")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn save_uses_two_space_indent() {
        let (_dir, store) = store_with(r#"{"name":"app","dependencies":{"foo":"1.0.0"}}"#);
        store.save(&store.load().unwrap()).unwrap();
        let saved = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(
            saved,
            "{\n  \"name\": \"app\",\n  \"dependencies\": {\n    \"foo\": \"1.0.0\"\n  }\n}\n"
        );
    }

    #[test]
    fn update_creates_group() {
        let (_dir, store) = store_with(r#"{"name": "app"}"#);
        store.update("foo", "1.2.3", true).unwrap();

        let manifest = store.load().unwrap();
        assert_eq!(manifest.get(DependencyGroup::DevDependencies, "foo"), Some("1.2.3"));
        assert!(!manifest.has_group(DependencyGroup::Dependencies));
        assert_eq!(manifest.field("name"), Some(&serde_json::json!("app")));
    }

    #[test]
    fn update_last_write_wins() {
        let (_dir, store) = store_with(r#"{"dependencies": {"foo": "1.0.0"}}"#);
        store.update("foo", "2.0.0", false).unwrap();

        let manifest = store.load().unwrap();
        let entries: Vec<_> = manifest.group(DependencyGroup::Dependencies).collect();
        assert_eq!(entries, vec![("foo", "2.0.0")]);
    }

    #[test]
    fn update_allows_same_name_in_both_groups() {
        let (_dir, store) = store_with("{}");
        store.update("foo", "1.0.0", false).unwrap();
        store.update("foo", "1.0.0", true).unwrap();

        let manifest = store.load().unwrap();
        assert_eq!(manifest.get(DependencyGroup::Dependencies, "foo"), Some("1.0.0"));
        assert_eq!(manifest.get(DependencyGroup::DevDependencies, "foo"), Some("1.0.0"));
    }

    #[test]
    fn update_without_manifest_creates_it() {
        let dir = tempfile::tempdir().unwrap();
        let store = ManifestStore::new(dir.path().join("package.json"));
        store.update("foo", "1.0.0", false).unwrap();
        assert_eq!(
            store.load().unwrap().get(DependencyGroup::Dependencies, "foo"),
            Some("1.0.0")
        );
    }
}
