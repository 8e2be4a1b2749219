//! Directory-backed resource store.
//!
//! Each PackageRevision is one YAML file at `<root>/<namespace>/<name>.yaml`.
//! The file path is the identity: `metadata.name` and `metadata.namespace` are
//! overwritten from it on load. Updates are conditional on
//! `metadata.resourceVersion` and land via tempfile rename.
//!
//! The version check and the write are serialized within one process only;
//! two processes sharing a directory can still race.

use crate::error::{PkgrevError, Result};
use crate::io;
use crate::paths;
use crate::store::{check_version, next_resource_version, ResourceStore};
use crate::types::{ObjectKey, PackageRevision};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing `key`. Keys that would resolve outside the root are
    /// rejected.
    pub fn path_for(&self, key: &ObjectKey) -> Result<PathBuf> {
        key.validate()?;
        Ok(paths::resource_path(&self.root, key))
    }

    pub fn load(&self, key: &ObjectKey) -> Result<Option<PackageRevision>> {
        let Some(data) = io::read_optional(&self.path_for(key)?)? else {
            return Ok(None);
        };
        let mut resource: PackageRevision = serde_yaml::from_str(&data)?;
        resource.metadata.namespace = key.namespace.clone();
        resource.metadata.name = key.name.clone();
        Ok(Some(resource))
    }

    /// Write `resource` without a version check, assigning it the next
    /// version. Used to seed a store.
    pub fn put(&self, mut resource: PackageRevision) -> Result<PackageRevision> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let key = resource.key();
        let current = self.load(&key)?;
        resource.metadata.resource_version = Some(next_resource_version(
            current.as_ref().and_then(|r| r.resource_version()),
        ));
        self.write(&key, &resource)?;
        Ok(resource)
    }

    /// Conditional write: fails with a conflict if the file's version moved.
    pub fn save(&self, resource: &PackageRevision) -> Result<PackageRevision> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let key = resource.key();
        let stored = self
            .load(&key)?
            .ok_or_else(|| PkgrevError::NotFound(key.to_string()))?;
        check_version(&key, &stored, resource)?;

        let mut next = resource.clone();
        next.metadata.resource_version = Some(next_resource_version(stored.resource_version()));
        self.write(&key, &next)?;
        tracing::debug!(
            key = %key,
            resource_version = next.resource_version().unwrap_or_default(),
            "wrote resource file"
        );
        Ok(next)
    }

    /// Every resource file under the root, as (identity, path), sorted by
    /// identity. Files without the `.yaml` extension are skipped.
    pub fn list(&self) -> Result<Vec<(ObjectKey, PathBuf)>> {
        let mut out = Vec::new();
        let namespaces = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(out),
            Err(e) => return Err(e.into()),
        };
        for ns_entry in namespaces {
            let ns_entry = ns_entry?;
            if !ns_entry.file_type()?.is_dir() {
                continue;
            }
            let namespace = ns_entry.file_name().to_string_lossy().into_owned();
            for entry in std::fs::read_dir(ns_entry.path())? {
                let path = entry?.path();
                if path.extension().and_then(|e| e.to_str()) != Some(paths::RESOURCE_EXTENSION) {
                    continue;
                }
                let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                out.push((ObjectKey::new(namespace.clone(), name), path.clone()));
            }
        }
        out.sort();
        Ok(out)
    }

    fn write(&self, key: &ObjectKey, resource: &PackageRevision) -> Result<()> {
        let data = serde_yaml::to_string(resource)?;
        io::atomic_write(&self.path_for(key)?, data.as_bytes())
    }
}

impl ResourceStore for FileStore {
    async fn fetch(&self, key: &ObjectKey) -> Result<Option<PackageRevision>> {
        self.load(key)
    }

    async fn update(&self, resource: &PackageRevision) -> Result<PackageRevision> {
        self.save(resource)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ConditionStatus;
    use tempfile::TempDir;

    #[test]
    fn put_then_load() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        let stored = store
            .put(PackageRevision::new("porch", "pr").with_gates(["foo"]))
            .unwrap();
        assert_eq!(stored.resource_version(), Some("1"));
        assert!(dir.path().join("porch/pr.yaml").exists());

        let loaded = store.load(&stored.key()).unwrap().unwrap();
        assert_eq!(loaded, stored);
    }

    #[test]
    fn load_takes_identity_from_path() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("team-a")).unwrap();
        std::fs::write(
            dir.path().join("team-a/blueprint.yaml"),
            "metadata:\n  name: something-else\nspec:\n  readinessGates:\n    - conditionType: foo\n",
        )
        .unwrap();

        let store = FileStore::new(dir.path());
        let loaded = store
            .load(&ObjectKey::new("team-a", "blueprint"))
            .unwrap()
            .unwrap();
        assert_eq!(loaded.key(), ObjectKey::new("team-a", "blueprint"));
        assert_eq!(loaded.resource_version(), None);
    }

    #[test]
    fn load_missing_is_none() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.load(&ObjectKey::new("ns", "nope")).unwrap().is_none());
    }

    #[test]
    fn save_bumps_version() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        let stored = store.put(PackageRevision::new("ns", "pr")).unwrap();

        let changed = stored.with_conditions([("foo", ConditionStatus::TRUE)]);
        let saved = store.save(&changed).unwrap();
        assert_eq!(saved.resource_version(), Some("2"));
        let loaded = store.load(&saved.key()).unwrap().unwrap();
        assert_eq!(loaded.status.conditions.len(), 1);
    }

    #[test]
    fn save_with_stale_version_conflicts() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        let first = store.put(PackageRevision::new("ns", "pr")).unwrap();
        store.save(&first).unwrap();

        let err = store.save(&first).unwrap_err();
        assert!(err.is_conflict(), "got {err}");
    }

    #[test]
    fn list_walks_namespaces() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        store.put(PackageRevision::new("b", "two")).unwrap();
        store.put(PackageRevision::new("a", "one")).unwrap();
        std::fs::write(dir.path().join("a/notes.txt"), "ignored").unwrap();
        std::fs::write(dir.path().join("stray.yaml"), "ignored").unwrap();

        let keys: Vec<String> = store
            .list()
            .unwrap()
            .into_iter()
            .map(|(k, _)| k.to_string())
            .collect();
        assert_eq!(keys, vec!["a/one", "b/two"]);
    }

    #[test]
    fn dot_components_cannot_escape_root() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("store");
        let store = FileStore::new(&root);
        std::fs::write(dir.path().join("outside.yaml"), "metadata:\n  name: outside\n").unwrap();

        let err = store.load(&ObjectKey::new("..", "outside")).unwrap_err();
        assert!(matches!(err, PkgrevError::InvalidKey(_)), "got {err}");

        let err = store.put(PackageRevision::new("..", "escaped")).unwrap_err();
        assert!(matches!(err, PkgrevError::InvalidKey(_)), "got {err}");
        assert!(!dir.path().join("escaped.yaml").exists());

        assert!(store.path_for(&ObjectKey::new("ns", "..")).is_err());
    }

    #[test]
    fn list_of_missing_root_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("absent"));
        assert!(store.list().unwrap().is_empty());
    }
}
