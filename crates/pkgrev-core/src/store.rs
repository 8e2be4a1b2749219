use crate::error::{PkgrevError, Result};
use crate::types::{ObjectKey, PackageRevision};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// Where PackageRevisions live. Exactly two operations: read by identity and
/// write conditioned on the last observed `resourceVersion`.
pub trait ResourceStore: Send + Sync {
    /// `Ok(None)` when the resource does not exist.
    fn fetch(
        &self,
        key: &ObjectKey,
    ) -> impl Future<Output = Result<Option<PackageRevision>>> + Send;

    /// Persist `resource`. Fails with [`PkgrevError::Conflict`] when the stored
    /// version no longer matches `resource.metadata.resource_version`.
    /// Returns the resource as stored, carrying its new version.
    fn update(
        &self,
        resource: &PackageRevision,
    ) -> impl Future<Output = Result<PackageRevision>> + Send;
}

/// Successor of a store-assigned resource version. Versions are opaque to
/// clients; the local stores use a decimal counter.
pub(crate) fn next_resource_version(current: Option<&str>) -> String {
    let n = current.and_then(|v| v.parse::<u64>().ok()).unwrap_or(0);
    (n + 1).to_string()
}

pub(crate) fn check_version(
    key: &ObjectKey,
    stored: &PackageRevision,
    incoming: &PackageRevision,
) -> Result<()> {
    if stored.resource_version() == incoming.resource_version() {
        return Ok(());
    }
    Err(PkgrevError::Conflict {
        key: key.to_string(),
        detail: format!(
            "resourceVersion {} is stale, store has {}",
            incoming.resource_version().unwrap_or("<none>"),
            stored.resource_version().unwrap_or("<none>"),
        ),
    })
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-process store with compare-and-swap updates.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<ObjectKey, PackageRevision>>,
    updates: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or overwrite a resource unconditionally, bumping its version.
    pub fn insert(&self, mut resource: PackageRevision) -> PackageRevision {
        let mut objects = self.objects.lock().unwrap_or_else(PoisonError::into_inner);
        let key = resource.key();
        let current = objects.get(&key).and_then(|r| r.resource_version());
        resource.metadata.resource_version = Some(next_resource_version(current));
        objects.insert(key, resource.clone());
        resource
    }

    pub fn get(&self, key: &ObjectKey) -> Option<PackageRevision> {
        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Number of successful conditional updates so far.
    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    fn compare_and_swap(&self, resource: &PackageRevision) -> Result<PackageRevision> {
        let key = resource.key();
        let mut objects = self.objects.lock().unwrap_or_else(PoisonError::into_inner);
        let stored = objects
            .get(&key)
            .ok_or_else(|| PkgrevError::NotFound(key.to_string()))?;
        check_version(&key, stored, resource)?;

        let mut next = resource.clone();
        next.metadata.resource_version = Some(next_resource_version(stored.resource_version()));
        objects.insert(key, next.clone());
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(next)
    }
}

impl ResourceStore for MemoryStore {
    async fn fetch(&self, key: &ObjectKey) -> Result<Option<PackageRevision>> {
        Ok(self.get(key))
    }

    async fn update(&self, resource: &PackageRevision) -> Result<PackageRevision> {
        self.compare_and_swap(resource)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versions_count_up() {
        assert_eq!(next_resource_version(None), "1");
        assert_eq!(next_resource_version(Some("41")), "42");
        assert_eq!(next_resource_version(Some("opaque")), "1");
    }

    #[tokio::test]
    async fn fetch_missing_is_none() {
        let store = MemoryStore::new();
        let found = store.fetch(&ObjectKey::new("ns", "nope")).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn update_with_current_version_succeeds() {
        let store = MemoryStore::new();
        let stored = store.insert(PackageRevision::new("ns", "pr"));
        assert_eq!(stored.resource_version(), Some("1"));

        let updated = store.update(&stored.clone().with_gates(["foo"])).await.unwrap();
        assert_eq!(updated.resource_version(), Some("2"));
        assert_eq!(store.get(&stored.key()).unwrap(), updated);
        assert_eq!(store.update_count(), 1);
    }

    #[tokio::test]
    async fn update_with_stale_version_conflicts() {
        let store = MemoryStore::new();
        let stale = store.insert(PackageRevision::new("ns", "pr"));
        store.insert(PackageRevision::new("ns", "pr").with_gates(["x"]));

        let err = store.update(&stale.with_gates(["foo"])).await.unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(store.update_count(), 0);
        let current = store.get(&ObjectKey::new("ns", "pr")).unwrap();
        assert_eq!(current.spec.readiness_gates[0].condition_type, "x");
    }

    #[tokio::test]
    async fn update_of_missing_resource_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .update(&PackageRevision::new("ns", "ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, PkgrevError::NotFound(_)));
    }
}
