//! Event source for a [`FileStore`] directory.
//!
//! Polls the directory and treats a changed modification time as "this
//! identity may have changed". A failed reconcile leaves its mtime unrecorded
//! so the next tick tries again.

use crate::error::Result;
use crate::reconciler::{Outcome, Reconciler};
use pkgrev_core::config::ControllerConfig;
use pkgrev_core::file_store::FileStore;
use pkgrev_core::ObjectKey;
use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::time::{Duration, SystemTime};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PollSummary {
    pub reconciled: usize,
    pub updated: usize,
    pub failed: usize,
}

/// Last observed modification time per resource.
#[derive(Debug, Default)]
pub struct DirWatcher {
    namespace: Option<String>,
    seen: HashMap<ObjectKey, SystemTime>,
}

impl DirWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ignore resources outside `namespace`.
    pub fn with_namespace(namespace: Option<String>) -> Self {
        Self {
            namespace,
            seen: HashMap::new(),
        }
    }

    fn in_scope(&self, key: &ObjectKey) -> bool {
        self.namespace
            .as_deref()
            .map_or(true, |ns| ns == key.namespace)
    }

    /// Reconcile every resource file that is new or whose mtime moved since
    /// the previous call. A directory that cannot be listed yields an empty
    /// summary; the next tick tries again.
    pub async fn poll_once(&mut self, reconciler: &Reconciler<FileStore>) -> Result<PollSummary> {
        let mut entries = match reconciler.store().list() {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(
                    dir = %reconciler.store().root().display(),
                    error = %e,
                    "cannot list resource directory, retrying next poll"
                );
                return Ok(PollSummary::default());
            }
        };
        entries.retain(|(key, _)| self.in_scope(key));
        self.seen
            .retain(|key, _| entries.iter().any(|(k, _)| k == key));

        let mut summary = PollSummary::default();
        for (key, path) in entries {
            let Some(mtime) = modified(&path).await else {
                continue;
            };
            if self.seen.get(&key) == Some(&mtime) {
                continue;
            }

            summary.reconciled += 1;
            match reconciler.reconcile(&key).await {
                Ok(outcome) => {
                    if outcome == Outcome::Updated {
                        summary.updated += 1;
                    }
                    // Record the post-write mtime so our own update does not
                    // trigger another round.
                    if let Some(after) = modified(&path).await {
                        self.seen.insert(key, after);
                    }
                }
                Err(e) => {
                    summary.failed += 1;
                    tracing::warn!(key = %key, error = %e, "reconcile failed, retrying next poll");
                }
            }
        }
        Ok(summary)
    }
}

async fn modified(path: &Path) -> Option<SystemTime> {
    tokio::fs::metadata(path).await.ok()?.modified().ok()
}

/// Poll `reconciler`'s directory every `poll_interval_ms` until ctrl-c.
pub async fn watch(reconciler: Reconciler<FileStore>, config: &ControllerConfig) -> Result<()> {
    watch_until(reconciler, config, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    })
    .await
}

/// Poll until `shutdown` completes.
pub async fn watch_until<F>(
    reconciler: Reconciler<FileStore>,
    config: &ControllerConfig,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()>,
{
    let interval: Duration = config.poll_interval();
    tracing::info!(
        dir = %reconciler.store().root().display(),
        namespace = config.namespace.as_deref().unwrap_or("<all>"),
        interval_ms = config.poll_interval_ms,
        "watching resource directory"
    );
    let mut watcher = DirWatcher::with_namespace(config.namespace.clone());
    let mut ticker = tokio::time::interval(interval);
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let summary = watcher.poll_once(&reconciler).await?;
                if summary.reconciled > 0 {
                    tracing::debug!(
                        reconciled = summary.reconciled,
                        updated = summary.updated,
                        failed = summary.failed,
                        "poll complete"
                    );
                }
            }
            _ = &mut shutdown => {
                tracing::info!("shutting down directory watcher");
                return Ok(());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pkgrev_core::PackageRevision;
    use tempfile::TempDir;

    fn reconciler(dir: &TempDir) -> Reconciler<FileStore> {
        Reconciler::new(FileStore::new(dir.path()), 3)
    }

    #[tokio::test]
    async fn first_poll_reconciles_everything() {
        let dir = TempDir::new().unwrap();
        let r = reconciler(&dir);
        r.store()
            .put(PackageRevision::new("ns", "gated").with_gates(["foo"]))
            .unwrap();
        r.store().put(PackageRevision::new("ns", "plain")).unwrap();

        let mut watcher = DirWatcher::new();
        let summary = watcher.poll_once(&r).await.unwrap();
        assert_eq!(
            summary,
            PollSummary {
                reconciled: 2,
                updated: 1,
                failed: 0
            }
        );
    }

    #[tokio::test]
    async fn unchanged_files_are_skipped() {
        let dir = TempDir::new().unwrap();
        let r = reconciler(&dir);
        r.store()
            .put(PackageRevision::new("ns", "gated").with_gates(["foo"]))
            .unwrap();

        let mut watcher = DirWatcher::new();
        watcher.poll_once(&r).await.unwrap();
        let summary = watcher.poll_once(&r).await.unwrap();
        assert_eq!(summary.reconciled, 0);
    }

    #[tokio::test]
    async fn namespace_filter_limits_scope() {
        let dir = TempDir::new().unwrap();
        let r = reconciler(&dir);
        r.store()
            .put(PackageRevision::new("team-a", "pr").with_gates(["foo"]))
            .unwrap();
        r.store()
            .put(PackageRevision::new("team-b", "pr").with_gates(["foo"]))
            .unwrap();

        let mut watcher = DirWatcher::with_namespace(Some("team-a".to_string()));
        let summary = watcher.poll_once(&r).await.unwrap();
        assert_eq!(summary.updated, 1);

        let untouched = r.store().load(&ObjectKey::new("team-b", "pr")).unwrap().unwrap();
        assert_eq!(untouched.spec.readiness_gates.len(), 1);
    }

    #[tokio::test]
    async fn unparseable_file_counts_as_failure() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("ns")).unwrap();
        std::fs::write(dir.path().join("ns/broken.yaml"), "spec: [not, a, map").unwrap();

        let r = reconciler(&dir);
        let mut watcher = DirWatcher::new();
        let summary = watcher.poll_once(&r).await.unwrap();
        assert_eq!(summary.failed, 1);

        // Still unrecorded, so it is attempted again.
        let summary = watcher.poll_once(&r).await.unwrap();
        assert_eq!(summary.failed, 1);
    }

    #[tokio::test]
    async fn unlistable_directory_is_an_empty_poll() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("not-a-dir");
        std::fs::write(&root, "plain file").unwrap();

        let r = Reconciler::new(FileStore::new(&root), 3);
        let mut watcher = DirWatcher::new();
        let summary = watcher.poll_once(&r).await.unwrap();
        assert_eq!(summary, PollSummary::default());
    }

    #[tokio::test]
    async fn watch_until_reconciles_then_stops() {
        let dir = TempDir::new().unwrap();
        let r = reconciler(&dir);
        r.store()
            .put(PackageRevision::new("ns", "gated").with_gates(["foo"]))
            .unwrap();

        let config = ControllerConfig {
            poll_interval_ms: 0,
            ..Default::default()
        };
        watch_until(
            r,
            &config,
            tokio::time::sleep(Duration::from_millis(200)),
        )
        .await
        .unwrap();

        let store = FileStore::new(dir.path());
        let pr = store.load(&ObjectKey::new("ns", "gated")).unwrap().unwrap();
        assert_eq!(pr.spec.readiness_gates.len(), 2);
        assert_eq!(pr.status.conditions[0].status.as_str(), "True");
    }

    #[tokio::test]
    async fn watch_until_survives_unlistable_directory() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("file");
        std::fs::write(&file, "x").unwrap();
        let r = Reconciler::new(FileStore::new(&file), 3);

        watch_until(
            r,
            &ControllerConfig::default(),
            tokio::time::sleep(Duration::from_millis(50)),
        )
        .await
        .unwrap();
    }
}
