use crate::error::{ControllerError, Result};
use crate::kube_store::{package_revision_resource, KubeStore};
use crate::reconciler::Reconciler;
use futures::StreamExt;
use kube::api::{Api, DynamicObject};
use kube::runtime::controller::{self, Action, Controller};
use kube::runtime::watcher;
use kube::{Client, ResourceExt};
use pkgrev_core::config::ControllerConfig;
use pkgrev_core::ObjectKey;
use std::sync::Arc;
use std::time::Duration;

struct Context {
    reconciler: Reconciler<KubeStore>,
    error_requeue: Duration,
}

/// Watch PackageRevisions and reconcile each one whose identity shows up in
/// the watch stream. Runs until SIGINT/SIGTERM.
pub async fn run(client: Client, config: &ControllerConfig) -> Result<()> {
    let resource = package_revision_resource();
    let api: Api<DynamicObject> = match &config.namespace {
        Some(ns) => Api::namespaced_with(client.clone(), ns, &resource),
        None => Api::all_with(client.clone(), &resource),
    };

    let ctx = Arc::new(Context {
        reconciler: Reconciler::new(KubeStore::new(client), config.max_conflict_retries),
        error_requeue: config.error_requeue(),
    });

    tracing::info!(
        namespace = config.namespace.as_deref().unwrap_or("<all>"),
        concurrency = config.concurrency,
        "starting PackageRevision readiness-gate controller"
    );

    Controller::new_with(api, watcher::Config::default(), resource)
        .with_config(controller::Config::default().concurrency(config.concurrency))
        .shutdown_on_signal()
        .run(reconcile, error_policy, ctx)
        .for_each(|result| async move {
            match result {
                Ok((obj, _)) => tracing::debug!(name = %obj.name, namespace = ?obj.namespace, "reconciled"),
                Err(e) => tracing::warn!(error = %e, "reconcile failed"),
            }
        })
        .await;

    tracing::info!("controller stopped");
    Ok(())
}

/// The watched object is used for its identity only; the reconciler re-reads
/// the current state itself.
pub fn object_key(obj: &DynamicObject) -> Result<ObjectKey> {
    let name = obj.name_any();
    let namespace = obj
        .namespace()
        .ok_or_else(|| ControllerError::MissingNamespace(name.clone()))?;
    Ok(ObjectKey::new(namespace, name))
}

async fn reconcile(obj: Arc<DynamicObject>, ctx: Arc<Context>) -> Result<Action> {
    let key = object_key(&obj)?;
    let outcome = ctx.reconciler.reconcile(&key).await?;
    tracing::debug!(key = %key, outcome = %outcome, "reconcile finished");
    Ok(Action::await_change())
}

fn error_policy(obj: Arc<DynamicObject>, error: &ControllerError, ctx: Arc<Context>) -> Action {
    tracing::warn!(
        name = %obj.name_any(),
        namespace = ?obj.namespace(),
        error = %error,
        requeue_secs = ctx.error_requeue.as_secs(),
        "requeueing after error"
    );
    Action::requeue(ctx.error_requeue)
}
