use anyhow::{Context, Result};
use pkgrev_controller::{dir_watch, runtime, Reconciler};
use pkgrev_core::file_store::FileStore;
use std::path::{Path, PathBuf};

pub fn run(config_path: Option<&Path>, namespace: Option<String>, dir: Option<PathBuf>) -> Result<()> {
    let mut config = super::config::load(config_path)?;
    if namespace.is_some() {
        config.namespace = namespace;
    }
    super::config::check(&config)?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        match dir {
            Some(dir) => {
                let reconciler = Reconciler::new(FileStore::new(dir), config.max_conflict_retries);
                dir_watch::watch(reconciler, &config).await?;
            }
            None => {
                let client = kube::Client::try_default()
                    .await
                    .context("failed to build kubernetes client from kubeconfig or in-cluster env")?;
                runtime::run(client, &config).await?;
            }
        }
        Ok::<(), anyhow::Error>(())
    })
}
