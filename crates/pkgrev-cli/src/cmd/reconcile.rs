use crate::output::print_json;
use anyhow::{Context, Result};
use pkgrev_controller::Reconciler;
use pkgrev_core::file_store::FileStore;
use pkgrev_core::ObjectKey;
use std::path::Path;

pub fn run(config_path: Option<&Path>, key: &str, dir: &Path, json: bool) -> Result<()> {
    let config = super::config::load(config_path)?;
    super::config::check(&config)?;
    let key: ObjectKey = key.parse()?;

    let reconciler = Reconciler::new(FileStore::new(dir), config.max_conflict_retries);
    let rt = tokio::runtime::Runtime::new()?;
    let outcome = rt
        .block_on(reconciler.reconcile(&key))
        .with_context(|| format!("failed to reconcile {key}"))?;

    if json {
        print_json(&serde_json::json!({
            "key": key.to_string(),
            "outcome": outcome,
        }))?;
    } else {
        println!("{key}: {outcome}");
    }
    Ok(())
}
