use crate::output::{print_json, print_yaml};
use anyhow::{Context, Result};
use pkgrev_core::{evaluate, PackageRevision};
use std::io::Read;
use std::path::Path;

/// Dry run: never writes anything back.
pub fn run(file: &Path, json: bool) -> Result<()> {
    let data = if file == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        buf
    } else {
        std::fs::read_to_string(file)
            .with_context(|| format!("failed to read {}", file.display()))?
    };
    let subject: PackageRevision = serde_yaml::from_str(&data)
        .with_context(|| format!("{} is not a PackageRevision", file.display()))?;

    let evaluation = evaluate(subject);
    tracing::debug!(
        key = %evaluation.resource.key(),
        changed = evaluation.changed,
        "evaluated"
    );

    if json {
        print_json(&serde_json::json!({
            "changed": evaluation.changed,
            "resource": evaluation.resource,
        }))
    } else {
        println!("# changed: {}", evaluation.changed);
        print_yaml(&evaluation.resource)
    }
}
