use crate::types::ObjectKey;
use std::path::{Path, PathBuf};

pub const RESOURCE_EXTENSION: &str = "yaml";

pub fn namespace_dir(root: &Path, namespace: &str) -> PathBuf {
    root.join(namespace)
}

/// `<root>/<namespace>/<name>.yaml`
pub fn resource_path(root: &Path, key: &ObjectKey) -> PathBuf {
    namespace_dir(root, &key.namespace).join(format!("{}.{RESOURCE_EXTENSION}", key.name))
}
