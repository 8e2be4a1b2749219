use thiserror::Error;

#[derive(Debug, Error)]
pub enum PkgrevError {
    #[error("resource not found: {0}")]
    NotFound(String),

    /// The store rejected an update because the resource changed since it
    /// was read. Callers must re-fetch and re-evaluate.
    #[error("conflict updating {key}: {detail}")]
    Conflict { key: String, detail: String },

    #[error("invalid resource key '{0}': expected 'namespace/name' or 'name'")]
    InvalidKey(String),

    #[error("store backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl PkgrevError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, PkgrevError::Conflict { .. })
    }
}

pub type Result<T> = std::result::Result<T, PkgrevError>;
