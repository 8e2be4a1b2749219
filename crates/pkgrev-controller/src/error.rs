use pkgrev_core::PkgrevError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Store(#[from] PkgrevError),

    #[error("kubernetes client error: {0}")]
    Kube(#[from] kube::Error),

    #[error("object {0} has no namespace")]
    MissingNamespace(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ControllerError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, ControllerError::Store(e) if e.is_conflict())
    }
}

pub type Result<T> = std::result::Result<T, ControllerError>;
