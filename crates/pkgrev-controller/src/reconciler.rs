use crate::error::Result;
use pkgrev_core::{evaluate, Evaluation, ObjectKey, ResourceStore};
use serde::Serialize;
use std::fmt;

/// What a single reconcile did. None of these is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The resource does not exist (any more).
    NotFound,
    /// Already converged; nothing was written.
    Unchanged,
    /// A corrected snapshot was persisted.
    Updated,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::NotFound => "not_found",
            Outcome::Unchanged => "unchanged",
            Outcome::Updated => "updated",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stateless handler: every call starts from a fresh read of the store, so
/// whatever triggered it only needs to say which identity may have changed.
#[derive(Debug)]
pub struct Reconciler<S> {
    store: S,
    max_conflict_retries: u32,
}

impl<S: ResourceStore> Reconciler<S> {
    pub fn new(store: S, max_conflict_retries: u32) -> Self {
        Self {
            store,
            max_conflict_retries,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fetch, evaluate, and write back only if the evaluation changed
    /// something. An update conflict restarts from the fetch, at most
    /// `max_conflict_retries` times; the last conflict is then returned.
    pub async fn reconcile(&self, key: &ObjectKey) -> Result<Outcome> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;

            let Some(subject) = self.store.fetch(key).await? else {
                tracing::debug!(key = %key, "resource not found, nothing to do");
                return Ok(Outcome::NotFound);
            };

            let Evaluation { resource, changed } = evaluate(subject);
            if !changed {
                tracing::debug!(key = %key, "readiness gates already converged");
                return Ok(Outcome::Unchanged);
            }

            match self.store.update(&resource).await {
                Ok(stored) => {
                    tracing::info!(
                        key = %key,
                        resource_version = stored.resource_version().unwrap_or_default(),
                        attempt,
                        "updated readiness gates"
                    );
                    return Ok(Outcome::Updated);
                }
                Err(e) if e.is_conflict() && attempt <= self.max_conflict_retries => {
                    tracing::warn!(key = %key, attempt, error = %e, "update conflict, re-fetching");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
