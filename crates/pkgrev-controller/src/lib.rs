//! `pkgrev-controller` — the moving parts around the pure evaluator in
//! `pkgrev-core`.
//!
//! ```text
//! event source (kube watch | directory poll)
//!     │  ObjectKey only
//!     ▼
//! Reconciler      ← fetch → evaluate → conditional update, retry on conflict
//!     │
//!     ▼
//! ResourceStore   ← KubeStore | FileStore | MemoryStore
//! ```

pub mod dir_watch;
pub mod error;
pub mod kube_store;
pub mod rbac;
pub mod reconciler;
pub mod runtime;

pub use error::{ControllerError, Result};
pub use reconciler::{Outcome, Reconciler};
