pub mod config;
pub mod error;
pub mod evaluate;
pub mod file_store;
pub mod io;
pub mod paths;
pub mod store;
pub mod types;

pub use error::{PkgrevError, Result};
pub use evaluate::{evaluate, Evaluation};
pub use store::{MemoryStore, ResourceStore};
pub use types::{ObjectKey, PackageRevision};
