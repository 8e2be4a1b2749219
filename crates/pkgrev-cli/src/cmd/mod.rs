pub mod config;
pub mod evaluate;
pub mod rbac;
pub mod reconcile;
pub mod run;
