use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// ControllerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControllerConfig {
    /// Namespace to watch. `None` watches every namespace.
    #[serde(default)]
    pub namespace: Option<String>,
    /// Extra fetch-evaluate-update rounds after an optimistic-concurrency
    /// conflict before the reconcile is reported as failed.
    #[serde(default = "default_max_conflict_retries")]
    pub max_conflict_retries: u32,
    /// Delay before a failed reconcile is retried.
    #[serde(default = "default_error_requeue_secs")]
    pub error_requeue_secs: u64,
    /// Directory store polling interval.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Maximum reconciles in flight at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: u16,
}

fn default_max_conflict_retries() -> u32 {
    3
}

fn default_error_requeue_secs() -> u64 {
    5
}

fn default_poll_interval_ms() -> u64 {
    800
}

fn default_concurrency() -> u16 {
    4
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            namespace: None,
            max_conflict_retries: default_max_conflict_retries(),
            error_requeue_secs: default_error_requeue_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            concurrency: default_concurrency(),
        }
    }
}

impl ControllerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_yaml(&data)
    }

    /// Load `path` when given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn from_yaml(data: &str) -> Result<Self> {
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(data)?)
    }

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        if self.concurrency == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "concurrency is 0: reconciles are not limited".to_string(),
            });
        }
        if self.poll_interval_ms == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "poll_interval_ms must be at least 1".to_string(),
            });
        } else if self.poll_interval_ms < 100 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "poll_interval_ms {} is very short; directory scans will be frequent",
                    self.poll_interval_ms
                ),
            });
        }
        if self.error_requeue_secs == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "error_requeue_secs must be at least 1".to_string(),
            });
        }
        if matches!(&self.namespace, Some(ns) if ns.is_empty()) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "namespace is empty; omit it to watch all namespaces".to_string(),
            });
        }
        warnings
    }

    pub fn error_requeue(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.error_requeue_secs)
    }

    /// Never zero, so it is always usable as a tick period.
    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
