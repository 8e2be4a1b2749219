use crate::error::PkgrevError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

pub const GROUP: &str = "porch.kpt.dev";
pub const VERSION: &str = "v1alpha1";
pub const KIND: &str = "PackageRevision";
pub const PLURAL: &str = "packagerevisions";
pub const DEFAULT_NAMESPACE: &str = "default";

/// Fields this crate does not model. They are carried through untouched so a
/// write never drops data another controller owns.
pub type Extra = BTreeMap<String, Value>;

// ---------------------------------------------------------------------------
// ObjectKey
// ---------------------------------------------------------------------------

/// Identity of a namespaced resource, rendered as `namespace/name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectKey {
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Both parts must be usable as a single path component: non-empty, no
    /// `/`, and not `.` or `..`.
    pub fn validate(&self) -> Result<(), PkgrevError> {
        if is_valid_component(&self.namespace) && is_valid_component(&self.name) {
            return Ok(());
        }
        Err(PkgrevError::InvalidKey(self.to_string()))
    }
}

fn is_valid_component(s: &str) -> bool {
    !s.is_empty() && s != "." && s != ".." && !s.contains('/')
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

impl std::str::FromStr for ObjectKey {
    type Err = PkgrevError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (namespace, name) = match s.split_once('/') {
            Some((ns, name)) => (ns, name),
            None => (DEFAULT_NAMESPACE, s),
        };
        let key = ObjectKey::new(namespace, name);
        if key.validate().is_err() {
            return Err(PkgrevError::InvalidKey(s.to_string()));
        }
        Ok(key)
    }
}

// ---------------------------------------------------------------------------
// ConditionStatus
// ---------------------------------------------------------------------------

/// Status of a condition. Kubernetes leaves this an open string: `True`,
/// `False` and `Unknown` are conventional, but anything (including an empty
/// or missing value) must still decode so the resource can be reconciled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConditionStatus(Cow<'static, str>);

impl ConditionStatus {
    pub const TRUE: ConditionStatus = ConditionStatus(Cow::Borrowed("True"));
    pub const FALSE: ConditionStatus = ConditionStatus(Cow::Borrowed("False"));
    pub const UNKNOWN: ConditionStatus = ConditionStatus(Cow::Borrowed("Unknown"));

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_true(&self) -> bool {
        self.as_str() == "True"
    }
}

impl From<&str> for ConditionStatus {
    fn from(s: &str) -> Self {
        ConditionStatus(Cow::Owned(s.to_string()))
    }
}

impl From<String> for ConditionStatus {
    fn from(s: String) -> Self {
        ConditionStatus(Cow::Owned(s))
    }
}

impl fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ReadinessGate / Condition
// ---------------------------------------------------------------------------

/// A condition the resource must report `True` before it counts as ready.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessGate {
    pub condition_type: String,
}

impl ReadinessGate {
    pub fn new(condition_type: impl Into<String>) -> Self {
        Self {
            condition_type: condition_type.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub r#type: String,
    #[serde(default)]
    pub status: ConditionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Condition {
    pub fn new(r#type: impl Into<String>, status: ConditionStatus) -> Self {
        Self {
            r#type: r#type.into(),
            status,
            reason: None,
            message: None,
        }
    }
}

// ---------------------------------------------------------------------------
// PackageRevision
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageRevisionSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub readiness_gates: Vec<ReadinessGate>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageRevisionStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// A `porch.kpt.dev/v1alpha1` PackageRevision, reduced to the fields the
/// readiness-gate controller reads and writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageRevision {
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: PackageRevisionSpec,
    #[serde(default)]
    pub status: PackageRevisionStatus,
    #[serde(flatten)]
    pub extra: Extra,
}

fn default_api_version() -> String {
    format!("{GROUP}/{VERSION}")
}

fn default_kind() -> String {
    KIND.to_string()
}

impl PackageRevision {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            api_version: default_api_version(),
            kind: default_kind(),
            metadata: ObjectMeta {
                name: name.into(),
                namespace: namespace.into(),
                ..Default::default()
            },
            spec: PackageRevisionSpec::default(),
            status: PackageRevisionStatus::default(),
            extra: Extra::new(),
        }
    }

    pub fn with_gates<I, S>(mut self, gates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spec.readiness_gates = gates.into_iter().map(ReadinessGate::new).collect();
        self
    }

    pub fn with_conditions<I, S, T>(mut self, conditions: I) -> Self
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: Into<ConditionStatus>,
    {
        self.status.conditions = conditions
            .into_iter()
            .map(|(t, status)| Condition::new(t, status.into()))
            .collect();
        self
    }

    pub fn key(&self) -> ObjectKey {
        ObjectKey::new(&self.metadata.namespace, &self.metadata.name)
    }

    pub fn resource_version(&self) -> Option<&str> {
        self.metadata.resource_version.as_deref()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
