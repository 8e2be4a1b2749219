use k8s_openapi::api::rbac::v1::{ClusterRole, PolicyRule};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use pkgrev_core::types::{GROUP, PLURAL};

pub const DEFAULT_ROLE_NAME: &str = "pkgrev-controller";

fn rule(resource: String, verbs: &[&str]) -> PolicyRule {
    PolicyRule {
        api_groups: Some(vec![GROUP.to_string()]),
        resources: Some(vec![resource]),
        verbs: verbs.iter().map(|v| v.to_string()).collect(),
        ..Default::default()
    }
}

/// Permissions the controller needs on PackageRevisions and their status.
pub fn cluster_role(name: &str) -> ClusterRole {
    ClusterRole {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        rules: Some(vec![
            rule(
                PLURAL.to_string(),
                &["get", "list", "watch", "create", "update", "patch", "delete"],
            ),
            rule(format!("{PLURAL}/status"), &["get", "update", "patch"]),
        ]),
        ..Default::default()
    }
}
