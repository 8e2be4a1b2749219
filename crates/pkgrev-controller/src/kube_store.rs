//! PackageRevisions served by the Kubernetes (Porch aggregated) API.
//!
//! The API is addressed as a dynamic resource so no CRD types need to be
//! generated. Objects are converted to and from the typed model in
//! `pkgrev-core` through JSON; fields the model does not name ride along in
//! its `extra` maps, so a `replace` never strips labels, annotations or
//! other spec/status fields.

use kube::api::{Api, ApiResource, DynamicObject, GroupVersionKind, PostParams};
use kube::Client;
use pkgrev_core::types::{GROUP, KIND, PLURAL, VERSION};
use pkgrev_core::{ObjectKey, PackageRevision, PkgrevError, ResourceStore};

/// HTTP status the API server returns when `metadata.resourceVersion` is stale.
const STATUS_CONFLICT: u16 = 409;

pub fn package_revision_resource() -> ApiResource {
    let gvk = GroupVersionKind::gvk(GROUP, VERSION, KIND);
    ApiResource::from_gvk_with_plural(&gvk, PLURAL)
}

pub fn from_dynamic(obj: DynamicObject) -> pkgrev_core::Result<PackageRevision> {
    let value = serde_json::to_value(obj)?;
    Ok(serde_json::from_value(value)?)
}

pub fn to_dynamic(resource: &PackageRevision) -> pkgrev_core::Result<DynamicObject> {
    let value = serde_json::to_value(resource)?;
    Ok(serde_json::from_value(value)?)
}

#[derive(Clone)]
pub struct KubeStore {
    client: Client,
    resource: ApiResource,
}

impl KubeStore {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            resource: package_revision_resource(),
        }
    }

    fn api(&self, namespace: &str) -> Api<DynamicObject> {
        Api::namespaced_with(self.client.clone(), namespace, &self.resource)
    }
}

fn backend(e: kube::Error) -> PkgrevError {
    PkgrevError::Backend(Box::new(e))
}

impl ResourceStore for KubeStore {
    async fn fetch(&self, key: &ObjectKey) -> pkgrev_core::Result<Option<PackageRevision>> {
        let obj = self
            .api(&key.namespace)
            .get_opt(&key.name)
            .await
            .map_err(backend)?;
        obj.map(from_dynamic).transpose()
    }

    async fn update(&self, resource: &PackageRevision) -> pkgrev_core::Result<PackageRevision> {
        let key = resource.key();
        let obj = to_dynamic(resource)?;
        match self
            .api(&key.namespace)
            .replace(&key.name, &PostParams::default(), &obj)
            .await
        {
            Ok(stored) => from_dynamic(stored),
            Err(kube::Error::Api(status)) if status.code == STATUS_CONFLICT => {
                Err(PkgrevError::Conflict {
                    key: key.to_string(),
                    detail: status.message,
                })
            }
            Err(e) => Err(backend(e)),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
