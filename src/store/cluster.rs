use async_trait::async_trait;
use k8s_openapi::api::apps::v1 as apps;
use k8s_openapi::api::core::v1 as k8s;
use kube::api::{Api, PostParams};
use kube::core::NamespaceResourceScope;
use kube::{Client, Resource};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::{CreateOutcome, ObjectStore};
use crate::crd::Wordpress;
use crate::desired::{ChildObject, ChildResourceSpec, ObjectKey, ResourceKind};
use crate::error::{Error, Result};

/// [`ObjectStore`] backed by the Kubernetes API server.
///
/// Cascading deletion is provided by the API server's garbage collector
/// through the owner references set on every child.
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
    field_manager: String,
}

impl KubeStore {
    pub fn new(client: Client, field_manager: impl Into<String>) -> Self {
        Self {
            client,
            field_manager: field_manager.into(),
        }
    }

    fn api<K>(&self, namespace: &str) -> Api<K>
    where
        K: Resource<DynamicType = (), Scope = NamespaceResourceScope>,
    {
        Api::namespaced(self.client.clone(), namespace)
    }

    async fn lookup<K>(&self, key: &ObjectKey) -> Result<bool>
    where
        K: Resource<DynamicType = (), Scope = NamespaceResourceScope>
            + Clone
            + std::fmt::Debug
            + DeserializeOwned,
    {
        match self.api::<K>(&key.namespace).get(&key.name).await {
            Ok(_) => Ok(true),
            Err(e) => lookup_failure(e),
        }
    }

    async fn post<K>(&self, key: &ObjectKey, object: &K) -> Result<CreateOutcome>
    where
        K: Resource<DynamicType = (), Scope = NamespaceResourceScope>
            + Clone
            + std::fmt::Debug
            + Serialize
            + DeserializeOwned,
    {
        let params = PostParams {
            field_manager: Some(self.field_manager.clone()),
            ..Default::default()
        };

        match self.api::<K>(&key.namespace).create(&params, object).await {
            Ok(_) => Ok(CreateOutcome::Created),
            Err(e) => {
                let outcome = create_failure(e)?;
                debug!(%key, kind = %K::kind(&()), "create raced with an existing object");
                Ok(outcome)
            }
        }
    }
}

/// A lookup that failed with NotFound means the object is absent.
fn lookup_failure(err: kube::Error) -> Result<bool> {
    match err {
        kube::Error::Api(e) if e.code == 404 => Ok(false),
        e => Err(Error::Kube(e)),
    }
}

/// Only a duplicate-name conflict is benign; any other 409 is a real error.
fn create_failure(err: kube::Error) -> Result<CreateOutcome> {
    match err {
        kube::Error::Api(e) if e.code == 409 && e.reason == "AlreadyExists" => {
            Ok(CreateOutcome::AlreadyExists)
        }
        e => Err(Error::Kube(e)),
    }
}

#[async_trait]
impl ObjectStore for KubeStore {
    async fn get_parent(&self, key: &ObjectKey) -> Result<Option<Wordpress>> {
        self.api::<Wordpress>(&key.namespace)
            .get_opt(&key.name)
            .await
            .map_err(Error::Kube)
    }

    async fn exists(&self, resource: ResourceKind, key: &ObjectKey) -> Result<bool> {
        match resource {
            ResourceKind::Secret => self.lookup::<k8s::Secret>(key).await,
            ResourceKind::Deployment => self.lookup::<apps::Deployment>(key).await,
            ResourceKind::Service => self.lookup::<k8s::Service>(key).await,
        }
    }

    async fn create(&self, child: &ChildResourceSpec) -> Result<CreateOutcome> {
        match &child.object {
            ChildObject::Secret(secret) => self.post(&child.key, secret).await,
            ChildObject::Deployment(deployment) => self.post(&child.key, deployment).await,
            ChildObject::Service(service) => self.post(&child.key, service).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::core::ErrorResponse;

    fn api_error(code: u16, reason: &str) -> kube::Error {
        kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: format!("{reason} for test"),
            reason: reason.to_string(),
            code,
        })
    }

    #[test]
    fn not_found_lookup_is_absent() {
        assert!(!lookup_failure(api_error(404, "NotFound")).unwrap());
    }

    #[test]
    fn other_lookup_failures_are_errors() {
        for (code, reason) in [(403, "Forbidden"), (500, "InternalError"), (503, "ServiceUnavailable")] {
            let err = lookup_failure(api_error(code, reason)).unwrap_err();
            assert!(matches!(err, Error::Kube(kube::Error::Api(ref e)) if e.code == code));
            assert!(err.is_transient());
        }
    }

    #[test]
    fn duplicate_create_is_already_exists() {
        let outcome = create_failure(api_error(409, "AlreadyExists")).unwrap();
        assert_eq!(outcome, CreateOutcome::AlreadyExists);
    }

    #[test]
    fn other_conflicts_are_errors() {
        let err = create_failure(api_error(409, "Conflict")).unwrap_err();
        assert!(matches!(err, Error::Kube(kube::Error::Api(ref e)) if e.reason == "Conflict"));
        assert!(err.is_transient());
    }

    #[test]
    fn server_failures_on_create_are_errors() {
        for code in [500, 503] {
            assert!(create_failure(api_error(code, "InternalError")).is_err());
        }
        assert!(create_failure(api_error(404, "NotFound")).is_err());
    }
}
