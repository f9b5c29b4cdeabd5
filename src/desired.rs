//! Desired state of a `Wordpress` instance.
//!
//! Maps a parent resource to the five child objects it implies. Everything
//! here is pure: the same parent always yields the same objects.

use std::collections::BTreeMap;
use std::fmt;

use k8s_openapi::api::apps::v1 as apps;
use k8s_openapi::api::core::v1 as k8s;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use kube::{Resource, ResourceExt};

use crate::crd::Wordpress;
use crate::error::{Error, Result};
use crate::types::{ChildResource, Container, Deployment, Labels, Secret, Service};

pub const APP_LABEL: &str = "app";
pub const APP_LABEL_VALUE: &str = "wordpress";
pub const INSTANCE_LABEL: &str = "wordpress_cr";
pub const TIER_LABEL: &str = "tier";

/// Key of the credential inside the instance's Secret.
pub const PASSWORD_KEY: &str = "password";

pub const MYSQL_IMAGE: &str = "mysql:5.6";
pub const MYSQL_PORT: i32 = 3306;
pub const WORDPRESS_IMAGE: &str = "wordpress:4.8-apache";
pub const WORDPRESS_PORT: i32 = 80;

/// Namespace and name of an object.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
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

    pub fn of<K: Resource>(resource: &K) -> Self {
        Self {
            namespace: resource.namespace().unwrap_or_default(),
            name: resource.name_any(),
        }
    }

    fn with_suffix(&self, suffix: &str) -> Self {
        Self {
            namespace: self.namespace.clone(),
            name: format!("{}{}", self.name, suffix),
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tier {
    Mysql,
    Frontend,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Mysql => "mysql",
            Tier::Frontend => "frontend",
        }
    }

    /// Name suffix shared by the workload and the exposure of this tier.
    pub fn suffix(&self) -> &'static str {
        match self {
            Tier::Mysql => "-mysql",
            Tier::Frontend => "-wordpress",
        }
    }
}

/// The API type a child is stored under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    Secret,
    Deployment,
    Service,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Secret => "Secret",
            ResourceKind::Deployment => "Deployment",
            ResourceKind::Service => "Service",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChildKind {
    Credential,
    DatabaseWorkload,
    DatabaseExposure,
    AppWorkload,
    AppExposure,
}

impl ChildKind {
    pub fn resource(&self) -> ResourceKind {
        match self {
            ChildKind::Credential => ResourceKind::Secret,
            ChildKind::DatabaseWorkload | ChildKind::AppWorkload => ResourceKind::Deployment,
            ChildKind::DatabaseExposure | ChildKind::AppExposure => ResourceKind::Service,
        }
    }

    pub fn tier(&self) -> Option<Tier> {
        match self {
            ChildKind::Credential => None,
            ChildKind::DatabaseWorkload | ChildKind::DatabaseExposure => Some(Tier::Mysql),
            ChildKind::AppWorkload | ChildKind::AppExposure => Some(Tier::Frontend),
        }
    }

    /// Key of this child for the parent identified by `parent`.
    pub fn key(&self, parent: &ObjectKey) -> ObjectKey {
        match self.tier() {
            None => parent.clone(),
            Some(tier) => parent.with_suffix(tier.suffix()),
        }
    }
}

impl fmt::Display for ChildKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChildKind::Credential => "Credential",
            ChildKind::DatabaseWorkload => "DatabaseWorkload",
            ChildKind::DatabaseExposure => "DatabaseExposure",
            ChildKind::AppWorkload => "AppWorkload",
            ChildKind::AppExposure => "AppExposure",
        };
        f.write_str(name)
    }
}

/// A rendered child, ready to be handed to the store.
#[derive(Clone, Debug, PartialEq)]
pub enum ChildObject {
    Secret(k8s::Secret),
    Deployment(apps::Deployment),
    Service(k8s::Service),
}

impl ChildObject {
    pub fn resource(&self) -> ResourceKind {
        match self {
            ChildObject::Secret(_) => ResourceKind::Secret,
            ChildObject::Deployment(_) => ResourceKind::Deployment,
            ChildObject::Service(_) => ResourceKind::Service,
        }
    }

    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            ChildObject::Secret(s) => &s.metadata,
            ChildObject::Deployment(d) => &d.metadata,
            ChildObject::Service(s) => &s.metadata,
        }
    }

    /// Labels this object selects pods by; `None` for a Secret.
    pub fn selector(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            ChildObject::Secret(_) => None,
            ChildObject::Deployment(d) => d.spec.as_ref()?.selector.match_labels.as_ref(),
            ChildObject::Service(s) => s.spec.as_ref()?.selector.as_ref(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChildResourceSpec {
    pub kind: ChildKind,
    pub key: ObjectKey,
    pub labels: Labels,
    pub owner_ref: OwnerReference,
    pub object: ChildObject,
}

impl ChildResourceSpec {
    /// Checks that the rendered object is the one its key and kind promise.
    pub fn validate(&self) -> Result<()> {
        let fail = |reason: &str| Error::MalformedChild {
            kind: self.kind.to_string(),
            key: self.key.to_string(),
            reason: reason.to_string(),
        };

        if self.key.namespace.is_empty() || self.key.name.is_empty() {
            return Err(fail("empty namespace or name"));
        }
        if self.object.resource() != self.kind.resource() {
            return Err(fail("object type does not match child kind"));
        }

        let meta = self.object.metadata();
        if meta.name.as_deref() != Some(self.key.name.as_str())
            || meta.namespace.as_deref() != Some(self.key.namespace.as_str())
        {
            return Err(fail("object metadata does not match key"));
        }
        if meta.labels.as_ref() != Some(self.labels.inner()) {
            return Err(fail("object labels do not match"));
        }
        if self.labels.get(APP_LABEL).map(String::as_str) != Some(APP_LABEL_VALUE)
            || self.labels.get(INSTANCE_LABEL).is_none()
        {
            return Err(fail("missing instance labels"));
        }
        if self.labels.get(TIER_LABEL).map(String::as_str) != self.kind.tier().map(|t| t.as_str()) {
            return Err(fail("tier label does not match child kind"));
        }
        if self.kind.resource() != ResourceKind::Secret
            && self.object.selector() != Some(self.labels.inner())
        {
            return Err(fail("selector does not match tier labels"));
        }

        if self.owner_ref.uid.is_empty() {
            return Err(fail("owner reference has no uid"));
        }
        let owned = meta
            .owner_references
            .as_ref()
            .is_some_and(|refs| refs.contains(&self.owner_ref));
        if !owned {
            return Err(fail("object does not carry the owner reference"));
        }

        Ok(())
    }
}

pub type GenerateFn = fn(&Wordpress) -> ChildResourceSpec;

/// Children in the order they are converged, with the function producing each.
pub const PLAN: [(ChildKind, GenerateFn); 5] = [
    (ChildKind::Credential, credential),
    (ChildKind::DatabaseWorkload, database_workload),
    (ChildKind::DatabaseExposure, database_exposure),
    (ChildKind::AppWorkload, app_workload),
    (ChildKind::AppExposure, app_exposure),
];

pub fn generate(parent: &Wordpress, kind: ChildKind) -> ChildResourceSpec {
    match kind {
        ChildKind::Credential => credential(parent),
        ChildKind::DatabaseWorkload => database_workload(parent),
        ChildKind::DatabaseExposure => database_exposure(parent),
        ChildKind::AppWorkload => app_workload(parent),
        ChildKind::AppExposure => app_exposure(parent),
    }
}

/// Labels shared by every child of the instance `name`.
pub fn instance_labels(name: &str) -> Labels {
    Labels::new()
        .insert(APP_LABEL, APP_LABEL_VALUE)
        .insert(INSTANCE_LABEL, name)
}

pub fn tier_labels(name: &str, tier: Tier) -> Labels {
    instance_labels(name).insert(TIER_LABEL, tier.as_str())
}

/// Controller reference back to `parent`, used for garbage collection and
/// for routing child events to the parent's key.
pub fn owner_reference(parent: &Wordpress) -> OwnerReference {
    OwnerReference {
        api_version: Wordpress::api_version(&()).to_string(),
        kind: Wordpress::kind(&()).to_string(),
        name: parent.name_any(),
        uid: parent.uid().unwrap_or_default(),
        controller: Some(true),
        block_owner_deletion: Some(true),
    }
}

fn child<T>(parent: &Wordpress, kind: ChildKind, labels: Labels, builder: T) -> ChildResourceSpec
where
    T: ChildResource,
    ChildObject: From<T::K8sType>,
{
    let parent_key = ObjectKey::of(parent);
    let key = kind.key(&parent_key);
    debug_assert_eq!(builder.name(), key.name);
    let owner_ref = owner_reference(parent);
    let object = builder.into_k8s(&key.namespace, Some(owner_ref.clone()));
    ChildResourceSpec {
        kind,
        key,
        labels,
        owner_ref,
        object: object.into(),
    }
}

/// The credential Secret. The password is stored as Secret data, which the
/// API server only base64 encodes; this is obfuscation, not encryption.
fn credential(parent: &Wordpress) -> ChildResourceSpec {
    let name = parent.name_any();
    let labels = instance_labels(&name);
    let secret = Secret::opaque(&name)
        .labels(labels.clone())
        .data(PASSWORD_KEY, parent.spec.sql_root_password.as_bytes());
    child(parent, ChildKind::Credential, labels, secret)
}

fn database_workload(parent: &Wordpress) -> ChildResourceSpec {
    let name = parent.name_any();
    let labels = tier_labels(&name, Tier::Mysql);
    let deployment = Deployment::new(format!("{name}{}", Tier::Mysql.suffix()))
        .labels(labels.clone())
        .container(
            Container::new("mysql", MYSQL_IMAGE)
                .env_from_secret("MYSQL_ROOT_PASSWORD", &name, PASSWORD_KEY)
                .named_port("mysql", MYSQL_PORT),
        );
    child(parent, ChildKind::DatabaseWorkload, labels, deployment)
}

fn database_exposure(parent: &Wordpress) -> ChildResourceSpec {
    let name = parent.name_any();
    let labels = tier_labels(&name, Tier::Mysql);
    let service = Service::new(format!("{name}{}", Tier::Mysql.suffix()))
        .labels(labels.clone())
        .selector(labels.selector())
        .port(MYSQL_PORT)
        .cluster_ip();
    child(parent, ChildKind::DatabaseExposure, labels, service)
}

/// The WordPress workload finds MySQL through the database Service name.
fn app_workload(parent: &Wordpress) -> ChildResourceSpec {
    let name = parent.name_any();
    let labels = tier_labels(&name, Tier::Frontend);
    let database_host = format!("{name}{}", Tier::Mysql.suffix());
    let deployment = Deployment::new(format!("{name}{}", Tier::Frontend.suffix()))
        .labels(labels.clone())
        .container(
            Container::new("wordpress", WORDPRESS_IMAGE)
                .env_from_secret("WORDPRESS_DB_PASSWORD", &name, PASSWORD_KEY)
                .env("WORDPRESS_DB_HOST", database_host)
                .named_port("wordpress", WORDPRESS_PORT),
        );
    child(parent, ChildKind::AppWorkload, labels, deployment)
}

fn app_exposure(parent: &Wordpress) -> ChildResourceSpec {
    let name = parent.name_any();
    let labels = tier_labels(&name, Tier::Frontend);
    let service = Service::new(format!("{name}{}", Tier::Frontend.suffix()))
        .labels(labels.clone())
        .selector(labels.selector())
        .port(WORDPRESS_PORT)
        .load_balancer();
    child(parent, ChildKind::AppExposure, labels, service)
}

impl From<k8s::Secret> for ChildObject {
    fn from(secret: k8s::Secret) -> Self {
        ChildObject::Secret(secret)
    }
}

impl From<apps::Deployment> for ChildObject {
    fn from(deployment: apps::Deployment) -> Self {
        ChildObject::Deployment(deployment)
    }
}

impl From<k8s::Service> for ChildObject {
    fn from(service: k8s::Service) -> Self {
        ChildObject::Service(service)
    }
}
