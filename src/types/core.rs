use super::{Labels, Selector};
use crate::types::ChildResource;
use k8s_openapi::api::core::v1 as k8s;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use k8s_openapi::ByteString;
use std::collections::BTreeMap;

/// A Secret holding binary values.
///
/// The API server stores `data` base64 encoded. That is an encoding, not
/// encryption: anyone who can read the Secret can read its values.
#[derive(Clone, Debug, PartialEq)]
pub struct Secret {
    pub name: String,
    pub labels: Labels,
    pub type_: Option<String>,
    pub data: BTreeMap<String, Vec<u8>>,
}

impl Secret {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            labels: Labels::new(),
            type_: None,
            data: BTreeMap::new(),
        }
    }

    pub fn opaque(name: impl Into<String>) -> Self {
        Self::new(name).type_("Opaque")
    }

    pub fn labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }

    pub fn type_(mut self, t: impl Into<String>) -> Self {
        self.type_ = Some(t.into());
        self
    }

    pub fn data(mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

impl ChildResource for Secret {
    type K8sType = k8s::Secret;

    fn name(&self) -> &str {
        &self.name
    }

    fn into_k8s(self, namespace: &str, owner_ref: Option<OwnerReference>) -> Self::K8sType {
        k8s::Secret {
            metadata: ObjectMeta {
                name: Some(self.name),
                namespace: Some(namespace.to_string()),
                labels: self.labels.into_option(),
                owner_references: owner_ref.map(|r| vec![r]),
                ..Default::default()
            },
            type_: self.type_,
            data: if self.data.is_empty() {
                None
            } else {
                Some(
                    self.data
                        .into_iter()
                        .map(|(k, v)| (k, ByteString(v)))
                        .collect(),
                )
            },
            ..Default::default()
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServiceType {
    /// Reachable only from inside the cluster.
    ClusterIp,
    /// Exposed through the platform's external load balancer.
    LoadBalancer,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::ClusterIp => "ClusterIP",
            ServiceType::LoadBalancer => "LoadBalancer",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Service {
    pub name: String,
    pub labels: Labels,
    pub selector: Selector,
    pub ports: Vec<i32>,
    pub type_: ServiceType,
}

impl Service {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            labels: Labels::new(),
            selector: Selector::new(),
            ports: Vec::new(),
            type_: ServiceType::ClusterIp,
        }
    }

    pub fn labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }

    pub fn selector(mut self, selector: Selector) -> Self {
        self.selector = selector;
        self
    }

    pub fn port(mut self, port: i32) -> Self {
        self.ports.push(port);
        self
    }

    pub fn cluster_ip(mut self) -> Self {
        self.type_ = ServiceType::ClusterIp;
        self
    }

    pub fn load_balancer(mut self) -> Self {
        self.type_ = ServiceType::LoadBalancer;
        self
    }
}

impl ChildResource for Service {
    type K8sType = k8s::Service;

    fn name(&self) -> &str {
        &self.name
    }

    fn into_k8s(self, namespace: &str, owner_ref: Option<OwnerReference>) -> Self::K8sType {
        k8s::Service {
            metadata: ObjectMeta {
                name: Some(self.name),
                namespace: Some(namespace.to_string()),
                labels: self.labels.into_option(),
                owner_references: owner_ref.map(|r| vec![r]),
                ..Default::default()
            },
            spec: Some(k8s::ServiceSpec {
                selector: Some(self.selector.into_inner()),
                ports: if self.ports.is_empty() {
                    None
                } else {
                    Some(
                        self.ports
                            .into_iter()
                            .map(|port| k8s::ServicePort {
                                port,
                                ..Default::default()
                            })
                            .collect(),
                    )
                },
                type_: Some(self.type_.as_str().to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}
