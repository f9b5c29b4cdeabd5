use k8s_openapi::api::core::v1 as k8s;

#[derive(Clone, Debug, PartialEq)]
pub struct Container {
    pub name: String,
    pub image: String,
    pub ports: Vec<ContainerPort>,
    pub env: Vec<EnvVar>,
}

impl Container {
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            ports: Vec::new(),
            env: Vec::new(),
        }
    }

    pub fn named_port(mut self, name: impl Into<String>, port: i32) -> Self {
        self.ports.push(ContainerPort {
            container_port: port,
            name: Some(name.into()),
        });
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push(EnvVar::Value {
            name: key.into(),
            value: value.into(),
        });
        self
    }

    /// Binds `name` to a key of a Secret. The kubelet resolves the value when
    /// the pod starts.
    pub fn env_from_secret(
        mut self,
        name: impl Into<String>,
        secret_name: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        self.env.push(EnvVar::SecretRef {
            name: name.into(),
            secret_name: secret_name.into(),
            key: key.into(),
        });
        self
    }

    pub fn into_k8s(self) -> k8s::Container {
        k8s::Container {
            name: self.name,
            image: Some(self.image),
            ports: if self.ports.is_empty() {
                None
            } else {
                Some(self.ports.into_iter().map(|p| p.into_k8s()).collect())
            },
            env: if self.env.is_empty() {
                None
            } else {
                Some(self.env.into_iter().map(|e| e.into_k8s()).collect())
            },
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ContainerPort {
    pub container_port: i32,
    pub name: Option<String>,
}

impl ContainerPort {
    pub fn into_k8s(self) -> k8s::ContainerPort {
        k8s::ContainerPort {
            container_port: self.container_port,
            name: self.name,
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum EnvVar {
    Value {
        name: String,
        value: String,
    },
    SecretRef {
        name: String,
        secret_name: String,
        key: String,
    },
}

impl EnvVar {
    pub fn into_k8s(self) -> k8s::EnvVar {
        match self {
            EnvVar::Value { name, value } => k8s::EnvVar {
                name,
                value: Some(value),
                value_from: None,
            },
            EnvVar::SecretRef {
                name,
                secret_name,
                key,
            } => k8s::EnvVar {
                name,
                value: None,
                value_from: Some(k8s::EnvVarSource {
                    secret_key_ref: Some(k8s::SecretKeySelector {
                        name: secret_name,
                        key,
                        optional: None,
                    }),
                    ..Default::default()
                }),
            },
        }
    }
}
