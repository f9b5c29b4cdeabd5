//! The `Wordpress` custom resource.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Desired state of a WordPress + MySQL installation.
///
/// Child Services are named `<name>-mysql` and `<name>-wordpress`, so the
/// resource name must leave room for the suffix within the 63 character
/// DNS label limit (at most 53 characters). Longer names are rejected by the
/// API server on the first tiered child and not retried.
#[derive(CustomResource, Clone, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "example.com",
    version = "v1",
    kind = "Wordpress",
    plural = "wordpresses",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct WordpressSpec {
    /// MySQL root password. Copied into the instance's Secret when it is
    /// first created; later edits are not propagated.
    pub sql_root_password: String,
}

impl WordpressSpec {
    pub fn new(sql_root_password: impl Into<String>) -> Self {
        Self {
            sql_root_password: sql_root_password.into(),
        }
    }
}

impl std::fmt::Debug for WordpressSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WordpressSpec")
            .field("sql_root_password", &"<redacted>")
            .finish()
    }
}
