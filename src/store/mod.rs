//! Access to the cluster objects the reconciler reads and creates.

mod cluster;
mod memory;

pub use cluster::KubeStore;
pub use memory::{MemoryStore, Mutation};

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use crate::crd::Wordpress;
use crate::desired::{ChildResourceSpec, ObjectKey, ResourceKind};
use crate::error::Result;

/// Result of a create that did not fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    /// An object with the same kind and key already exists.
    AlreadyExists,
}

/// The object store the convergence loop runs against.
///
/// Implementations must honour owner references on created children: when a
/// parent is removed, every object owned by it is removed as well.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch a `Wordpress`. `Ok(None)` when it does not exist.
    async fn get_parent(&self, key: &ObjectKey) -> Result<Option<Wordpress>>;

    async fn exists(&self, resource: ResourceKind, key: &ObjectKey) -> Result<bool>;

    /// Persist a child. Only a duplicate key is reported as `AlreadyExists`;
    /// every other rejection is an error.
    async fn create(&self, child: &ChildResourceSpec) -> Result<CreateOutcome>;
}
