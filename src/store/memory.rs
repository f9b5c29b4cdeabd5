use std::collections::BTreeMap;

use async_trait::async_trait;
use kube::ResourceExt;
use tokio::sync::Mutex;
use tracing::debug;

use super::{CreateOutcome, ObjectStore};
use crate::crd::Wordpress;
use crate::desired::{ChildObject, ChildResourceSpec, ObjectKey, ResourceKind};
use crate::error::Result;

/// A change made to the children held by a [`MemoryStore`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mutation {
    Created {
        resource: ResourceKind,
        key: ObjectKey,
    },
    Deleted {
        resource: ResourceKind,
        key: ObjectKey,
    },
}

#[derive(Default)]
struct State {
    next_uid: u64,
    parents: BTreeMap<ObjectKey, Wordpress>,
    children: BTreeMap<(ResourceKind, ObjectKey), ChildObject>,
    mutations: Vec<Mutation>,
}

/// In-process [`ObjectStore`].
///
/// There is no garbage collector here, so [`MemoryStore::delete_parent`]
/// removes owned children itself by matching owner reference uids.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a parent, assigning a uid when it has none. Returns the stored copy.
    pub async fn insert_parent(&self, mut parent: Wordpress) -> Wordpress {
        let mut state = self.state.lock().await;
        if parent.metadata.uid.is_none() {
            state.next_uid += 1;
            parent.metadata.uid = Some(format!("memory-uid-{}", state.next_uid));
        }
        state
            .parents
            .insert(ObjectKey::of(&parent), parent.clone());
        parent
    }

    /// Remove a parent and every child it owns. Returns false if the parent
    /// was not present.
    pub async fn delete_parent(&self, key: &ObjectKey) -> bool {
        let mut state = self.state.lock().await;
        let Some(parent) = state.parents.remove(key) else {
            return false;
        };
        let uid = parent.uid().unwrap_or_default();

        let owned: Vec<(ResourceKind, ObjectKey)> = state
            .children
            .iter()
            .filter(|(_, object)| {
                object
                    .metadata()
                    .owner_references
                    .iter()
                    .flatten()
                    .any(|r| r.uid == uid)
            })
            .map(|(id, _)| id.clone())
            .collect();

        for (resource, child_key) in owned {
            state.children.remove(&(resource, child_key.clone()));
            debug!(parent = %key, %resource, key = %child_key, "cascading delete");
            state.mutations.push(Mutation::Deleted {
                resource,
                key: child_key,
            });
        }
        true
    }

    pub async fn child(&self, resource: ResourceKind, key: &ObjectKey) -> Option<ChildObject> {
        let state = self.state.lock().await;
        state.children.get(&(resource, key.clone())).cloned()
    }

    pub async fn child_count(&self) -> usize {
        self.state.lock().await.children.len()
    }

    /// Every child mutation, oldest first.
    pub async fn mutations(&self) -> Vec<Mutation> {
        self.state.lock().await.mutations.clone()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get_parent(&self, key: &ObjectKey) -> Result<Option<Wordpress>> {
        Ok(self.state.lock().await.parents.get(key).cloned())
    }

    async fn exists(&self, resource: ResourceKind, key: &ObjectKey) -> Result<bool> {
        let state = self.state.lock().await;
        Ok(state.children.contains_key(&(resource, key.clone())))
    }

    async fn create(&self, child: &ChildResourceSpec) -> Result<CreateOutcome> {
        let mut state = self.state.lock().await;
        let id = (child.object.resource(), child.key.clone());
        if state.children.contains_key(&id) {
            return Ok(CreateOutcome::AlreadyExists);
        }
        state.children.insert(id, child.object.clone());
        state.mutations.push(Mutation::Created {
            resource: child.object.resource(),
            key: child.key.clone(),
        });
        Ok(CreateOutcome::Created)
    }
}
