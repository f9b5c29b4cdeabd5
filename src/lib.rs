//! Kubernetes operator that turns a `Wordpress` custom resource into a
//! running WordPress + MySQL installation.
//!
//! For every `Wordpress` the operator owns one Secret, two Deployments and
//! two Services. [`reconciler::Reconciler`] creates whichever of them is
//! missing, one per pass, and never updates or deletes them: removal happens
//! through owner references when the `Wordpress` is deleted.

pub mod config;
pub mod crd;
pub mod desired;
pub mod error;
pub mod operator;
pub mod reconciler;
pub mod store;
pub mod types;

pub use config::OperatorConfig;
pub use crd::{Wordpress, WordpressSpec};
pub use desired::{generate, ChildKind, ChildObject, ChildResourceSpec, ObjectKey};
pub use error::{Error, Result};
pub use operator::Operator;
pub use reconciler::{Outcome, Reconciler};
pub use store::{CreateOutcome, KubeStore, MemoryStore, ObjectStore};
