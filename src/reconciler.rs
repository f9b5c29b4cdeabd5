//! Convergence of a single `Wordpress` toward its desired children.

use std::sync::Arc;

use tracing::{debug, error, info, info_span, Instrument, Span};

use crate::desired::{ObjectKey, PLAN};
use crate::error::Result;
use crate::store::{CreateOutcome, ObjectStore};

/// What the dispatcher should do after a successful pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Every child exists, or the parent is gone.
    Done,
    /// A child was created; run again to continue converging.
    Retry,
}

/// Drives a parent's children into existence, one per call.
///
/// Holds no state between calls: every pass re-reads the store. The
/// dispatcher must not run two passes for the same key concurrently.
pub struct Reconciler<S> {
    store: Arc<S>,
    log: Span,
}

impl<S: ObjectStore> Reconciler<S> {
    /// `log` is the parent span for every pass.
    pub fn new(store: Arc<S>, log: Span) -> Self {
        Self { store, log }
    }

    pub async fn reconcile(&self, key: &ObjectKey) -> Result<Outcome> {
        let span = info_span!(
            parent: &self.log,
            "reconcile",
            namespace = %key.namespace,
            name = %key.name
        );
        self.converge(key).instrument(span).await
    }

    async fn converge(&self, key: &ObjectKey) -> Result<Outcome> {
        info!("Reconciling Wordpress");

        let parent = match self.store.get_parent(key).await {
            Ok(Some(parent)) => parent,
            Ok(None) => {
                // Owned children are removed through their owner references.
                debug!("Wordpress not found, nothing to do");
                return Ok(Outcome::Done);
            }
            Err(e) => {
                error!(error = %e, "Failed to get Wordpress");
                return Err(e);
            }
        };

        if parent.metadata.deletion_timestamp.is_some() {
            debug!("Wordpress is being deleted, skipping");
            return Ok(Outcome::Done);
        }

        for (kind, build) in PLAN {
            let child_key = kind.key(key);
            let resource = kind.resource();

            let found = self.store.exists(resource, &child_key).await.map_err(|e| {
                error!(error = %e, %kind, %resource, key = %child_key, "Failed to look up child");
                e
            })?;
            if found {
                continue;
            }

            let child = build(&parent);
            child.validate().map_err(|e| {
                error!(error = %e, %kind, "Generated child is malformed");
                e
            })?;

            info!(%kind, %resource, key = %child.key, "Creating child");
            match self.store.create(&child).await {
                Ok(CreateOutcome::Created) => return Ok(Outcome::Retry),
                Ok(CreateOutcome::AlreadyExists) => {
                    debug!(%kind, key = %child.key, "Child created concurrently, treating as present");
                }
                Err(e) => {
                    error!(error = %e, %kind, %resource, key = %child.key, "Failed to create child");
                    return Err(e);
                }
            }
        }

        info!("All children present");
        Ok(Outcome::Done)
    }
}
