use crate::config::OperatorConfig;
use crate::crd::Wordpress;
use crate::desired::ObjectKey;
use crate::error::{Error, Result};
use crate::reconciler::{Outcome, Reconciler};
use crate::store::KubeStore;
use futures::StreamExt;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Secret, Service};
use kube::api::Api;
use kube::core::NamespaceResourceScope;
use kube::runtime::controller::{Action, Controller};
use kube::runtime::watcher::Config as WatcherConfig;
use kube::{Client, Resource, ResourceExt};
use std::sync::Arc;
use tracing::{error, info, info_span, warn};

/// Runs the `Wordpress` controller until the watch streams end.
pub struct Operator {
    config: OperatorConfig,
}

struct ControllerContext {
    reconciler: Reconciler<KubeStore>,
    config: OperatorConfig,
}

impl Operator {
    pub fn new(config: OperatorConfig) -> Self {
        Self { config }
    }

    pub async fn run(self) -> Result<()> {
        let client = Client::try_default().await.map_err(Error::Kube)?;
        let namespace = self.config.watch_namespace.clone();

        info!(
            "Starting operator for {}/{} in {}",
            Wordpress::group(&()),
            Wordpress::kind(&()),
            namespace.as_deref().unwrap_or("all namespaces")
        );

        let store = Arc::new(KubeStore::new(client.clone(), &self.config.field_manager));
        let reconciler = Reconciler::new(store, info_span!("wordpress_controller"));

        let context = Arc::new(ControllerContext {
            reconciler,
            config: self.config,
        });

        Controller::new(
            scoped_api::<Wordpress>(&client, namespace.as_deref()),
            WatcherConfig::default(),
        )
        .owns(
            scoped_api::<Secret>(&client, namespace.as_deref()),
            WatcherConfig::default(),
        )
        .owns(
            scoped_api::<Deployment>(&client, namespace.as_deref()),
            WatcherConfig::default(),
        )
        .owns(
            scoped_api::<Service>(&client, namespace.as_deref()),
            WatcherConfig::default(),
        )
        .run(reconcile, error_policy, context)
        .for_each(|result| async move {
            match result {
                Ok((resource, action)) => {
                    info!("Reconciled {} - {:?}", resource.name, action);
                }
                Err(e) => {
                    warn!("Reconciliation error: {:?}", e);
                }
            }
        })
        .await;

        Ok(())
    }
}

fn scoped_api<K>(client: &Client, namespace: Option<&str>) -> Api<K>
where
    K: Resource<DynamicType = (), Scope = NamespaceResourceScope>,
{
    match namespace {
        Some(ns) => Api::namespaced(client.clone(), ns),
        None => Api::all(client.clone()),
    }
}

async fn reconcile(resource: Arc<Wordpress>, ctx: Arc<ControllerContext>) -> Result<Action> {
    let key = ObjectKey::of(resource.as_ref());
    let outcome = ctx.reconciler.reconcile(&key).await?;
    Ok(action_for(outcome, &ctx.config))
}

fn action_for(outcome: Outcome, config: &OperatorConfig) -> Action {
    match outcome {
        Outcome::Done => Action::await_change(),
        Outcome::Retry => Action::requeue(config.retry_delay),
    }
}

fn error_policy(resource: Arc<Wordpress>, error: &Error, ctx: Arc<ControllerContext>) -> Action {
    let name = resource.name_any();
    if error.is_transient() {
        warn!("Error reconciling {}: {}", name, error);
        Action::requeue(ctx.config.error_requeue)
    } else {
        // Retrying would regenerate the same object.
        error!("Giving up on {} until it changes: {}", name, error);
        Action::await_change()
    }
}
