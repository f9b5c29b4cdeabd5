//! wordpress-operator - converges Wordpress resources into WordPress + MySQL

use std::time::Duration;

use clap::Parser;
use kube::CustomResourceExt;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use wordpress_operator::{Operator, OperatorConfig, Wordpress};

/// Kubernetes operator for Wordpress resources
#[derive(Parser, Debug)]
#[command(name = "wordpress-operator", version, about, long_about = None)]
struct Cli {
    /// Print the Wordpress CRD manifest and exit
    #[arg(long)]
    crd: bool,

    /// Only watch this namespace (default: all namespaces)
    #[arg(long)]
    namespace: Option<String>,

    /// Seconds to wait before the next pass after creating a child
    #[arg(long)]
    retry_delay_secs: Option<u64>,

    /// Seconds to wait before retrying a failed pass
    #[arg(long)]
    error_requeue_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    if cli.crd {
        let crd = serde_yaml::to_string(&Wordpress::crd())
            .map_err(|e| anyhow::anyhow!("Failed to serialize CRD: {}", e))?;
        println!("{crd}");
        return Ok(());
    }

    let mut config = OperatorConfig::from_env()?;
    if let Some(namespace) = cli.namespace {
        config = config.watch_namespace(namespace);
    }
    if let Some(secs) = cli.retry_delay_secs {
        config = config.retry_delay(Duration::from_secs(secs));
    }
    if let Some(secs) = cli.error_requeue_secs {
        config = config.error_requeue(Duration::from_secs(secs));
    }

    Operator::new(config).run().await?;
    Ok(())
}
