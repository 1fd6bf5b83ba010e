//! Storage Cluster Operator entrypoint
//!
//! Starts the StorageCluster controller against the ambient kubeconfig or
//! in-cluster service account.

use clap::Parser;
use kube::Client;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use storage_cluster_operator::{controller, Error, Result};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Storage Cluster Operator - External Cluster Bootstrap
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Watch a single namespace instead of all namespaces
    #[arg(long, env = "WATCH_NAMESPACE")]
    watch_namespace: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args);

    info!("Starting Storage Cluster Operator");
    info!("  Version: {}", storage_cluster_operator::VERSION);
    info!(
        "  Watching: {}",
        args.watch_namespace.as_deref().unwrap_or("all namespaces")
    );

    let client = Client::try_default().await.map_err(Error::Kube)?;

    if let Err(err) = controller::run(client, args.watch_namespace).await {
        error!(error = %err, "controller exited");
        return Err(err);
    }
    Ok(())
}

fn init_logging(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level.clone()));

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
    }
}
