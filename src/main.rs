use std::sync::Arc;

use clap::Parser;
use kvproxy::config::{Cli, ClusterConfig, Config};
use kvproxy::driver::DriverListener;
use kvproxy::store::{MemoryStore, StoreClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let filter = match &cli.log_filter {
        Some(directive) => tracing_subscriber::EnvFilter::try_new(directive)?,
        None => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "kvproxy=info".into()),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load(&cli.config_file)?;
    tracing::info!(
        "Loaded {} cluster(s) from {}",
        config.clusters.len(),
        cli.config_file.display()
    );

    let mut listeners = Vec::with_capacity(config.clusters.len());
    let mut tasks = tokio::task::JoinSet::new();
    for cluster in &config.clusters {
        let listener = Arc::new(DriverListener::bind(&cluster.socket, cluster.name.clone())?);
        let store = connect_store(cluster);
        let queue_size = cluster.connection_queue_size;
        listeners.push(listener.clone());
        tasks.spawn(async move { listener.serve(store, queue_size).await });
    }

    tokio::select! {
        _ = shutdown_signal() => {}
        Some(joined) = tasks.join_next() => {
            match joined {
                Ok(Ok(())) => tracing::warn!("A cluster listener stopped"),
                Ok(Err(e)) => tracing::error!("Cluster listener failed: {}", e),
                Err(e) => tracing::error!("Cluster listener task failed: {}", e),
            }
        }
    }

    tasks.shutdown().await;
    // Dropping the last listener handles removes the socket files.
    drop(listeners);
    tracing::info!("Shutdown complete");
    Ok(())
}

fn connect_store(cluster: &ClusterConfig) -> Arc<dyn StoreClient> {
    let hosts: Vec<String> = cluster.hosts.iter().map(ToString::to_string).collect();
    tracing::info!(
        "Cluster {}: seeds [{}], auth {:?}, in-memory store",
        cluster.name,
        hosts.join(", "),
        cluster.auth_mode
    );

    let store = MemoryStore::new();
    match (&cluster.user, &cluster.password) {
        (Some(user), Some(password)) => Arc::new(store.with_admin(user, password)),
        (Some(user), None) => Arc::new(store.with_admin(user, "")),
        _ => Arc::new(store),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
