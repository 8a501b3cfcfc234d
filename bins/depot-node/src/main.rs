//! Server daemon for the DEPOT artifact cache.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use anyhow::{Context, Result};
use depot_node::NodeConfig;
use depot_service::facade;
use depot_store::StorageConfig;
use tracing::{error, info};

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "depot=debug,info".to_string()),
        )
        .init();

    info!("Starting DEPOT node...");

    // Determine config path
    let config_path = std::env::var("DEPOT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .expect("Could not determine home directory")
                .join(".depot")
                .join("config.toml")
        });

    let config = match NodeConfig::load_or_create(&config_path) {
        Ok(cfg) => {
            info!("Loaded config from: {}", config_path.display());
            cfg
        }
        Err(e) => {
            error!("Failed to load config: {}", e);
            return Err(e.into());
        }
    };

    let bind: IpAddr = config
        .node
        .bind
        .parse()
        .with_context(|| format!("invalid bind address {}", config.node.bind))?;
    let addr = SocketAddr::new(bind, config.node.port);

    let storage = StorageConfig {
        base_dir: config.storage.directory.clone(),
    };

    facade::init_server(addr, &storage).await?;
    info!("Blob server initialized on {}", addr);

    shutdown_signal().await;

    info!("Initiating graceful shutdown...");
    facade::shutdown().await;

    info!("Node stopped gracefully");
    Ok(())
}
