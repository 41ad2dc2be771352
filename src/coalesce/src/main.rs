//! Coalesce — Master Data Management engine.
//!
//! Main entry point that initializes the store and serves the REST API.

use clap::Parser;
use coalesce_api::ApiServer;
use coalesce_core::config::AppConfig;
use coalesce_store::MemoryStore;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "coalesce")]
#[command(about = "Master Data Management engine — dedupe customer records into golden records")]
#[command(version)]
struct Cli {
    /// HTTP port (overrides config)
    #[arg(long, env = "COALESCE__API__HTTP_PORT")]
    http_port: Option<u16>,

    /// Upload directory (overrides config)
    #[arg(long, env = "COALESCE__UPLOAD__DIR")]
    upload_dir: Option<String>,

    /// Default matching threshold (overrides config)
    #[arg(long, env = "COALESCE__MATCHING__DEFAULT_THRESHOLD")]
    threshold: Option<f64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coalesce=info,tower_http=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("Coalesce starting up");

    // Load configuration
    let mut config = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    // Apply CLI overrides
    if let Some(port) = cli.http_port {
        config.api.http_port = port;
    }
    if let Some(upload_dir) = cli.upload_dir {
        config.upload.dir = upload_dir;
    }
    if let Some(threshold) = cli.threshold {
        config.matching.default_threshold = threshold;
    }

    info!(
        http_port = config.api.http_port,
        upload_dir = %config.upload.dir,
        threshold = config.matching.default_threshold,
        "Configuration loaded"
    );

    std::fs::create_dir_all(&config.upload.dir)?;

    let store = Arc::new(MemoryStore::new());
    let api_server = ApiServer::new(config.clone(), store);

    // Start metrics exporter
    if let Err(e) = api_server.start_metrics().await {
        error!(error = %e, "Failed to start metrics exporter");
    }

    info!("Coalesce is ready to serve traffic");

    // Graceful shutdown: listen for SIGTERM/SIGINT
    let shutdown = async {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            let mut sigterm =
                tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                    .expect("failed to register SIGTERM handler");
            tokio::select! {
                _ = ctrl_c => info!("Received SIGINT, shutting down"),
                _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
            }
        }

        #[cfg(not(unix))]
        {
            ctrl_c.await.ok();
            info!("Received SIGINT, shutting down");
        }
    };

    // Start HTTP server with graceful shutdown
    let addr = std::net::SocketAddr::new(config.api.host.parse()?, config.api.http_port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "Starting HTTP server");
    axum::serve(listener, api_server.into_router())
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Coalesce shut down cleanly");
    Ok(())
}
