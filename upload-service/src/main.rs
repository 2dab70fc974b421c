use anyhow::{Context, Result};
use clap::Parser;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;

mod config;
mod handlers;
mod middleware;
mod routes;
mod storage;
#[cfg(test)]
mod test_utils;

use config::{AppConfig, Args, AwsCredentials};
use storage::{s3_client::S3Backend, StorageBridge};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub bridge: Arc<StorageBridge>,
    pub legacy_status_codes: bool,
}

// Graceful shutdown handler
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown...");
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let config = AppConfig::load(&args.config_path).with_context(|| {
        format!(
            "Failed to load configuration from {}",
            args.config_path.display()
        )
    })?;

    shared::observability::init_logging(config.log_config())
        .context("Failed to initialize logging")?;

    tracing::info!("Starting upload service v{}", env!("CARGO_PKG_VERSION"));
    if config.database_url.is_some() || config.session_key.is_some() {
        tracing::debug!("database_url and session_key are configured but not used");
    }

    let credentials = AwsCredentials::from_env().context("Missing storage credentials")?;
    let backend = S3Backend::new(&config.s3_settings(credentials)).await;

    let bridge = StorageBridge::new(
        Arc::new(backend),
        config.aws_bucket_name.clone(),
        config.aws_pictures_folder_name.clone(),
    );
    tracing::info!(
        bucket = %config.aws_bucket_name,
        prefix = %config.aws_pictures_folder_name,
        "Storage bridge ready"
    );

    let state = AppState {
        bridge: Arc::new(bridge),
        legacy_status_codes: config.legacy_status_codes,
    };

    let app = routes::create_router(state);

    let address = config.listen_address()?;
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind to {}", address))?;

    tracing::info!("Upload service listening on {}", listener.local_addr()?);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Upload service shut down gracefully");
    Ok(())
}
