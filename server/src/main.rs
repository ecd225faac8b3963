// Hospital checklist server
// Entry point: configuration, logging and the HTTP listener

use anyhow::Context;
use hospital_checklist::{api, app, config::ServerConfig};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::var_os("CHECKLIST_CONFIG").map(PathBuf::from);
    let config = ServerConfig::load(config_path.as_deref())
        .await
        .context("failed to load configuration")?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting hospital checklist server v{}", env!("CARGO_PKG_VERSION"));

    let state = app::initialize(&config)
        .await
        .context("failed to initialize application")?;

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address))?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, api::build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
