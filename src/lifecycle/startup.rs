//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Initialize logging and metrics
//! - Build the server and bind its listener

use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{load_from_env, ConfigError, RelayConfig};
use crate::http::HttpServer;
use crate::observability::{logging, metrics};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("upstream client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("bind: {0}")]
    Bind(#[from] std::io::Error),
}

/// Load config from the environment, initialize observability, and bind.
pub async fn bootstrap() -> Result<(HttpServer, TcpListener), StartupError> {
    // Logging is not up yet; a config error is reported by main.
    let config = load_from_env()?;
    logging::init_tracing(&config.observability.log_level);

    tracing::info!("ai-relay v{} starting", env!("CARGO_PKG_VERSION"));
    log_config(&config);

    if config.observability.metrics_enabled {
        // Validation already checked the address.
        if let Ok(addr) = config.observability.metrics_address.parse::<SocketAddr>() {
            metrics::init_metrics(addr);
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;
    let server = HttpServer::new(config)?;

    tracing::info!(address = %local_addr, "Listening for connections");
    Ok((server, listener))
}

fn log_config(config: &RelayConfig) {
    tracing::info!(
        bind_address = %config.listener.bind_address,
        path = %config.route.path,
        upstream = %config.upstream.url,
        model = %config.upstream.model,
        reasoning_effort = %config.upstream.reasoning_effort,
        allow_origins = config.cors.allow_origins.len(),
        "Configuration loaded"
    );

    if config.cors.allow_origins.is_empty() {
        tracing::warn!("ALLOW_ORIGINS is empty; reflecting any origin");
    }
    if config.api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY is not set; relay requests will fail with 500");
    }
}
