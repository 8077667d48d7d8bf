//! wildlens-id - Species Identification Gateway
//!
//! **Module Identity:**
//! - Name: wildlens-id (Identification Gateway)
//! - Port: 5741 (loopback only)
//!
//! Proxies photo identification requests from local clients to the remote
//! identification service, holding the API key so clients never see it, and
//! converts the remote schema to the gateway wire contract.

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use wildlens_id::config::IdConfig;
use wildlens_id::services::InsectIdClient;
use wildlens_id::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing (RUST_LOG overrides the info default)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting wildlens-id (Identification Gateway)");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let toml_config = wildlens_common::config::load_toml_config();
    let config = IdConfig::resolve(&toml_config);

    if config.api_key.is_none() {
        warn!("No API key configured; identification requests will be rejected until one is set");
    }
    info!("Identification service: {}", config.service_url);

    let identifier = InsectIdClient::new(&config.service_url, config.api_key.clone())?;
    let state = AppState::new(identifier);
    let app = wildlens_id::build_router(state);

    // Loopback bind: the gateway is a local companion service, not public
    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", config.port)).await?;
    info!("Listening on http://127.0.0.1:{}", config.port);
    info!("Health check: http://127.0.0.1:{}/health", config.port);

    axum::serve(listener, app).await?;

    Ok(())
}
