//! Carhire edge gatekeeper
//!
//! Locale, session and role gate in front of the page renderer and API.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use carhire_gatekeeper::{AppState, Config, build_router};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    info!("Starting carhire edge gatekeeper");

    let config = Config::from_env().context("failed to load configuration")?;
    info!(
        port = config.port,
        public_origin = %config.public_origin,
        upstream = ?config.upstream_url.as_ref().map(|u| u.as_str()),
        "Configuration loaded"
    );

    let state = AppState::new(&config).context("failed to initialize application state")?;

    for path in state.route_table().overlaps() {
        warn!(path = %path, "path is both public and private; public wins for authentication");
    }

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind to address")?;

    info!(%addr, "Server listening");

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
