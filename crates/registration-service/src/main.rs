//! Event registration service - Entry point.

use anyhow::{Context, Result};
use registration_service::{
    api::{create_router_with_rate_limit, serve_static, AppState, RateLimitState},
    logging, Config,
};
use std::net::{IpAddr, SocketAddr};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    logging::init(&config.log);

    info!("Starting event registration service");

    let state = AppState::from_config(&config)?;
    let rate_limit = RateLimitState::new(config.rate_limit.per_minute);

    let mut app = create_router_with_rate_limit(state, rate_limit);
    if let Some(dir) = &config.server.static_dir {
        app = serve_static(app, dir);
    }

    let ip: IpAddr = config
        .server
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid listen address {}", config.server.listen_addr))?;
    let addr = SocketAddr::new(ip, config.server.port);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down...");
    Ok(())
}

async fn shutdown_signal() {
    if signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
