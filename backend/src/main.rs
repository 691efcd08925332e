//! Main entry point for the event gate.
//!
//! Loads configuration, builds the token verifier and upstream client, and
//! serves the gated router.

use anyhow::{Context, Result};
use event_gate::auth::gate::Gate;
use event_gate::auth::verifier::HttpTokenVerifier;
use event_gate::config::Config;
use event_gate::routes::app_router;
use event_gate::services::upstream::UpstreamClient;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;

    let verifier = HttpTokenVerifier::new(
        config.verify_url.clone(),
        Duration::from_secs(config.verify_timeout_seconds),
    )
    .context("failed to build token verifier")?;
    let gate = Arc::new(Gate::new(config.route_policy.clone(), Arc::new(verifier)));

    let upstream = UpstreamClient::new(
        config.upstream_url.clone(),
        Duration::from_secs(config.proxy_timeout_seconds),
    )
    .context("failed to build upstream client")?;

    info!(
        allowed_paths = ?gate.policy().allowed_paths,
        allowed_paths_ui = ?gate.policy().allowed_paths_ui,
        verify_url = %config.verify_url,
        upstream_url = %config.upstream_url,
        "Route policy loaded"
    );

    let app = app_router(gate, upstream);

    let bind_address = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {}", bind_address))?;

    info!("Starting event gate on port {}", config.server_port);
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
