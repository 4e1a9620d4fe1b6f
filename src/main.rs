//! OCC gateway - cached proxy for traffic and transit disruption feeds
//!
//! Serves a fixed set of upstream feeds through a short-lived in-memory cache
//! so that dashboard clients never hit the providers directly.

use std::net::SocketAddr;

use clap::Parser;
use tracing::info;

use occ_gateway::cli::Cli;
use occ_gateway::config::GatewayConfig;
use occ_gateway::server::router_from_config;
use occ_gateway::telemetry::init_tracing;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    // .env may carry RUST_LOG, so it has to be loaded before the subscriber
    dotenv::dotenv().ok();
    init_tracing(cli.log_json)?;

    let config = cli.apply(GatewayConfig::from_env()?);
    if config.bods_api_key.is_none() {
        tracing::warn!("BODS_API_KEY is not set; /api/bods-siri-sx will return errors");
    }

    let app = router_from_config(&config)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.listen_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "OCC gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}

/// Resolves when Ctrl-C is received
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(err) => {
            tracing::error!(error = %err, "failed to listen for Ctrl-C; running until killed");
            std::future::pending::<()>().await;
        }
    }
}
