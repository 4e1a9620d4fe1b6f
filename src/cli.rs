//! Command-line interface parsing for the gateway
//!
//! Flags override the environment-derived [`GatewayConfig`]. The BODS API key
//! is deliberately not accepted on the command line, where it would be visible
//! in process listings.

use std::time::Duration;

use clap::Parser;

use crate::config::GatewayConfig;

/// OCC gateway - cached proxy for traffic and transit disruption feeds
#[derive(Parser, Debug)]
#[command(name = "occ-gateway")]
#[command(about = "Read-through caching gateway for traffic and transit feeds")]
#[command(version)]
pub struct Cli {
    /// Port to listen on (overrides PORT)
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Upstream request timeout in seconds (overrides UPSTREAM_TIMEOUT_SECS)
    #[arg(long, value_name = "SECS")]
    pub upstream_timeout: Option<u64>,

    /// Serve expired cache entries when an upstream refresh fails
    #[arg(long)]
    pub serve_stale: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,
}

impl Cli {
    /// Applies flags on top of `config`
    pub fn apply(&self, mut config: GatewayConfig) -> GatewayConfig {
        if let Some(port) = self.port {
            config.listen_port = port;
        }
        if let Some(secs) = self.upstream_timeout {
            config.upstream_timeout = Duration::from_secs(secs);
        }
        if self.serve_stale {
            config.serve_stale_on_error = true;
        }
        config
    }
}
