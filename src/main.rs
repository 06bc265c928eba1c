//! Edge proxy service.
//!
//! Hosts two browser-facing edge functions behind one listener:
//!
//! ```text
//!                       ┌──────────────────────────────────────────────┐
//!                       │                 EDGE PROXY                    │
//!  Browser              │                                               │
//!  ─────────────────────┼─▶ /api/airtable                               │
//!                       │     preflight → rate limit → origin → path    │      Tabular
//!                       │     → token → forward ────────────────────────┼────▶ API
//!                       │                                               │
//!  ─────────────────────┼─▶ /api/contact                                │
//!                       │     parse JSON → relay ───────────────────────┼────▶ Webhook
//!                       │                                               │
//!                       │  config · tracing · metrics · shutdown        │
//!                       └──────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use edge_proxy::config::{load_or_default, SecretToken};
use edge_proxy::lifecycle::{signals, Shutdown};
use edge_proxy::observability::{logging, metrics};
use edge_proxy::HttpServer;

#[derive(Parser, Debug)]
#[command(name = "edge-proxy")]
#[command(about = "CORS-aware proxy for a tabular-data API and a contact form webhook")]
struct Cli {
    /// TOML configuration file. Defaults are used when omitted.
    #[arg(short, long, env = "EDGE_PROXY_CONFIG")]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long, env = "EDGE_PROXY_BIND")]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_or_default(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_tracing(&config.observability);
    tracing::info!("edge-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        rate_limit = config.rate_limit.max_requests,
        window_ms = config.rate_limit.window_ms,
        upstream = %config.upstream.base_url,
        "Configuration loaded"
    );

    let token = SecretToken::from_env(&config.upstream.token_env);
    if token.is_none() {
        tracing::warn!(
            env = %config.upstream.token_env,
            "Upstream token not set; tabular requests will fail with a configuration error"
        );
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        signals::wait_for_signal().await;
        shutdown.trigger();
    });

    let server = HttpServer::new(config, token)?;
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
