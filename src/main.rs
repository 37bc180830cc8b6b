//! Content relay server.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌───────────────────────────────────────────────────┐
//!                       │                   CONTENT RELAY                   │
//!                       │                                                   │
//!   GET /proxy?url=     │  ┌────────┐   ┌────────┐   ┌─────────┐            │
//!   ────────────────────┼─▶│ cache  │──▶│ fetch  │──▶│ rewrite │──┐         │
//!                       │  └────────┘   └────────┘   └─────────┘  │         │
//!   ◀───────────────────┼─────────────────────────────────────────┘         │
//!                       │                                                   │
//!   Viewer  ◀── ws ───▶ │  ┌──────────────┐   ┌──────────────────┐          │
//!   Controller ◀─ ws ─▶ │  │ relay        │──▶│ session registry │          │
//!                       │  │ dispatcher   │   └──────────────────┘          │
//!                       │  └──────────────┘                                 │
//!                       │                                                   │
//!                       │  config · observability · lifecycle (sweepers,    │
//!                       │  graceful shutdown)                               │
//!                       └───────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use content_relay::config::{load_config, RelayConfig};
use content_relay::lifecycle::signals::wait_for_signal;
use content_relay::observability::{logging, metrics};
use content_relay::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "content-relay")]
#[command(about = "Rewriting content proxy and viewer/controller session relay", long_about = None)]
struct Cli {
    /// TOML configuration file; built-in defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listening port, overriding the configuration file.
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RelayConfig::default(),
    };
    if let Some(port) = cli.port {
        config.listener.port = port;
    }

    logging::init_logging(&config.observability);
    tracing::info!("content-relay v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address(),
        cache_ttl_secs = config.cache.ttl_secs,
        cache_capacity = config.cache.capacity,
        session_ttl_secs = config.sessions.ttl_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(config.listener.bind_address()).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;
    let mut serving = tokio::spawn(server.run(listener, shutdown.subscribe()));

    tokio::select! {
        _ = wait_for_signal() => {
            shutdown.trigger();
            serving.await??;
        }
        result = &mut serving => result??,
    }
    tracing::info!("Shutdown complete");
    Ok(())
}
