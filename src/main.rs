//! Development reverse proxy.
//!
//! Sits in front of a locally running application server and a static
//! front-end bundle. Requests whose path starts with a configured prefix are
//! forwarded to that rule's upstream; everything else is served locally.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌───────────────────────────────────────────────┐
//!                        │                   DEV PROXY                   │
//!     Client Request     │  ┌─────────┐    ┌─────────────┐               │
//!     ───────────────────┼─▶│  http   │───▶│  intercept  │── match ──────┼──▶ Upstream
//!                        │  │ server  │    │ (routing)   │   (forward)   │    (e.g. :3000)
//!                        │  └─────────┘    └──────┬──────┘               │
//!                        │                        │ no match              │
//!                        │                        ▼                       │
//!                        │                 ┌─────────────┐               │
//!                        │                 │ static dir  │               │
//!                        │                 │   or 404    │               │
//!                        │                 └─────────────┘               │
//!                        └───────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use dev_proxy::config::{read_config, validate_config, ConfigError, ProxyConfig};
use dev_proxy::http::HttpServer;
use dev_proxy::lifecycle::{signals, Shutdown};
use dev_proxy::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "dev-proxy")]
#[command(about = "Path-prefix development reverse proxy", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults reproduce the /api and /auth rules.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Serve unmatched requests from this directory.
    #[arg(long)]
    static_dir: Option<PathBuf>,
}

/// File (or defaults), then CLI overrides, then a single validation pass.
fn resolve_config(cli: Cli) -> Result<ProxyConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => read_config(path)?,
        None => ProxyConfig::default(),
    };

    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    if let Some(dir) = cli.static_dir {
        config.static_files.root = Some(dir);
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_config(Cli::parse())?;

    logging::init_logging(&config.observability)?;

    tracing::info!("dev-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    for rule in &config.rules {
        tracing::info!(prefix = %rule.prefix, upstream = %rule.target, "Proxy rule");
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
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
    let server_shutdown = shutdown.signal();
    signals::spawn_signal_handler(shutdown);

    HttpServer::new(config)?.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
