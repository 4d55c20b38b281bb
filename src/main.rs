//! meme-bff: backend-for-frontend gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────┐
//!                       │                  MEME BFF                     │
//!                       │                                               │
//!  POST /createPicture  │  ┌────────┐    ┌───────────┐                  │
//!  ─────────────────────┼─▶│  http  │───▶│ aggregate │──┬──▶ phrase-picker
//!                       │  │ server │    │  (join)   │  └──▶ image-picker
//!                       │  └────────┘    └─────┬─────┘                  │
//!                       │                      ▼                        │
//!                       │                ┌───────────┐                  │
//!                       │                │  render   │─────▶ meminator
//!                       │                └─────┬─────┘                  │
//!  image/png chunks     │  ┌────────┐          ▼                        │
//!  ◀────────────────────┼──│ relay  │◀── picture body stream            │
//!                       │  └────────┘                                   │
//!                       │                                               │
//!                       │  config · observability · lifecycle           │
//!                       └──────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use meme_bff::config;
use meme_bff::lifecycle::{signals, Shutdown};
use meme_bff::observability::{logging, metrics};
use meme_bff::HttpServer;

#[derive(Parser)]
#[command(name = "meme-bff")]
#[command(about = "Backend-for-frontend that assembles and streams meme pictures", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "BFF_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = config::resolve_config(cli.config.as_deref(), cli.bind)?;

    logging::init_logging(&config.observability)?;

    tracing::info!("meme-bff v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        phrase_picker = %config.services.phrase_picker.url,
        image_picker = %config.services.image_picker.url,
        meminator = %config.services.meminator.url,
        upstream_timeout_secs = ?config.timeouts.upstream_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
