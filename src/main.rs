//! Request filter gateway.
//!
//! ```text
//!     Client Request   ┌──────────┐   ┌────────────┐   ┌──────────────┐
//!     ────────────────▶│ net/tls  │──▶│ request ID │──▶│    filter    │──▶ next stage
//!                      └──────────┘   └────────────┘   └──────┬───────┘
//!                                                             │ reject
//!     403 / 400 ◀─────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use request_filter::config::{load_config, watcher::ConfigWatcher, AppConfig};
use request_filter::lifecycle::{signals::shutdown_on_signal, Shutdown};
use request_filter::observability::{logging, metrics};
use request_filter::FilterServer;

#[derive(Parser)]
#[command(name = "request-filter")]
#[command(about = "HTTP gateway that admits or rejects requests by IP, User-Agent, XHR and TLS")]
struct Args {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reload filter rules when the configuration file changes.
    #[arg(short, long, requires = "config")]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    logging::init_tracing(&config.observability.log_level);
    tracing::info!("request-filter v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        tls = config.listener.tls.is_some(),
        ip_rules = config.filter.ip_filters.as_ref().map(Vec::len),
        user_agent_rules = config.filter.user_agent_filters.as_ref().map(Vec::len),
        disallow_xhr = config.filter.disallow_xhr,
        disallow_insecure = config.filter.disallow_insecure,
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

    // Keep the watcher alive for the lifetime of the server.
    let (_watcher, config_updates) = match (&args.config, args.watch) {
        (Some(path), true) => {
            let (watcher, rx) = ConfigWatcher::new(path);
            (Some(watcher.run()?), rx)
        }
        _ => (None, mpsc::unbounded_channel().1),
    };

    let shutdown = Shutdown::new();
    tokio::spawn(shutdown_on_signal(shutdown.clone()));

    let server = FilterServer::new(config.clone())?;
    if config.listener.tls.is_some() {
        server.run_tls(config_updates, shutdown.subscribe()).await?;
    } else {
        let listener = TcpListener::bind(&config.listener.bind_address).await?;
        server.run(listener, config_updates, shutdown.subscribe()).await?;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
