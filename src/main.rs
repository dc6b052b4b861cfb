//! Correlation echo service.
//!
//! Serves the correlation middleware behind a small echo API:
//!
//! ```text
//!     Client Request
//!         → TraceLayer
//!         → CorrelationLayer (resolve / stamp response)
//!         → TimeoutLayer
//!         → GET /            correlation state as JSON
//!           GET /downstream  call downstream with required headers
//!           GET /health
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use promiscuous_correlation::config::{load_config, watcher::ConfigWatcher, AppConfig};
use promiscuous_correlation::http::HttpServer;
use promiscuous_correlation::lifecycle::{signals, Shutdown};
use promiscuous_correlation::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "correlation-echo")]
#[command(about = "Echo service for the promiscuous correlation-id middleware", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Watched for changes.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability.log_level);
    tracing::info!("correlation-echo v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        patterns = config.correlation.patterns.len(),
        use_default_patterns = config.correlation.use_default_patterns,
        downstream = ?config.downstream.url,
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
    let (_watcher, config_updates) = match &cli.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        None => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(signals::shutdown_on_ctrl_c(shutdown));

    let server = HttpServer::new(config)?;
    server.run(listener, config_updates, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
