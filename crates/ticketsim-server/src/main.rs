//! Ticket simulation server binary.
//!
//! # Usage
//!
//! ```bash
//! # Serve the dashboard API on the default port, one tick per second
//! ticketsim-server
//!
//! # Faster ticks, verbose logging
//! ticketsim-server --bind 127.0.0.1:8080 --tick-ms 250 --log-level debug
//! ```

use std::time::Duration;

use clap::Parser;
use ticketsim_server::{ControllerConfig, Server, ServerConfig};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Ticket simulation server
#[derive(Parser, Debug)]
#[command(name = "ticketsim-server")]
#[command(about = "Ticket management simulation backend")]
#[command(version)]
struct Args {
    /// Address to bind to
    #[arg(short, long, default_value = "0.0.0.0:8080")]
    bind: String,

    /// Milliseconds between two ticks of the same worker
    #[arg(long, default_value = "1000")]
    tick_ms: u64,

    /// Tick intervals to wait for workers on stop before aborting them
    #[arg(long, default_value = "3")]
    stop_grace_ticks: u32,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!("Ticket simulation server starting");
    tracing::info!("Binding to {}", args.bind);

    let config = ServerConfig {
        bind_address: args.bind,
        controller: ControllerConfig {
            tick_interval: Duration::from_millis(args.tick_ms),
            stop_grace_ticks: args.stop_grace_ticks,
        },
    };

    let server = Server::bind(config).await?;

    server.run().await?;

    Ok(())
}
