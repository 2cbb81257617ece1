//! Ticket simulation server.
//!
//! Production runtime for [`ticketsim_core`]: one tokio task per vendor and
//! customer, a controller that owns the run lifecycle, and an Axum HTTP
//! surface for the dashboard.
//!
//! # Architecture
//!
//! [`ticketsim_core`] holds the Sans-IO logic (pool, log, worker ticks). This
//! crate supplies the I/O around it: [`SystemEnv`] for real time and
//! randomness, the worker task loop that sleeps between ticks, the
//! [`SimulationController`], and the HTTP routes.
//!
//! # Components
//!
//! - [`SimulationController`]: start/stop lifecycle and read snapshots
//! - [`create_app`]: Axum router for the dashboard endpoints
//! - [`Server`]: binds a listener and serves the router until shutdown
//! - [`SystemEnv`]: production environment (real time, OS RNG)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod controller;
mod error;
pub mod http;
mod runtime;
mod system_env;

use std::{net::SocketAddr, sync::Arc};

pub use controller::{
    ControllerConfig, ControllerError, Run, RunState, SimulationController, SimulationStatus,
};
pub use error::ServerError;
pub use http::{ApiError, create_app};
pub use system_env::SystemEnv;
use tokio::net::TcpListener;

/// Server configuration for the production runtime.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (e.g., "0.0.0.0:8080")
    pub bind_address: String,
    /// Controller configuration (tick interval, stop grace)
    pub controller: ControllerConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_address: "0.0.0.0:8080".to_string(), controller: ControllerConfig::default() }
    }
}

/// Production ticket simulation server.
///
/// Wraps a [`SimulationController`] with a bound TCP listener.
pub struct Server {
    /// Simulation controller shared with the HTTP handlers
    controller: Arc<SimulationController<SystemEnv>>,
    /// Bound listener
    listener: TcpListener,
}

impl Server {
    /// Create and bind a new server.
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        if config.controller.tick_interval.is_zero() {
            return Err(ServerError::Config("tick interval must be positive".to_string()));
        }
        if config.controller.stop_grace_ticks == 0 {
            return Err(ServerError::Config("stop grace must be at least one tick".to_string()));
        }

        let listener = TcpListener::bind(&config.bind_address).await?;
        let controller = Arc::new(SimulationController::new(SystemEnv::new(), config.controller));

        Ok(Self { controller, listener })
    }

    /// Local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// The controller served by this server.
    pub fn controller(&self) -> Arc<SimulationController<SystemEnv>> {
        Arc::clone(&self.controller)
    }

    /// Serve until Ctrl-C.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_until(shutdown_signal()).await
    }

    /// Serve until `shutdown` resolves, then stop any active run.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::info!("Server listening on {}", self.local_addr()?);

        let app = create_app(Arc::clone(&self.controller));
        axum::serve(self.listener, app).with_graceful_shutdown(shutdown).await?;

        match self.controller.stop().await {
            Ok(run_id) => tracing::info!(run_id, "stopped active simulation on shutdown"),
            Err(ControllerError::NotRunning) => {},
            Err(e) => tracing::warn!("Failed to stop simulation on shutdown: {}", e),
        }

        tracing::info!("Server shut down");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
