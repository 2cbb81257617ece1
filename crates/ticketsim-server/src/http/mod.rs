//! Axum application builder.
//!
//! # Routes
//!
//! - `POST /api/tickets/testSimulation` - start a run
//! - `POST /api/tickets/stop` - stop the active run
//! - `GET /api/tickets/available` - tickets in the pool
//! - `GET /api/tickets/logs` - rendered log lines, oldest first
//! - `GET /api/tickets/status` - lifecycle state and pool counters
//! - `GET /api/tickets/events?after=N` - structured events after sequence N
//! - `GET /health` - liveness probe

mod error;
pub mod routes;

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    routing::{get, post},
};
pub use error::{ApiError, ApiResult};
use ticketsim_core::Environment;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::controller::SimulationController;

/// Create the Axum application with all routes.
pub fn create_app<E: Environment>(controller: Arc<SimulationController<E>>) -> Router {
    // The dashboard is served from its own origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route("/health", get(routes::health::health::<E>))
        .route("/api/tickets/testSimulation", post(routes::tickets::start::<E>))
        .route("/api/tickets/stop", post(routes::tickets::stop::<E>))
        .route("/api/tickets/available", get(routes::tickets::available::<E>))
        .route("/api/tickets/logs", get(routes::tickets::logs::<E>))
        .route("/api/tickets/status", get(routes::tickets::status::<E>))
        .route("/api/tickets/events", get(routes::tickets::events::<E>))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(controller)
}
