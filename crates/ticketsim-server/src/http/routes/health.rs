//! Liveness probe.

use std::sync::Arc;

use axum::{Json, extract::State};
use serde::Serialize;
use ticketsim_core::Environment;

use crate::controller::{RunState, SimulationController};

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"healthy"` when the server answers
    pub status: &'static str,
    /// Controller lifecycle state
    pub state: RunState,
}

/// Liveness probe: `GET /health`
pub async fn health<E: Environment>(
    State(controller): State<Arc<SimulationController<E>>>,
) -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy", state: controller.state() })
}
