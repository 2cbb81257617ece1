//! Simulation control and polling endpoints.
//!
//! Write endpoints call the controller's lifecycle operations; read endpoints
//! return snapshots and have no side effects, so the dashboard may poll them
//! at any cadence.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use ticketsim_core::{Environment, LogEvent, SimulationParams};

use crate::{
    controller::{SimulationController, SimulationStatus},
    http::ApiResult,
};

type Controller<E> = State<Arc<SimulationController<E>>>;

/// Response to start and stop.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResponse {
    /// Always `true`; failures use the error body
    pub ok: bool,
    /// Run that was started or stopped
    pub run_id: u64,
}

/// Response to `GET /api/tickets/available`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableResponse {
    /// Tickets in the pool; `null` before the first run
    pub tickets_available: Option<u64>,
}

/// Query for `GET /api/tickets/events`.
#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    /// Return events with a sequence number strictly greater than this
    pub after: Option<u64>,
}

/// Start a run: `POST /api/tickets/testSimulation`
pub async fn start<E: Environment>(
    State(controller): Controller<E>,
    body: Result<Json<SimulationParams>, JsonRejection>,
) -> ApiResult<Json<RunResponse>> {
    let Json(params) = body?;
    let run_id = controller.start(params).await?;
    Ok(Json(RunResponse { ok: true, run_id }))
}

/// Stop the active run: `POST /api/tickets/stop`
pub async fn stop<E: Environment>(State(controller): Controller<E>) -> ApiResult<Json<RunResponse>> {
    let run_id = controller.stop().await?;
    Ok(Json(RunResponse { ok: true, run_id }))
}

/// Tickets in the pool: `GET /api/tickets/available`
pub async fn available<E: Environment>(
    State(controller): Controller<E>,
) -> Json<AvailableResponse> {
    Json(AvailableResponse { tickets_available: controller.tickets_available() })
}

/// Full rendered log: `GET /api/tickets/logs`
pub async fn logs<E: Environment>(State(controller): Controller<E>) -> Json<Vec<String>> {
    Json(controller.logs())
}

/// Lifecycle state and counters: `GET /api/tickets/status`
pub async fn status<E: Environment>(State(controller): Controller<E>) -> Json<SimulationStatus> {
    Json(controller.status())
}

/// Incremental structured events: `GET /api/tickets/events?after=N`
pub async fn events<E: Environment>(
    State(controller): Controller<E>,
    Query(query): Query<EventsQuery>,
) -> Json<Vec<LogEvent>> {
    Json(controller.events_after(query.after))
}
