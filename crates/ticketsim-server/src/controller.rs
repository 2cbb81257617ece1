//! Simulation controller.
//!
//! Owns the run lifecycle: validates parameters, builds a fresh pool and log
//! per run, spawns one task per vendor and customer, and stops them
//! cooperatively.
//!
//! ```text
//!  Idle --start--> Running --stop--> Stopping --> Stopped
//!                     ^                              |
//!                     +------------start-------------+
//! ```
//!
//! Lifecycle operations are serialized by an async mutex that is held while
//! `stop` waits for workers. Read operations never touch that mutex; they read
//! the published run handle under a short synchronous lock, so polling is
//! never blocked behind a stop in progress.

use std::{
    sync::{Arc, PoisonError, RwLock},
    time::Duration,
};

use serde::Serialize;
use thiserror::Error;
use ticketsim_core::{
    ConfigError, Customer, Environment, LogEvent, LogSink, SimulationConfig, SimulationParams,
    TicketEvent, TicketPool, Vendor,
};
use tokio::{sync::watch, task::JoinSet};

use crate::runtime::drive_worker;

/// Errors returned by lifecycle operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControllerError {
    /// Parameters failed validation; state is unchanged
    #[error("invalid configuration: {0}")]
    Validation(#[from] ConfigError),

    /// `start` while a run is active
    #[error("a simulation is already running")]
    AlreadyRunning,

    /// `stop` while no run is active
    #[error("no simulation is running")]
    NotRunning,
}

/// Lifecycle state of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    /// No run has been started yet
    Idle,
    /// Workers are active
    Running,
    /// Stop requested, waiting for workers to exit
    Stopping,
    /// Last run stopped; its pool and log remain readable
    Stopped,
}

/// Controller runtime configuration.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Time between two ticks of the same worker
    pub tick_interval: Duration,
    /// How many tick intervals `stop` waits before aborting workers
    pub stop_grace_ticks: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self { tick_interval: Duration::from_millis(1000), stop_grace_ticks: 3 }
    }
}

impl ControllerConfig {
    const MIN_STOP_TIMEOUT: Duration = Duration::from_millis(100);

    /// Upper bound on how long `stop` waits for workers.
    pub fn stop_timeout(&self) -> Duration {
        self.tick_interval.saturating_mul(self.stop_grace_ticks).max(Self::MIN_STOP_TIMEOUT)
    }
}

/// One simulation run: its configuration, pool, and log.
#[derive(Debug)]
pub struct Run {
    id: u64,
    config: SimulationConfig,
    pool: TicketPool,
    log: LogSink,
}

impl Run {
    fn new(id: u64, config: SimulationConfig) -> Self {
        Self {
            id,
            config,
            pool: TicketPool::new(config.max_ticket_capacity(), config.total_tickets()),
            log: LogSink::new(),
        }
    }

    /// Run identifier issued at start.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Configuration the run was started with.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// The run's ticket pool.
    pub fn pool(&self) -> &TicketPool {
        &self.pool
    }

    /// The run's event log.
    pub fn log(&self) -> &LogSink {
        &self.log
    }
}

/// Point-in-time controller status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationStatus {
    /// Lifecycle state
    pub state: RunState,
    /// Current or last run identifier
    pub run_id: Option<u64>,
    /// Current or last run configuration
    pub config: Option<SimulationConfig>,
    /// Tickets in the pool
    pub tickets_available: Option<u64>,
    /// Tickets that may still be released
    pub remaining_supply: Option<u64>,
    /// Tickets released so far
    pub total_released: Option<u64>,
    /// Tickets retrieved so far
    pub total_retrieved: Option<u64>,
    /// Number of log entries
    pub log_len: usize,
}

/// State visible to readers.
struct Published {
    state: RunState,
    run: Option<Arc<Run>>,
}

/// Handles for the workers of the active run.
struct ActiveWorkers {
    run: Arc<Run>,
    cancel: watch::Sender<bool>,
    tasks: JoinSet<()>,
}

/// Single-simulation controller.
///
/// Share it behind an `Arc`; every method takes `&self`.
pub struct SimulationController<E: Environment> {
    env: E,
    config: ControllerConfig,
    lifecycle: tokio::sync::Mutex<Option<ActiveWorkers>>,
    published: RwLock<Published>,
}

impl<E: Environment> SimulationController<E> {
    /// Create an idle controller.
    pub fn new(env: E, config: ControllerConfig) -> Self {
        Self {
            env,
            config,
            lifecycle: tokio::sync::Mutex::new(None),
            published: RwLock::new(Published { state: RunState::Idle, run: None }),
        }
    }

    /// Runtime configuration.
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Validate `params` and start a new run. Returns the run identifier.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// - [`ControllerError::Validation`] if `params` are invalid; checked
    ///   before the lifecycle state so a bad request never disturbs a run
    /// - [`ControllerError::AlreadyRunning`] if a run is active
    pub async fn start(&self, params: SimulationParams) -> Result<u64, ControllerError> {
        let config = SimulationConfig::try_from(params)?;

        let mut lifecycle = self.lifecycle.lock().await;
        if lifecycle.is_some() {
            return Err(ControllerError::AlreadyRunning);
        }

        let run = Arc::new(Run::new(self.env.random_u64(), config));
        self.emit(&run, TicketEvent::RunStarted {
            run_id: run.id(),
            capacity: config.max_ticket_capacity(),
            total_tickets: config.total_tickets(),
            vendors: config.vendors(),
            customers: config.customers(),
        });

        let (cancel, cancel_rx) = watch::channel(false);
        let mut tasks = JoinSet::new();
        let interval = self.config.tick_interval;

        for id in 1..=config.vendors() {
            let offset = stagger(interval, id - 1, config.vendors());
            tasks.spawn(drive_worker(
                self.env.clone(),
                Arc::clone(&run),
                Vendor::new(id, config.ticket_release_rate()),
                interval,
                offset,
                cancel_rx.clone(),
            ));
        }
        for id in 1..=config.customers() {
            let offset = stagger(interval, id - 1, config.customers());
            tasks.spawn(drive_worker(
                self.env.clone(),
                Arc::clone(&run),
                Customer::new(id, config.customer_retrieval_rate()),
                interval,
                offset,
                cancel_rx.clone(),
            ));
        }

        tracing::info!(
            run_id = run.id(),
            capacity = config.max_ticket_capacity(),
            total_tickets = config.total_tickets(),
            vendors = config.vendors(),
            customers = config.customers(),
            "simulation started"
        );

        self.publish(RunState::Running, Some(Arc::clone(&run)));
        *lifecycle = Some(ActiveWorkers { run: Arc::clone(&run), cancel, tasks });

        Ok(run.id())
    }

    /// Stop the active run and wait for its workers. Returns the run
    /// identifier.
    ///
    /// Workers exit at their next tick boundary. Any worker still running
    /// after [`ControllerConfig::stop_timeout`] is aborted at its await point,
    /// which is never inside a pool operation. Once this returns, the run's
    /// log is sealed and its pool no longer changes.
    ///
    /// # Errors
    ///
    /// - [`ControllerError::NotRunning`] if no run is active
    pub async fn stop(&self) -> Result<u64, ControllerError> {
        let mut lifecycle = self.lifecycle.lock().await;
        let Some(ActiveWorkers { run, cancel, mut tasks }) = lifecycle.take() else {
            return Err(ControllerError::NotRunning);
        };

        self.publish(RunState::Stopping, Some(Arc::clone(&run)));
        cancel.send_replace(true);

        let started = self.env.now();
        join_workers(run.id(), &mut tasks, self.config.stop_timeout()).await;

        let pool = run.pool().snapshot();
        self.emit(&run, TicketEvent::RunStopped {
            run_id: run.id(),
            released: pool.total_released,
            retrieved: pool.total_retrieved,
            available: pool.available,
        });
        run.log().seal();

        tracing::info!(
            run_id = run.id(),
            released = pool.total_released,
            retrieved = pool.total_retrieved,
            available = pool.available,
            elapsed_ms = (self.env.now() - started).as_millis() as u64,
            "simulation stopped"
        );

        self.publish(RunState::Stopped, Some(Arc::clone(&run)));
        Ok(run.id())
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RunState {
        self.read().state
    }

    /// Current or last run, if any.
    pub fn current_run(&self) -> Option<Arc<Run>> {
        self.read().run.clone()
    }

    /// Tickets in the pool. `None` while idle.
    ///
    /// After a stop, this is the final pool level of the last run.
    pub fn tickets_available(&self) -> Option<u64> {
        self.current_run().map(|run| run.pool().snapshot().available)
    }

    /// Rendered log of the current or last run, oldest first.
    pub fn logs(&self) -> Vec<String> {
        self.current_run().map(|run| run.log().messages()).unwrap_or_default()
    }

    /// Structured events after sequence `after` (all events if `None`).
    pub fn events_after(&self, after: Option<u64>) -> Vec<LogEvent> {
        self.current_run().map(|run| run.log().events_after(after)).unwrap_or_default()
    }

    /// Full status snapshot.
    pub fn status(&self) -> SimulationStatus {
        let (state, run) = {
            let published = self.read();
            (published.state, published.run.clone())
        };

        match run {
            Some(run) => {
                let pool = run.pool().snapshot();
                SimulationStatus {
                    state,
                    run_id: Some(run.id()),
                    config: Some(*run.config()),
                    tickets_available: Some(pool.available),
                    remaining_supply: Some(pool.remaining_supply),
                    total_released: Some(pool.total_released),
                    total_retrieved: Some(pool.total_retrieved),
                    log_len: run.log().len(),
                }
            },
            None => SimulationStatus {
                state,
                run_id: None,
                config: None,
                tickets_available: None,
                remaining_supply: None,
                total_released: None,
                total_retrieved: None,
                log_len: 0,
            },
        }
    }

    fn emit(&self, run: &Run, event: TicketEvent) {
        if run.log().append(self.env.wall_clock_secs(), event).is_none() {
            tracing::warn!(run_id = run.id(), "controller event dropped: log sealed");
        }
    }

    fn publish(&self, state: RunState, run: Option<Arc<Run>>) {
        let mut published = self.published.write().unwrap_or_else(PoisonError::into_inner);
        tracing::debug!(from = ?published.state, to = ?state, "run state transition");
        *published = Published { state, run };
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Published> {
        self.published.read().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Wait up to `timeout` for every task, then abort the rest. Returns how many
/// tasks were aborted.
async fn join_workers(run_id: u64, tasks: &mut JoinSet<()>, timeout: Duration) -> usize {
    let drained = tokio::time::timeout(timeout, async {
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!(run_id, error = %e, "worker task failed");
            }
        }
    })
    .await;

    if drained.is_ok() {
        return 0;
    }

    let remaining = tasks.len();
    tracing::warn!(
        run_id,
        remaining,
        timeout_ms = timeout.as_millis() as u64,
        "workers did not stop in time, aborting"
    );
    tasks.shutdown().await;
    remaining
}

/// Delay before worker `index` of `count` first ticks.
fn stagger(interval: Duration, index: usize, count: usize) -> Duration {
    if count == 0 {
        return Duration::ZERO;
    }
    interval.mul_f64(index as f64 / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_timeout_scales_with_tick() {
        let config =
            ControllerConfig { tick_interval: Duration::from_millis(500), stop_grace_ticks: 4 };
        assert_eq!(config.stop_timeout(), Duration::from_secs(2));
    }

    #[test]
    fn stop_timeout_has_floor() {
        let config =
            ControllerConfig { tick_interval: Duration::from_millis(1), stop_grace_ticks: 1 };
        assert_eq!(config.stop_timeout(), Duration::from_millis(100));
    }

    #[test]
    fn stagger_spreads_within_one_interval() {
        let interval = Duration::from_millis(100);

        assert_eq!(stagger(interval, 0, 4), Duration::ZERO);
        assert_eq!(stagger(interval, 2, 4), Duration::from_millis(50));
        assert!(stagger(interval, 3, 4) < interval);
        assert_eq!(stagger(interval, 0, 0), Duration::ZERO);
    }

    #[tokio::test]
    async fn join_workers_waits_for_cooperative_tasks() {
        let mut tasks = JoinSet::new();
        for _ in 0..3 {
            tasks.spawn(tokio::time::sleep(Duration::from_millis(5)));
        }

        let aborted = join_workers(1, &mut tasks, Duration::from_secs(5)).await;

        assert_eq!(aborted, 0);
        assert!(tasks.is_empty());
    }

    #[tokio::test]
    async fn join_workers_aborts_stragglers_after_timeout() {
        let mut tasks = JoinSet::new();
        tasks.spawn(async {});
        tasks.spawn(std::future::pending::<()>());
        tasks.spawn(std::future::pending::<()>());

        let started = std::time::Instant::now();
        let aborted = join_workers(1, &mut tasks, Duration::from_millis(20)).await;

        assert_eq!(aborted, 2);
        assert!(tasks.is_empty());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn controller_error_display() {
        assert_eq!(ControllerError::AlreadyRunning.to_string(), "a simulation is already running");
        assert_eq!(ControllerError::NotRunning.to_string(), "no simulation is running");

        let err = ControllerError::from(ConfigError::Missing("vendors"));
        assert_eq!(
            err.to_string(),
            "invalid configuration: all fields are required: vendors is missing"
        );
    }

    #[test]
    fn run_state_serializes_lowercase() {
        let json = serde_json::to_string(&RunState::Stopping).expect("serialize state");
        assert_eq!(json, "\"stopping\"");
    }
}
