//! Ticket simulation core logic.
//!
//! Bounded-capacity producer/consumer logic for the ticket management
//! simulation: vendors release tickets into a shared pool, customers retrieve
//! them, and every observable change is recorded in an ordered event log.
//!
//! # Architecture
//!
//! This crate follows the Sans-IO pattern. Nothing here sleeps, spawns, or
//! touches the network. Workers expose a synchronous [`Worker::tick`] that
//! operates on the [`TicketPool`] and returns [`WorkerAction`]s; the runtime
//! (production server or deterministic harness) decides when ticks happen and
//! executes the actions.
//!
//! # Components
//!
//! - [`SimulationParams`] / [`SimulationConfig`]: raw and validated run
//!   parameters
//! - [`TicketPool`]: shared bounded buffer plus remaining supply
//! - [`LogSink`]: append-only, totally ordered event log
//! - [`Vendor`] / [`Customer`]: per-tick production and consumption logic
//! - [`Environment`]: time and randomness abstraction for runtimes

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod env;
pub mod log;
pub mod pool;
pub mod worker;

pub use config::{ConfigError, MAX_WORKERS, SimulationConfig, SimulationParams};
pub use env::Environment;
pub use log::{LogEvent, LogSink, TicketEvent};
pub use pool::{PoolSnapshot, ReleaseResult, RetrieveResult, TicketPool};
pub use worker::{Customer, Vendor, Worker, WorkerAction, WorkerKind};
