//! Observable state snapshots for invariant checking.
//!
//! Snapshots capture the pool counters and the event log at a point in time.
//! Invariants operate on snapshots rather than live state so every check in
//! a pass sees the same state.

use ticketsim_core::{LogEvent, LogSink, PoolSnapshot, TicketEvent, TicketPool};

/// Snapshot of one run: pool counters plus the full event log.
#[derive(Debug, Clone)]
pub struct SystemSnapshot {
    /// Pool counters.
    pub pool: PoolSnapshot,
    /// Supply the pool started with.
    pub total_supply: u64,
    /// Event log, oldest first.
    pub events: Vec<LogEvent>,
}

impl SystemSnapshot {
    /// Capture the current state of a pool and its log.
    pub fn capture(pool: &TicketPool, log: &LogSink) -> Self {
        Self { pool: pool.snapshot(), total_supply: pool.total_supply(), events: log.snapshot() }
    }

    /// Sum of tickets reported by `Released` events.
    pub fn logged_released(&self) -> u64 {
        self.events
            .iter()
            .map(|e| match e.event {
                TicketEvent::Released { count, .. } => count,
                _ => 0,
            })
            .sum()
    }

    /// Sum of tickets reported by `Retrieved` events.
    pub fn logged_retrieved(&self) -> u64 {
        self.events
            .iter()
            .map(|e| match e.event {
                TicketEvent::Retrieved { count, .. } => count,
                _ => 0,
            })
            .sum()
    }

    /// Number of `SoldOut` events.
    pub fn sold_out_events(&self) -> usize {
        self.events.iter().filter(|e| e.event == TicketEvent::SoldOut).count()
    }
}
