//! Ordered simulation event log.
//!
//! Vendors, customers and the controller append concurrently; the sink
//! assigns sequence numbers under its lock at append time, so the log is a
//! total order with no gaps or duplicates regardless of which worker emitted
//! first. Readers always get an owned copy.
//!
//! A sink is sealed when its run stops. Appends after sealing are dropped.

use std::{
    fmt,
    sync::{Mutex, MutexGuard, PoisonError},
};

use serde::Serialize;

/// Something that happened during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum TicketEvent {
    /// A run was started
    RunStarted {
        /// Run identifier
        run_id: u64,
        /// Pool capacity
        capacity: u64,
        /// Total ticket supply
        total_tickets: u64,
        /// Vendor count
        vendors: usize,
        /// Customer count
        customers: usize,
    },

    /// A vendor released tickets into the pool
    Released {
        /// Vendor number (1-based)
        vendor: usize,
        /// Tickets released
        count: u64,
        /// Pool level after the release
        available: u64,
        /// Supply left after the release
        remaining_supply: u64,
    },

    /// A vendor stopped because the supply is exhausted
    VendorFinished {
        /// Vendor number (1-based)
        vendor: usize,
    },

    /// A customer retrieved tickets from the pool
    Retrieved {
        /// Customer number (1-based)
        customer: usize,
        /// Tickets retrieved
        count: u64,
        /// Pool level after the retrieval
        available: u64,
    },

    /// Pool empty and supply exhausted
    SoldOut,

    /// A run was stopped
    RunStopped {
        /// Run identifier
        run_id: u64,
        /// Tickets released during the run
        released: u64,
        /// Tickets retrieved during the run
        retrieved: u64,
        /// Tickets left in the pool
        available: u64,
    },
}

impl fmt::Display for TicketEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RunStarted { run_id, capacity, total_tickets, vendors, customers } => write!(
                f,
                "Simulation {run_id:016x} started: capacity={capacity}, total={total_tickets}, \
                 vendors={vendors}, customers={customers}"
            ),
            Self::Released { vendor, count, available, remaining_supply } => write!(
                f,
                "Vendor-{vendor} released {count} ticket(s). Available: {available}, remaining \
                 supply: {remaining_supply}"
            ),
            Self::VendorFinished { vendor } => {
                write!(f, "Vendor-{vendor} finished: ticket supply exhausted")
            },
            Self::Retrieved { customer, count, available } => {
                write!(f, "Customer-{customer} purchased {count} ticket(s). Available: {available}")
            },
            Self::SoldOut => write!(f, "All tickets sold out"),
            Self::RunStopped { run_id, released, retrieved, available } => write!(
                f,
                "Simulation {run_id:016x} stopped: released={released}, \
                 purchased={retrieved}, available={available}"
            ),
        }
    }
}

/// One entry in the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    /// Position in the log, assigned at append time (0-based, gapless)
    pub sequence: u64,
    /// Wall-clock seconds since the Unix epoch
    pub timestamp_secs: u64,
    /// Human-readable rendering of `event`
    pub message: String,
    /// Structured event
    pub event: TicketEvent,
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.sequence, self.message)
    }
}

#[derive(Debug, Default)]
struct SinkState {
    events: Vec<LogEvent>,
    sealed: bool,
}

/// Append-only event log shared by all workers of a run.
#[derive(Debug, Default)]
pub struct LogSink {
    state: Mutex<SinkState>,
}

impl LogSink {
    /// Create an empty, open sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event and return its sequence number.
    ///
    /// Returns `None` if the sink has been sealed.
    pub fn append(&self, timestamp_secs: u64, event: TicketEvent) -> Option<u64> {
        let mut state = self.lock();
        if state.sealed {
            return None;
        }

        let sequence = state.events.len() as u64;
        let message = event.to_string();
        state.events.push(LogEvent { sequence, timestamp_secs, message, event });

        debug_assert_eq!(state.events.len() as u64, sequence + 1);

        Some(sequence)
    }

    /// Stop accepting appends. Returns `false` if already sealed.
    pub fn seal(&self) -> bool {
        let mut state = self.lock();
        !std::mem::replace(&mut state.sealed, true)
    }

    /// Whether [`seal`](Self::seal) has been called.
    pub fn is_sealed(&self) -> bool {
        self.lock().sealed
    }

    /// Number of events appended so far.
    pub fn len(&self) -> usize {
        self.lock().events.len()
    }

    /// Whether nothing has been appended.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of every event, oldest first.
    pub fn snapshot(&self) -> Vec<LogEvent> {
        self.lock().events.clone()
    }

    /// Events with a sequence number strictly greater than `after`.
    ///
    /// `None` returns the whole log.
    pub fn events_after(&self, after: Option<u64>) -> Vec<LogEvent> {
        let state = self.lock();
        let start = after
            .map_or(0, |seq| usize::try_from(seq).map_or(usize::MAX, |s| s.saturating_add(1)));
        state.events.get(start..).map(<[LogEvent]>::to_vec).unwrap_or_default()
    }

    /// Rendered log lines (`[sequence] message`), oldest first.
    pub fn messages(&self) -> Vec<String> {
        self.lock().events.iter().map(ToString::to_string).collect()
    }

    fn lock(&self) -> MutexGuard<'_, SinkState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
