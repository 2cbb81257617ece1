//! Shared ticket pool.
//!
//! The pool is the single point of coordination between vendors and
//! customers. It tracks two counters: `available` (tickets currently in the
//! pool, bounded by capacity) and `remaining_supply` (tickets that may still
//! be released during this run). Both change together inside one critical
//! section, so no observer ever sees a release that moved supply but not
//! availability.
//!
//! Every operation is non-blocking in the scheduling sense: it either makes
//! progress or reports zero accepted tickets immediately. Retrying is the
//! caller's job.

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;

/// Outcome of [`TicketPool::try_release`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseResult {
    /// Tickets moved from supply into the pool
    pub accepted: u64,
    /// Pool level after the release
    pub available: u64,
    /// Supply left after the release
    pub remaining_supply: u64,
}

/// Outcome of [`TicketPool::try_retrieve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrieveResult {
    /// Tickets taken out of the pool
    pub accepted: u64,
    /// Pool level after the retrieval
    pub available: u64,
    /// Supply left at the time of the retrieval
    pub remaining_supply: u64,
    /// True for exactly one retrieval per pool: the first one to observe both
    /// an empty pool and an exhausted supply.
    pub sold_out: bool,
}

/// Point-in-time view of the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolSnapshot {
    /// Maximum tickets the pool may hold
    pub capacity: u64,
    /// Tickets currently in the pool
    pub available: u64,
    /// Tickets that may still be released
    pub remaining_supply: u64,
    /// Tickets released so far
    pub total_released: u64,
    /// Tickets retrieved so far
    pub total_retrieved: u64,
}

impl PoolSnapshot {
    /// No tickets in the pool and none left to release.
    pub fn is_sold_out(&self) -> bool {
        self.available == 0 && self.remaining_supply == 0
    }
}

#[derive(Debug)]
struct PoolState {
    available: u64,
    remaining_supply: u64,
    released: u64,
    retrieved: u64,
    sold_out_reported: bool,
}

/// Bounded ticket buffer with a finite supply.
///
/// # Invariants
///
/// - `0 <= available <= capacity`
/// - `remaining_supply` never increases
/// - `released + remaining_supply == total_supply`
/// - `available == released - retrieved`
#[derive(Debug)]
pub struct TicketPool {
    capacity: u64,
    total_supply: u64,
    state: Mutex<PoolState>,
}

impl TicketPool {
    /// Create an empty pool.
    ///
    /// `total_supply` may exceed `capacity`; the pool simply fills up and
    /// vendors wait for customers to make room.
    pub fn new(capacity: u64, total_supply: u64) -> Self {
        Self {
            capacity,
            total_supply,
            state: Mutex::new(PoolState {
                available: 0,
                remaining_supply: total_supply,
                released: 0,
                retrieved: 0,
                sold_out_reported: false,
            }),
        }
    }

    /// Maximum tickets the pool may hold.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Tickets this pool started with as supply.
    pub fn total_supply(&self) -> u64 {
        self.total_supply
    }

    /// Release up to `requested` tickets into the pool.
    ///
    /// Accepts the smaller of `requested`, the remaining supply, and the free
    /// space. Returns `accepted == 0` when either is exhausted; that is a
    /// normal outcome, not an error.
    pub fn try_release(&self, requested: u64) -> ReleaseResult {
        let mut state = self.lock();

        let free = self.capacity - state.available;
        let accepted = requested.min(free).min(state.remaining_supply);

        state.available += accepted;
        state.remaining_supply -= accepted;
        state.released += accepted;

        debug_assert!(state.available <= self.capacity);
        debug_assert_eq!(state.released + state.remaining_supply, self.total_supply);

        ReleaseResult {
            accepted,
            available: state.available,
            remaining_supply: state.remaining_supply,
        }
    }

    /// Retrieve up to `requested` tickets from the pool.
    ///
    /// Returns `accepted == 0` when the pool is empty.
    pub fn try_retrieve(&self, requested: u64) -> RetrieveResult {
        let mut state = self.lock();

        let accepted = requested.min(state.available);

        state.available -= accepted;
        state.retrieved += accepted;

        debug_assert_eq!(state.available, state.released - state.retrieved);

        let exhausted = state.available == 0 && state.remaining_supply == 0;
        let sold_out = exhausted && !state.sold_out_reported;
        if sold_out {
            state.sold_out_reported = true;
            tracing::debug!(retrieved = state.retrieved, "ticket pool sold out");
        }

        RetrieveResult {
            accepted,
            available: state.available,
            remaining_supply: state.remaining_supply,
            sold_out,
        }
    }

    /// Current counters, read under the same lock as the mutations.
    pub fn snapshot(&self) -> PoolSnapshot {
        let state = self.lock();
        PoolSnapshot {
            capacity: self.capacity,
            available: state.available,
            remaining_supply: state.remaining_supply,
            total_released: state.released,
            total_retrieved: state.retrieved,
        }
    }

    // Every mutation leaves the counters consistent before any code that
    // could panic runs, so a poisoned lock still guards valid state.
    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
