//! Vendor and customer tick logic.
//!
//! A worker tick is a single synchronous step against the pool. It never
//! sleeps and never blocks on another worker; the runtime owns the schedule
//! and executes the returned [`WorkerAction`]s (appending events, tracing,
//! ending the loop).

use crate::{log::TicketEvent, pool::TicketPool};

/// Actions returned by a worker tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerAction {
    /// Append this event to the run's log
    Emit(TicketEvent),

    /// The tick made no progress (pool full or empty). Retry next tick.
    Stall {
        /// Pool level observed by the tick
        available: u64,
        /// Supply observed by the tick
        remaining_supply: u64,
    },

    /// The worker has nothing left to do and should not be ticked again
    Exit,
}

/// Which side of the pool a worker sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerKind {
    /// Releases tickets
    Vendor,
    /// Retrieves tickets
    Customer,
}

/// A participant that is ticked against the shared pool.
pub trait Worker: Send + 'static {
    /// Which side of the pool this worker sits on.
    fn kind(&self) -> WorkerKind;

    /// Worker number within its kind (1-based).
    fn id(&self) -> usize;

    /// Perform one tick.
    ///
    /// # Invariants
    ///
    /// - Performs at most one pool mutation
    /// - Never blocks
    fn tick(&mut self, pool: &TicketPool) -> Vec<WorkerAction>;
}

/// Releases `release_rate` tickets per tick until the supply runs out.
#[derive(Debug, Clone)]
pub struct Vendor {
    id: usize,
    release_rate: u64,
}

impl Vendor {
    /// Create vendor number `id` (1-based).
    pub fn new(id: usize, release_rate: u64) -> Self {
        Self { id, release_rate }
    }
}

impl Worker for Vendor {
    fn kind(&self) -> WorkerKind {
        WorkerKind::Vendor
    }

    fn id(&self) -> usize {
        self.id
    }

    fn tick(&mut self, pool: &TicketPool) -> Vec<WorkerAction> {
        let result = pool.try_release(self.release_rate);
        let mut actions = Vec::with_capacity(2);

        if result.accepted > 0 {
            actions.push(WorkerAction::Emit(TicketEvent::Released {
                vendor: self.id,
                count: result.accepted,
                available: result.available,
                remaining_supply: result.remaining_supply,
            }));
        }

        if result.remaining_supply == 0 {
            actions.push(WorkerAction::Emit(TicketEvent::VendorFinished { vendor: self.id }));
            actions.push(WorkerAction::Exit);
        } else if result.accepted == 0 {
            actions.push(WorkerAction::Stall {
                available: result.available,
                remaining_supply: result.remaining_supply,
            });
        }

        actions
    }
}

/// Retrieves `retrieval_rate` tickets per tick.
///
/// Customers never exit on their own: an empty pool with supply left means
/// vendors are still producing, and an empty pool with no supply is reported
/// once as sold out. Only cancellation ends a customer.
#[derive(Debug, Clone)]
pub struct Customer {
    id: usize,
    retrieval_rate: u64,
}

impl Customer {
    /// Create customer number `id` (1-based).
    pub fn new(id: usize, retrieval_rate: u64) -> Self {
        Self { id, retrieval_rate }
    }
}

impl Worker for Customer {
    fn kind(&self) -> WorkerKind {
        WorkerKind::Customer
    }

    fn id(&self) -> usize {
        self.id
    }

    fn tick(&mut self, pool: &TicketPool) -> Vec<WorkerAction> {
        let result = pool.try_retrieve(self.retrieval_rate);
        let mut actions = Vec::with_capacity(2);

        if result.accepted > 0 {
            actions.push(WorkerAction::Emit(TicketEvent::Retrieved {
                customer: self.id,
                count: result.accepted,
                available: result.available,
            }));
        } else {
            actions.push(WorkerAction::Stall {
                available: result.available,
                remaining_supply: result.remaining_supply,
            });
        }

        if result.sold_out {
            actions.push(WorkerAction::Emit(TicketEvent::SoldOut));
        }

        actions
    }
}
