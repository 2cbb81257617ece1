//! Seeded worker interleaving.
//!
//! [`InterleavingDriver`] owns a pool, a log, and one [`Worker`] per vendor
//! and customer of a [`SimulationConfig`]. Each [`step`](InterleavingDriver::step)
//! ticks one randomly chosen active worker and executes its actions, exactly
//! as the production runtime would, minus the clock.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use ticketsim_core::{
    Customer, LogSink, SimulationConfig, TicketPool, Vendor, Worker, WorkerAction, WorkerKind,
};

use crate::invariants::{InvariantRegistry, SystemSnapshot, Violation};

/// What a single step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOutcome {
    /// Side of the pool the ticked worker sits on
    pub kind: WorkerKind,
    /// Worker number within its kind
    pub id: usize,
    /// Whether the worker exited during this step
    pub exited: bool,
}

struct Slot {
    worker: Box<dyn Worker>,
    exited: bool,
}

/// Deterministic driver that ticks workers in a seeded random order.
pub struct InterleavingDriver {
    rng: ChaCha8Rng,
    pool: TicketPool,
    log: LogSink,
    slots: Vec<Slot>,
    steps: u64,
}

impl InterleavingDriver {
    /// Build a driver for `config`; `seed` fixes the interleaving.
    pub fn new(config: &SimulationConfig, seed: u64) -> Self {
        let mut slots: Vec<Slot> = Vec::with_capacity(config.vendors() + config.customers());

        for id in 1..=config.vendors() {
            let vendor = Vendor::new(id, config.ticket_release_rate());
            slots.push(Slot { worker: Box::new(vendor), exited: false });
        }
        for id in 1..=config.customers() {
            let customer = Customer::new(id, config.customer_retrieval_rate());
            slots.push(Slot { worker: Box::new(customer), exited: false });
        }

        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            pool: TicketPool::new(config.max_ticket_capacity(), config.total_tickets()),
            log: LogSink::new(),
            slots,
            steps: 0,
        }
    }

    /// Tick one active worker. Returns `None` once every worker has exited.
    pub fn step(&mut self) -> Option<StepOutcome> {
        let active: Vec<usize> =
            self.slots.iter().enumerate().filter(|(_, s)| !s.exited).map(|(i, _)| i).collect();
        if active.is_empty() {
            return None;
        }

        let index = active[self.rng.gen_range(0..active.len())];
        self.steps += 1;

        let slot = &mut self.slots[index];
        let actions = slot.worker.tick(&self.pool);
        let (kind, id) = (slot.worker.kind(), slot.worker.id());

        for action in actions {
            match action {
                WorkerAction::Emit(event) => {
                    // Step count stands in for the wall clock
                    self.log.append(self.steps, event);
                },
                WorkerAction::Stall { available, remaining_supply } => {
                    tracing::trace!(?kind, id, available, remaining_supply, "worker stalled");
                },
                WorkerAction::Exit => slot.exited = true,
            }
        }

        Some(StepOutcome { kind, id, exited: slot.exited })
    }

    /// Run up to `max_steps` steps, checking `registry` after each one.
    ///
    /// Stops early once every vendor has exited and the pool is drained.
    /// Returns the number of steps taken.
    pub fn run_checked(
        &mut self,
        max_steps: u64,
        registry: &InvariantRegistry,
    ) -> Result<u64, Vec<Violation>> {
        let start = self.steps;

        registry.check_all(&self.snapshot())?;
        while self.steps - start < max_steps && !self.is_quiescent() {
            if self.step().is_none() {
                break;
            }
            registry.check_all(&self.snapshot())?;
        }

        Ok(self.steps - start)
    }

    /// All vendors have exited and the pool is sold out.
    ///
    /// Customers never exit on their own, so this is the natural end of a
    /// run short of cancellation.
    pub fn is_quiescent(&self) -> bool {
        self.active_vendors() == 0 && self.pool.snapshot().is_sold_out()
    }

    /// Vendors that have not exited yet.
    pub fn active_vendors(&self) -> usize {
        self.slots.iter().filter(|s| s.worker.kind() == WorkerKind::Vendor && !s.exited).count()
    }

    /// Steps taken so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// The shared pool.
    pub fn pool(&self) -> &TicketPool {
        &self.pool
    }

    /// The run's event log.
    pub fn log(&self) -> &LogSink {
        &self.log
    }

    /// Capture pool and log for invariant checks.
    pub fn snapshot(&self) -> SystemSnapshot {
        SystemSnapshot::capture(&self.pool, &self.log)
    }
}

#[cfg(test)]
mod tests {
    use ticketsim_core::SimulationParams;

    use super::*;

    fn config(params: SimulationParams) -> SimulationConfig {
        SimulationConfig::try_from(params).expect("valid config")
    }

    #[test]
    fn same_seed_same_log() {
        let config = config(SimulationParams::new(20, 20, 3, 2, 2, 2));

        let mut a = InterleavingDriver::new(&config, 7);
        let mut b = InterleavingDriver::new(&config, 7);
        for _ in 0..100 {
            a.step();
            b.step();
        }

        assert_eq!(a.log().messages(), b.log().messages());
    }

    #[test]
    fn vendors_exit_after_supply_exhausted() {
        let config = config(SimulationParams::new(10, 10, 5, 10, 1, 1));
        let mut driver = InterleavingDriver::new(&config, 1);

        let steps = driver.run_checked(1_000, &InvariantRegistry::standard()).expect("invariants");

        assert!(steps < 1_000);
        assert!(driver.is_quiescent());
        assert_eq!(driver.active_vendors(), 0);
        // the customer is still active
        assert!(driver.step().is_some());
    }
}
