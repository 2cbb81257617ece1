//! Standard invariant checks.
//!
//! These invariants capture behavioral properties that must always hold.
//! They verify WHAT must be true, not specific test scenarios.

use super::{Invariant, InvariantKind, InvariantResult, SystemSnapshot, Violation};

/// Pool level never exceeds capacity.
///
/// `available` is unsigned, so the lower bound is enforced by the type.
pub struct CapacityBound;

impl Invariant for CapacityBound {
    fn kind(&self) -> InvariantKind {
        InvariantKind::CapacityBound
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        if state.pool.available > state.pool.capacity {
            return Err(Violation {
                invariant: self.kind(),
                message: format!(
                    "available {} exceeds capacity {}",
                    state.pool.available, state.pool.capacity
                ),
            });
        }
        Ok(())
    }
}

/// Every ticket ever released came out of the finite supply.
///
/// `released + remaining_supply == total_supply`, which also bounds the
/// released total by the supply.
pub struct SupplyConservation;

impl Invariant for SupplyConservation {
    fn kind(&self) -> InvariantKind {
        InvariantKind::SupplyConservation
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let pool = &state.pool;
        if pool.total_released + pool.remaining_supply != state.total_supply {
            return Err(Violation {
                invariant: self.kind(),
                message: format!(
                    "released {} + remaining {} != supply {}",
                    pool.total_released, pool.remaining_supply, state.total_supply
                ),
            });
        }
        Ok(())
    }
}

/// Tickets in the pool are exactly those released and not yet retrieved.
pub struct PoolBalance;

impl Invariant for PoolBalance {
    fn kind(&self) -> InvariantKind {
        InvariantKind::PoolBalance
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let pool = &state.pool;
        let expected = pool.total_released.checked_sub(pool.total_retrieved);
        if expected != Some(pool.available) {
            return Err(Violation {
                invariant: self.kind(),
                message: format!(
                    "available {} but released {} - retrieved {}",
                    pool.available, pool.total_released, pool.total_retrieved
                ),
            });
        }
        Ok(())
    }
}

/// Log sequence numbers are 0, 1, 2, ... with no gaps or duplicates.
pub struct LogSequencing;

impl Invariant for LogSequencing {
    fn kind(&self) -> InvariantKind {
        InvariantKind::LogSequencing
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for (index, event) in state.events.iter().enumerate() {
            if event.sequence != index as u64 {
                return Err(Violation {
                    invariant: self.kind(),
                    message: format!("position {index} has sequence {}", event.sequence),
                });
            }
        }
        Ok(())
    }
}

/// Logged release and retrieval totals agree with the pool counters.
pub struct LogMatchesPool;

impl Invariant for LogMatchesPool {
    fn kind(&self) -> InvariantKind {
        InvariantKind::LogMatchesPool
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let released = state.logged_released();
        let retrieved = state.logged_retrieved();
        if released != state.pool.total_released || retrieved != state.pool.total_retrieved {
            return Err(Violation {
                invariant: self.kind(),
                message: format!(
                    "log shows released {released}/retrieved {retrieved}, pool shows {}/{}",
                    state.pool.total_released, state.pool.total_retrieved
                ),
            });
        }
        Ok(())
    }
}

/// "Sold out" appears once, and only after the pool is actually sold out.
pub struct SoldOutOnce;

impl Invariant for SoldOutOnce {
    fn kind(&self) -> InvariantKind {
        InvariantKind::SoldOutOnce
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let reported = state.sold_out_events();
        let expected = usize::from(state.pool.is_sold_out());
        if reported != expected {
            return Err(Violation {
                invariant: self.kind(),
                message: format!(
                    "{reported} sold-out events, pool available {} remaining {}",
                    state.pool.available, state.pool.remaining_supply
                ),
            });
        }
        Ok(())
    }
}
