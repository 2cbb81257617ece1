//! Invariant checking for deterministic interleaving tests.
//!
//! Invariants are properties that must always hold during a run. Unlike
//! example-based tests that check specific scenarios, invariants verify
//! behavioral properties across all interleavings the driver explores.
//!
//! # Usage
//!
//! ```ignore
//! let registry = InvariantRegistry::standard();
//! let snapshot = SystemSnapshot::capture(&pool, &log);
//! registry.check_all(&snapshot)?;
//! ```

mod checks;
mod snapshot;

pub use checks::{
    CapacityBound, LogMatchesPool, LogSequencing, PoolBalance, SoldOutOnce, SupplyConservation,
};
pub use snapshot::SystemSnapshot;

/// Invariant check result.
pub type InvariantResult = Result<(), Violation>;

/// Identifies which invariant was violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvariantKind {
    /// Pool level within `[0, capacity]`
    CapacityBound,
    /// Released plus remaining equals the initial supply
    SupplyConservation,
    /// Pool level equals released minus retrieved
    PoolBalance,
    /// Log sequence numbers are gapless and unique
    LogSequencing,
    /// Logged release/retrieve totals match the pool counters
    LogMatchesPool,
    /// Sold out reported exactly when the pool is sold out
    SoldOutOnce,
}

impl std::fmt::Display for InvariantKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::CapacityBound => "capacity_bound",
            Self::SupplyConservation => "supply_conservation",
            Self::PoolBalance => "pool_balance",
            Self::LogSequencing => "log_sequencing",
            Self::LogMatchesPool => "log_matches_pool",
            Self::SoldOutOnce => "sold_out_once",
        };
        f.write_str(name)
    }
}

/// Invariant violation with context.
#[derive(Debug, Clone)]
pub struct Violation {
    /// Which invariant was violated.
    pub invariant: InvariantKind,
    /// Description of what went wrong.
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.invariant, self.message)
    }
}

impl std::error::Error for Violation {}

/// An invariant that can be checked against system state.
pub trait Invariant: Send + Sync {
    /// Which invariant this is, for error reporting.
    fn kind(&self) -> InvariantKind;

    /// Check the invariant against the current state.
    fn check(&self, state: &SystemSnapshot) -> InvariantResult;
}

/// Registry of invariants to check.
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl Default for InvariantRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InvariantRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { invariants: Vec::new() }
    }

    /// Create a registry with every standard invariant.
    ///
    /// Only valid when snapshots are taken between whole steps (the harness
    /// does this). A live multi-task run can be observed between a pool
    /// mutation and its log append, so [`LogMatchesPool`] and
    /// [`SoldOutOnce`] would report false positives there; use
    /// [`InvariantRegistry::pool_only`] instead.
    pub fn standard() -> Self {
        let mut registry = Self::pool_only();
        registry.add(LogSequencing);
        registry.add(LogMatchesPool);
        registry.add(SoldOutOnce);
        registry
    }

    /// Create a registry with invariants that hold at any instant.
    pub fn pool_only() -> Self {
        let mut registry = Self::new();
        registry.add(CapacityBound);
        registry.add(SupplyConservation);
        registry.add(PoolBalance);
        registry
    }

    /// Add an invariant to the registry.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    /// Check all invariants against the given state.
    ///
    /// Returns `Ok(())` if all invariants hold, or all violations found.
    pub fn check_all(&self, state: &SystemSnapshot) -> Result<(), Vec<Violation>> {
        let violations: Vec<_> =
            self.invariants.iter().filter_map(|inv| inv.check(state).err()).collect();

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Number of registered invariants.
    pub fn len(&self) -> usize {
        self.invariants.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.invariants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use ticketsim_core::{LogSink, TicketPool};

    use super::*;

    #[test]
    fn standard_registry_has_invariants() {
        let registry = InvariantRegistry::standard();
        assert_eq!(registry.len(), 6);
        assert_eq!(InvariantRegistry::pool_only().len(), 3);
    }

    #[test]
    fn fresh_pool_passes_invariants() {
        let registry = InvariantRegistry::standard();
        let snapshot = SystemSnapshot::capture(&TicketPool::new(10, 5), &LogSink::new());
        assert!(registry.check_all(&snapshot).is_ok());
    }

    #[test]
    fn violation_display_names_invariant() {
        let violation =
            Violation { invariant: InvariantKind::PoolBalance, message: "off by one".to_string() };
        assert_eq!(violation.to_string(), "pool_balance: off by one");
    }
}
