//! Deterministic interleaving harness for ticket simulation testing.
//!
//! The production runtime ticks every worker on its own task, so the order of
//! pool operations depends on the scheduler. This harness replaces the
//! scheduler with a seeded RNG: each step picks one active worker and ticks
//! it. The same seed always produces the same interleaving, so a failing
//! property test can be replayed exactly.
//!
//! # Invariant Testing
//!
//! The `invariants` module provides behavioral checks over a
//! [`SystemSnapshot`]. Use [`InvariantRegistry::standard()`] to check pool
//! bounds, supply conservation, and log sequencing after every step.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod interleave;
pub mod invariants;

pub use interleave::{InterleavingDriver, StepOutcome};
pub use invariants::{
    CapacityBound, Invariant, InvariantKind, InvariantRegistry, InvariantResult, LogMatchesPool,
    LogSequencing, PoolBalance, SoldOutOnce, SupplyConservation, SystemSnapshot, Violation,
};
