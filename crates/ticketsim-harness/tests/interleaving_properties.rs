//! Property-based tests over randomized worker interleavings
//!
//! Every valid configuration, under every seeded interleaving, must keep the
//! pool within bounds, conserve supply, and keep the log consistent with the
//! pool after every single step.

use proptest::prelude::*;
use ticketsim_core::{SimulationConfig, SimulationParams, TicketEvent};
use ticketsim_harness::{InterleavingDriver, InvariantRegistry};

fn valid_params() -> impl Strategy<Value = SimulationParams> {
    (1i64..60, 1i64..12, 1i64..12, 1i64..5, 1i64..5).prop_flat_map(
        |(capacity, release, retrieve, vendors, customers)| {
            (1i64..=capacity).prop_map(move |total| {
                SimulationParams::new(capacity, total, release, retrieve, vendors, customers)
            })
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(150))]

    /// Property: all invariants hold after every step of any interleaving
    #[test]
    fn prop_invariants_hold_every_step(
        params in valid_params(),
        seed in any::<u64>(),
        steps in 1u64..400
    ) {
        let config = SimulationConfig::try_from(params)?;
        let mut driver = InterleavingDriver::new(&config, seed);

        let result = driver.run_checked(steps, &InvariantRegistry::standard());
        prop_assert!(result.is_ok(), "violations: {:?}", result.err());
    }

    /// Property: a run always reaches quiescence with the whole supply sold
    #[test]
    fn prop_runs_reach_quiescence(
        params in valid_params(),
        seed in any::<u64>()
    ) {
        let config = SimulationConfig::try_from(params)?;
        let mut driver = InterleavingDriver::new(&config, seed);

        // Each step moves at least one ticket with probability bounded below,
        // so this budget is generous for supplies under 60.
        let result = driver.run_checked(200_000, &InvariantRegistry::standard());
        prop_assert!(result.is_ok(), "violations: {:?}", result.err());
        prop_assert!(driver.is_quiescent());

        let snapshot = driver.snapshot();
        prop_assert_eq!(snapshot.logged_released(), config.total_tickets());
        prop_assert_eq!(snapshot.logged_retrieved(), config.total_tickets());
        prop_assert_eq!(snapshot.sold_out_events(), 1);
    }

    /// Property: each vendor logs "finished" exactly once, after its last release
    #[test]
    fn prop_vendor_finishes_once(
        params in valid_params(),
        seed in any::<u64>()
    ) {
        let config = SimulationConfig::try_from(params)?;
        let mut driver = InterleavingDriver::new(&config, seed);
        driver.run_checked(200_000, &InvariantRegistry::standard())
            .map_err(|v| TestCaseError::fail(format!("{v:?}")))?;

        let events = driver.log().snapshot();
        for vendor in 1..=config.vendors() {
            let finished: Vec<usize> = events
                .iter()
                .enumerate()
                .filter(|(_, e)| e.event == TicketEvent::VendorFinished { vendor })
                .map(|(i, _)| i)
                .collect();
            prop_assert_eq!(finished.len(), 1);

            let released_after = events[finished[0]..].iter().any(|e| {
                matches!(e.event, TicketEvent::Released { vendor: v, .. } if v == vendor)
            });
            prop_assert!(!released_after);
        }
    }
}

/// The reference scenario: capacity 100, 50 tickets, 2 vendors releasing 5,
/// 3 customers retrieving 3.
#[test]
fn reference_scenario_sells_exactly_fifty() {
    let config = SimulationConfig::try_from(SimulationParams::new(100, 50, 5, 3, 2, 3))
        .expect("valid config");

    for seed in 0..20 {
        let mut driver = InterleavingDriver::new(&config, seed);
        driver
            .run_checked(100_000, &InvariantRegistry::standard())
            .unwrap_or_else(|v| panic!("seed {seed}: {v:?}"));

        let snapshot = driver.snapshot();
        assert_eq!(snapshot.pool.remaining_supply, 0, "seed {seed}");
        assert_eq!(snapshot.pool.available, 0, "seed {seed}");
        assert_eq!(snapshot.logged_released(), 50, "seed {seed}");
        assert_eq!(driver.active_vendors(), 0, "seed {seed}");
    }
}

/// Supply equal to capacity fills the pool exactly, never beyond.
#[test]
fn supply_equal_to_capacity_fills_pool_exactly() {
    let config =
        SimulationConfig::try_from(SimulationParams::new(2, 2, 5, 1, 3, 1)).expect("valid config");
    let mut driver = InterleavingDriver::new(&config, 42);

    driver.run_checked(10_000, &InvariantRegistry::standard()).expect("invariants");

    let snapshot = driver.snapshot();
    assert_eq!(snapshot.logged_released(), 2);
    assert_eq!(snapshot.pool.total_retrieved, 2);
    assert!(snapshot.events.iter().all(|e| match e.event {
        TicketEvent::Released { available, .. } => available <= 2,
        _ => true,
    }));
}
