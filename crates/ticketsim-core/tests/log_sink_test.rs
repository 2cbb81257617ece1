//! Concurrency tests for LogSink
//!
//! Many writers append while readers take snapshots. Every snapshot must be a
//! gapless prefix of the final log.

use std::{sync::Arc, thread};

use ticketsim_core::{LogSink, TicketEvent};

const WRITERS: usize = 8;
const EVENTS_PER_WRITER: u64 = 500;

fn assert_gapless(sequences: &[u64]) {
    for (index, sequence) in sequences.iter().enumerate() {
        assert_eq!(*sequence, index as u64, "gap or duplicate at position {index}");
    }
}

#[test]
fn concurrent_appends_produce_total_order() {
    let sink = Arc::new(LogSink::new());

    thread::scope(|scope| {
        for vendor in 1..=WRITERS {
            let sink = Arc::clone(&sink);
            scope.spawn(move || {
                for count in 0..EVENTS_PER_WRITER {
                    let event =
                        TicketEvent::Released { vendor, count, available: 0, remaining_supply: 0 };
                    assert!(sink.append(0, event).is_some());
                }
            });
        }

        for _ in 0..2 {
            let sink = Arc::clone(&sink);
            scope.spawn(move || {
                for _ in 0..200 {
                    let sequences: Vec<u64> = sink.snapshot().iter().map(|e| e.sequence).collect();
                    assert_gapless(&sequences);
                    thread::yield_now();
                }
            });
        }
    });

    let events = sink.snapshot();
    assert_eq!(events.len(), WRITERS * EVENTS_PER_WRITER as usize);
    assert_gapless(&events.iter().map(|e| e.sequence).collect::<Vec<_>>());

    // Per-writer order is preserved within the total order
    for vendor in 1..=WRITERS {
        let counts: Vec<u64> = events
            .iter()
            .filter_map(|e| match e.event {
                TicketEvent::Released { vendor: v, count, .. } if v == vendor => Some(count),
                _ => None,
            })
            .collect();
        assert_eq!(counts, (0..EVENTS_PER_WRITER).collect::<Vec<_>>());
    }
}

#[test]
fn sealing_during_appends_freezes_log() {
    let sink = Arc::new(LogSink::new());

    thread::scope(|scope| {
        for customer in 1..=4 {
            let sink = Arc::clone(&sink);
            scope.spawn(move || {
                for _ in 0..1000 {
                    let event = TicketEvent::Retrieved { customer, count: 1, available: 0 };
                    if sink.append(0, event).is_none() {
                        break;
                    }
                }
            });
        }

        thread::yield_now();
        sink.seal();
    });

    let frozen = sink.len();
    assert_eq!(sink.append(0, TicketEvent::SoldOut), None);
    assert_eq!(sink.len(), frozen);
    assert_gapless(&sink.snapshot().iter().map(|e| e.sequence).collect::<Vec<_>>());
}
