//! Worker task loop.
//!
//! Each vendor and customer runs [`drive_worker`] on its own tokio task. The
//! loop ticks the worker, executes the returned actions, and sleeps until the
//! next tick boundary. Cancellation is observed only at tick boundaries, so a
//! pool operation is never interrupted halfway.

use std::{sync::Arc, time::Duration};

use ticketsim_core::{Environment, Worker, WorkerAction};
use tokio::sync::watch;

use crate::controller::Run;

/// Tick `worker` every `interval` until it exits or `cancel` flips to `true`.
///
/// The first tick happens after `offset`, which staggers workers so they do
/// not all hit the pool in the same instant.
pub(crate) async fn drive_worker<E, W>(
    env: E,
    run: Arc<Run>,
    mut worker: W,
    interval: Duration,
    offset: Duration,
    mut cancel: watch::Receiver<bool>,
) where
    E: Environment,
    W: Worker,
{
    let (kind, id) = (worker.kind(), worker.id());

    if !wait_tick(&env, offset, &mut cancel).await {
        return;
    }

    loop {
        if *cancel.borrow() {
            break;
        }

        let actions = worker.tick(run.pool());
        if !execute_actions(&env, &run, actions) {
            tracing::debug!(run_id = run.id(), ?kind, id, "worker finished");
            return;
        }

        if !wait_tick(&env, interval, &mut cancel).await {
            break;
        }
    }

    tracing::debug!(run_id = run.id(), ?kind, id, "worker cancelled");
}

/// Sleep until the next tick boundary.
///
/// Returns `false` if cancellation was signalled (or the controller dropped
/// the signal) while waiting.
async fn wait_tick<E: Environment>(
    env: &E,
    duration: Duration,
    cancel: &mut watch::Receiver<bool>,
) -> bool {
    tokio::select! {
        () = env.sleep(duration) => !*cancel.borrow(),
        changed = cancel.changed() => changed.is_ok() && !*cancel.borrow(),
    }
}

/// Execute worker actions. Returns `false` if the worker asked to exit.
fn execute_actions<E: Environment>(env: &E, run: &Run, actions: Vec<WorkerAction>) -> bool {
    let mut keep_running = true;

    for action in actions {
        match action {
            WorkerAction::Emit(event) => {
                match run.log().append(env.wall_clock_secs(), event) {
                    Some(sequence) => tracing::trace!(run_id = run.id(), sequence, "event logged"),
                    None => tracing::debug!(run_id = run.id(), "event dropped: log sealed"),
                }
            },
            WorkerAction::Stall { available, remaining_supply } => {
                tracing::trace!(run_id = run.id(), available, remaining_supply, "no progress");
            },
            WorkerAction::Exit => keep_running = false,
        }
    }

    keep_running
}
