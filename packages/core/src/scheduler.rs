//! Monitor polling scheduler.
//!
//! Drives the main loop: run one [`Monitor`] cycle, wait the fixed interval,
//! repeat. The loop owns the "monitoring active" flag in the shared store so
//! the status surface can report it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;

use crate::monitor::Monitor;
use crate::store::SharedStore;

/// Run the monitor loop until `shutdown` flips to `true` or its sender is
/// dropped.
///
/// The first cycle starts immediately. Each cycle runs in its own task, so a
/// panicking collaborator only aborts that cycle: it is logged and the loop
/// continues after the usual delay. Shutdown is observed between cycles; a
/// running cycle is always allowed to finish.
pub async fn run_monitor_loop(
    monitor: Arc<Monitor>,
    store: SharedStore,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    store.write().await.set_active(true);
    tracing::info!("Monitoring started (interval: {}s)", interval.as_secs());

    loop {
        if *shutdown.borrow() {
            break;
        }

        run_guarded(&monitor).await;

        tokio::select! {
            _ = time::sleep(interval) => {}

            // Resolves only on `true` or a dropped sender; other updates keep the delay.
            _ = async { let _ = shutdown.wait_for(|stop| *stop).await; } => {
                tracing::info!("Shutdown signal received. Stopping monitor.");
                break;
            }
        }
    }

    store.write().await.set_active(false);
    tracing::info!("Monitoring stopped cleanly");
}

/// Execute a single cycle in its own task. Extracted for testability.
async fn run_guarded(monitor: &Arc<Monitor>) {
    let task = tokio::spawn({
        let monitor = monitor.clone();
        async move { monitor.run_cycle().await }
    });

    match task.await {
        Ok(report) => {
            tracing::debug!(outcome = ?report.outcome, "Cycle complete");
        }
        Err(err) => {
            tracing::error!("Monitor cycle aborted, continuing after delay: {}", err);
            monitor.metrics().cycles_aborted_total.inc();
        }
    }
}
