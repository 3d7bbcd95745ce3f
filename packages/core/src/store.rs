//! In-memory monitor state.
//!
//! `MonitorStore` holds the comparison baseline (the previous snapshot) and
//! the status fields the web surface reports. It lives only as long as the
//! process; nothing is persisted.
//!
//! The loop task writes it and the Axum handlers read it, always through a
//! [`SharedStore`] (`Arc<RwLock<MonitorStore>>`).

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::monitor::CycleOutcome;
use crate::table::Table;

/// Store handle shared by the loop and the status server.
pub type SharedStore = Arc<RwLock<MonitorStore>>;

/// Baseline snapshot plus monitor status.
#[derive(Debug)]
pub struct MonitorStore {
    previous: Option<Arc<Table>>,
    active: bool,
    interval: Duration,
    last_check: Option<DateTime<Utc>>,
    last_snapshot_at: Option<DateTime<Utc>>,
    last_outcome: Option<CycleOutcome>,
    cycles_run: u64,
}

/// Read-only copy of the status fields, served by `/status`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusView {
    pub active: bool,
    pub interval_seconds: u64,
    pub last_check: Option<DateTime<Utc>>,
    pub last_snapshot_at: Option<DateTime<Utc>>,
    pub snapshot_rows: usize,
    pub cycles_run: u64,
    pub last_outcome: Option<CycleOutcome>,
}

impl MonitorStore {
    pub fn new(interval: Duration) -> Self {
        Self {
            previous: None,
            active: false,
            interval,
            last_check: None,
            last_snapshot_at: None,
            last_outcome: None,
            cycles_run: 0,
        }
    }

    pub fn shared(interval: Duration) -> SharedStore {
        Arc::new(RwLock::new(Self::new(interval)))
    }

    /// The baseline for the next comparison, if one has been established.
    pub fn previous(&self) -> Option<Arc<Table>> {
        self.previous.clone()
    }

    /// Install `snapshot` as the new baseline.
    pub fn replace_snapshot(&mut self, snapshot: Table, at: DateTime<Utc>) {
        self.previous = Some(Arc::new(snapshot));
        self.last_snapshot_at = Some(at);
    }

    /// Record that a cycle finished, whatever its outcome.
    pub fn record_check(&mut self, at: DateTime<Utc>, outcome: CycleOutcome) {
        self.last_check = Some(at);
        self.last_outcome = Some(outcome);
        self.cycles_run += 1;
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn last_check(&self) -> Option<DateTime<Utc>> {
        self.last_check
    }

    pub fn cycles_run(&self) -> u64 {
        self.cycles_run
    }

    /// Rows in the current baseline, header included.
    pub fn snapshot_rows(&self) -> usize {
        self.previous.as_ref().map_or(0, |t| t.len())
    }

    pub fn status(&self) -> StatusView {
        StatusView {
            active: self.active,
            interval_seconds: self.interval.as_secs(),
            last_check: self.last_check,
            last_snapshot_at: self.last_snapshot_at,
            snapshot_rows: self.snapshot_rows(),
            cycles_run: self.cycles_run,
            last_outcome: self.last_outcome.clone(),
        }
    }
}
