//! Prometheus metrics registry for the listing monitor.
//!
//! [`AppMetrics`] owns all registered metrics and the [`Registry`] they
//! belong to. Construct it once at startup, wrap in `Arc`, and pass it
//! to the monitor and the status router.
//!
//! Exposed at `GET /metrics` in Prometheus text exposition format
//! (`text/plain; version=0.0.4`).

use prometheus::{Counter, CounterVec, Gauge, Opts, Registry};

/// All application-level Prometheus metrics.
pub struct AppMetrics {
    /// Cycles that ran to completion (any outcome).
    pub cycles_total: Counter,
    /// Cycles that aborted (panicked collaborator).
    pub cycles_aborted_total: Counter,
    /// Cycles skipped because no account returned data.
    pub empty_cycles_total: Counter,
    /// Per-account fetch failures.
    pub account_failures_total: Counter,
    /// New rows detected across all cycles.
    pub new_rows_total: Counter,
    /// Notifications delivered successfully.
    pub notifications_sent_total: Counter,
    /// Delivery failures, labelled by target (`notifier` or `sink`).
    pub delivery_errors_total: CounterVec,
    /// Rows (header included) in the current baseline snapshot.
    pub snapshot_rows: Gauge,
    /// The registry that owns all of the above metrics.
    pub registry: Registry,
}

impl AppMetrics {
    /// Create and register all metrics. Returns an error if any metric
    /// name is invalid or duplicated.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let cycles_total = Counter::with_opts(Opts::new(
            "listing_monitor_cycles_total",
            "Monitor cycles completed",
        ))?;

        let cycles_aborted_total = Counter::with_opts(Opts::new(
            "listing_monitor_cycles_aborted_total",
            "Monitor cycles aborted by an unexpected error",
        ))?;

        let empty_cycles_total = Counter::with_opts(Opts::new(
            "listing_monitor_empty_cycles_total",
            "Cycles skipped because no account returned data",
        ))?;

        let account_failures_total = Counter::with_opts(Opts::new(
            "listing_monitor_account_failures_total",
            "Per-account fetch failures",
        ))?;

        let new_rows_total = Counter::with_opts(Opts::new(
            "listing_monitor_new_rows_total",
            "New rows detected",
        ))?;

        let notifications_sent_total = Counter::with_opts(Opts::new(
            "listing_monitor_notifications_sent_total",
            "Notifications delivered",
        ))?;

        let delivery_errors_total = CounterVec::new(
            Opts::new(
                "listing_monitor_delivery_errors_total",
                "Notifier and sink delivery failures",
            ),
            &["target"],
        )?;

        let snapshot_rows = Gauge::with_opts(Opts::new(
            "listing_monitor_snapshot_rows",
            "Rows in the current baseline snapshot",
        ))?;

        registry.register(Box::new(cycles_total.clone()))?;
        registry.register(Box::new(cycles_aborted_total.clone()))?;
        registry.register(Box::new(empty_cycles_total.clone()))?;
        registry.register(Box::new(account_failures_total.clone()))?;
        registry.register(Box::new(new_rows_total.clone()))?;
        registry.register(Box::new(notifications_sent_total.clone()))?;
        registry.register(Box::new(delivery_errors_total.clone()))?;
        registry.register(Box::new(snapshot_rows.clone()))?;

        Ok(Self {
            cycles_total,
            cycles_aborted_total,
            empty_cycles_total,
            account_failures_total,
            new_rows_total,
            notifications_sent_total,
            delivery_errors_total,
            snapshot_rows,
            registry,
        })
    }

    /// Count a delivery failure against `target`.
    pub fn delivery_failed(&self, target: &str) {
        self.delivery_errors_total.with_label_values(&[target]).inc();
    }

    /// Render all metrics as Prometheus text format (for the `/metrics` endpoint).
    pub fn render(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buf = Vec::new();
        encoder.encode(&metric_families, &mut buf)?;
        Ok(String::from_utf8(buf).unwrap_or_default())
    }
}
