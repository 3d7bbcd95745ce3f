//! One fetch → aggregate → diff → react pass.
//!
//! [`Monitor::run_cycle`] never fails: every collaborator error is logged,
//! counted and folded into the returned [`CycleReport`]. The baseline in the
//! store is replaced only when the cycle reaches its final step.

use std::sync::Arc;

use chrono::{Local, Utc};
use serde::Serialize;

use crate::metrics::AppMetrics;
use crate::monitor::aggregate::aggregate;
use crate::monitor::detector::detect_new_rows;
use crate::monitor::error::{DeliveryError, FetchError};
use crate::monitor::notification::{format_new_rows, Notification};
use crate::monitor::provider::{Account, DataSource, Notifier, Sink};
use crate::store::SharedStore;
use crate::table::Table;

/// How a cycle ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "new_rows", rename_all = "snake_case")]
pub enum CycleOutcome {
    /// No account returned data rows; baseline untouched.
    NoData,
    /// First snapshot; established the baseline without notifying.
    Baseline,
    /// Compared against the baseline, nothing new.
    Unchanged,
    /// This many rows were new.
    NewRows(usize),
}

/// Result of a notifier or sink step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "snake_case")]
pub enum Delivery {
    Skipped,
    Delivered,
    Failed(String),
}

impl Delivery {
    fn from_result(result: &Result<(), DeliveryError>) -> Self {
        match result {
            Ok(()) => Delivery::Delivered,
            Err(err) => Delivery::Failed(err.to_string()),
        }
    }
}

/// Everything a cycle did, for logs, tests and the status surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub outcome: CycleOutcome,
    /// `(account label, error)` for every account that returned nothing.
    pub failed_accounts: Vec<(String, String)>,
    /// Rows in the aggregated snapshot, header included.
    pub snapshot_rows: usize,
    pub notification: Delivery,
    pub sync: Delivery,
}

/// The change-detection cycle and its collaborators.
pub struct Monitor {
    accounts: Vec<Account>,
    source: Arc<dyn DataSource + Send + Sync>,
    notifiers: Vec<Arc<dyn Notifier + Send + Sync>>,
    sink: Arc<dyn Sink + Send + Sync>,
    store: SharedStore,
    metrics: Arc<AppMetrics>,
}

struct FetchReport {
    tables: Vec<Option<Table>>,
    failures: Vec<(String, FetchError)>,
}

impl Monitor {
    pub fn new(
        accounts: Vec<Account>,
        source: Arc<dyn DataSource + Send + Sync>,
        sink: Arc<dyn Sink + Send + Sync>,
        store: SharedStore,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            accounts,
            source,
            notifiers: Vec::new(),
            sink,
            store,
            metrics,
        }
    }

    /// Add a notification channel. Every channel receives each notification.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier + Send + Sync>) -> Self {
        self.notifiers.push(notifier);
        self
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn metrics(&self) -> &Arc<AppMetrics> {
        &self.metrics
    }

    pub fn sink_destination(&self) -> String {
        self.sink.destination()
    }

    pub fn notifier_names(&self) -> Vec<String> {
        self.notifiers
            .iter()
            .map(|n| n.notifier_name().to_string())
            .collect()
    }

    /// Run one cycle to completion.
    pub async fn run_cycle(&self) -> CycleReport {
        let started = Utc::now();
        tracing::info!(accounts = self.accounts.len(), "Check started");

        let fetched = self.fetch_all().await;
        let failed_accounts: Vec<(String, String)> = fetched
            .failures
            .iter()
            .map(|(label, err)| (label.clone(), err.to_string()))
            .collect();

        let current = aggregate(fetched.tables);
        tracing::info!(rows = current.len(), "Aggregated snapshot");

        if !current.has_data_rows() {
            tracing::warn!(
                failed = failed_accounts.len(),
                "No data rows from any account, skipping cycle"
            );
            self.metrics.empty_cycles_total.inc();
            return self
                .finish(started, CycleReport {
                    outcome: CycleOutcome::NoData,
                    failed_accounts,
                    snapshot_rows: current.len(),
                    notification: Delivery::Skipped,
                    sync: Delivery::Skipped,
                })
                .await;
        }

        let previous = self.store.read().await.previous();

        let (outcome, notification) = match previous.as_deref() {
            None => {
                tracing::info!("First snapshot, establishing baseline without notifying");
                (CycleOutcome::Baseline, Delivery::Skipped)
            }
            Some(previous) => {
                let new_rows = detect_new_rows(Some(previous), &current);
                if new_rows.is_empty() {
                    tracing::info!("No new rows");
                    (CycleOutcome::Unchanged, Delivery::Skipped)
                } else {
                    tracing::info!(new_rows = new_rows.len(), "New rows detected");
                    self.metrics.new_rows_total.inc_by(new_rows.len() as f64);
                    let header = current.header().map(Vec::as_slice).unwrap_or(&[]);
                    let notification = format_new_rows(
                        Local::now().naive_local(),
                        header,
                        &new_rows,
                        &self.sink.destination(),
                    );
                    let delivery = self.notify_all(&notification).await;
                    (CycleOutcome::NewRows(new_rows.len()), delivery)
                }
            }
        };

        let sync = self.sync(&current).await;
        let snapshot_rows = current.len();

        self.store.write().await.replace_snapshot(current, Utc::now());
        self.metrics.snapshot_rows.set(snapshot_rows as f64);

        self.finish(started, CycleReport {
            outcome,
            failed_accounts,
            snapshot_rows,
            notification,
            sync,
        })
        .await
    }

    /// Fetch every account in turn. Failures are logged and skipped.
    async fn fetch_all(&self) -> FetchReport {
        let mut report = FetchReport {
            tables: Vec::with_capacity(self.accounts.len()),
            failures: Vec::new(),
        };

        for account in &self.accounts {
            let result = match account.credentials() {
                Ok(credentials) => {
                    tracing::info!(
                        account = %account.label,
                        source = self.source.source_name(),
                        "Fetching table"
                    );
                    self.source.fetch_table(&credentials).await
                }
                Err(err) => Err(err),
            };

            match result {
                Ok(table) => {
                    tracing::info!(account = %account.label, rows = table.len(), "Fetched table");
                    report.tables.push(Some(table));
                }
                Err(err) => {
                    tracing::warn!(account = %account.label, error = %err, "Skipping account");
                    self.metrics.account_failures_total.inc();
                    report.tables.push(None);
                    report.failures.push((account.label.clone(), err));
                }
            }
        }

        report
    }

    /// Send to every notifier. Delivered if at least one succeeded.
    async fn notify_all(&self, notification: &Notification) -> Delivery {
        if self.notifiers.is_empty() {
            tracing::warn!("New rows found but no notifier is configured");
            return Delivery::Skipped;
        }

        let mut errors = Vec::new();
        let mut delivered = false;

        for notifier in &self.notifiers {
            match notifier.notify(notification).await {
                Ok(()) => {
                    tracing::info!(notifier = notifier.notifier_name(), "Notification sent");
                    self.metrics.notifications_sent_total.inc();
                    delivered = true;
                }
                Err(err) => {
                    tracing::error!(
                        notifier = notifier.notifier_name(),
                        error = %err,
                        "Notification failed"
                    );
                    self.metrics.delivery_failed("notifier");
                    errors.push(format!("{}: {}", notifier.notifier_name(), err));
                }
            }
        }

        if delivered {
            Delivery::Delivered
        } else {
            Delivery::Failed(errors.join("; "))
        }
    }

    async fn sync(&self, table: &Table) -> Delivery {
        let result = self.sink.replace_all(table).await;
        match &result {
            Ok(()) => tracing::info!(
                rows = table.len(),
                destination = %self.sink.destination(),
                "Mirror updated"
            ),
            Err(err) => {
                tracing::error!(error = %err, "Mirror update failed");
                self.metrics.delivery_failed("sink");
            }
        }
        Delivery::from_result(&result)
    }

    async fn finish(&self, started: chrono::DateTime<Utc>, report: CycleReport) -> CycleReport {
        self.store
            .write()
            .await
            .record_check(started, report.outcome.clone());
        self.metrics.cycles_total.inc();
        tracing::info!(
            outcome = ?report.outcome,
            failed_accounts = report.failed_accounts.len(),
            "Check finished"
        );
        report
    }
}
