//! End-to-end cycles against in-memory collaborators.
//!
//! Two accounts feed one monitor; the scenarios walk through baseline,
//! detection, empty cycles and delivery failures across consecutive checks.

use std::sync::Arc;
use std::time::Duration;

use listing_monitor::{
    metrics::AppMetrics,
    monitor::{Account, CycleOutcome, Delivery, DeliveryError, FetchError, Monitor},
    services::mock::{MemorySink, RecordingNotifier, ScriptedSource},
    store::MonitorStore,
    table::{Row, Table},
};

const HEADER: [&str; 3] = ["受付番号", "お客様名", "引越予定日"];

fn listings(prefix: &str, range: std::ops::Range<usize>) -> Table {
    let mut rows: Vec<Row> = vec![HEADER.iter().map(|h| h.to_string()).collect()];
    rows.extend(range.map(|i| {
        vec![
            format!("{}-{:03}", prefix, i),
            format!("customer {}", i),
            "2024/06/01".to_string(),
        ]
    }));
    Table::new(rows)
}

struct Scenario {
    source: Arc<ScriptedSource>,
    notifier: Arc<RecordingNotifier>,
    sink: Arc<MemorySink>,
    metrics: Arc<AppMetrics>,
    monitor: Monitor,
}

fn scenario() -> Scenario {
    let source = Arc::new(ScriptedSource::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let sink = Arc::new(MemorySink::new());
    let metrics = Arc::new(AppMetrics::new().unwrap());
    let store = MonitorStore::shared(Duration::from_secs(30));

    let accounts = vec![
        Account::new("account 1", Some("alpha".into()), Some("pw-a".into())),
        Account::new("account 2", Some("beta".into()), Some("pw-b".into())),
    ];

    let monitor = Monitor::new(accounts, source.clone(), sink.clone(), store, metrics.clone())
        .with_notifier(notifier.clone());

    Scenario {
        source,
        notifier,
        sink,
        metrics,
        monitor,
    }
}

#[tokio::test]
async fn baseline_then_new_rows_from_recovered_account() {
    let s = scenario();

    // Cycle 1: alpha has 10 rows, beta is down.
    s.source.respond("alpha", listings("A", 0..10));
    s.source.fail("beta", FetchError::network("connection reset"));

    let first = s.monitor.run_cycle().await;

    assert_eq!(first.outcome, CycleOutcome::Baseline);
    assert_eq!(first.notification, Delivery::Skipped);
    assert_eq!(first.sync, Delivery::Delivered);
    assert_eq!(first.failed_accounts.len(), 1);
    assert_eq!(first.failed_accounts[0].0, "account 2");
    assert!(s.notifier.sent().is_empty());
    assert_eq!(s.sink.contents().len(), 11);

    // Cycle 2: beta is back with 5 rows the baseline has never seen.
    s.source.respond("beta", listings("B", 0..5));

    let second = s.monitor.run_cycle().await;

    assert_eq!(second.outcome, CycleOutcome::NewRows(5));
    assert_eq!(second.notification, Delivery::Delivered);
    assert!(second.failed_accounts.is_empty());
    assert_eq!(second.snapshot_rows, 16);

    let sent = s.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].body.contains("5 new listing(s) were added."));
    assert!(sent[0].body.contains("[Listing 1]"));
    assert!(sent[0].body.contains("[Listing 3]"));
    assert!(!sent[0].body.contains("[Listing 4]"));
    assert!(sent[0].body.contains("and 2 more"));
    assert!(sent[0].body.contains("memory://mirror"));

    // Mirror holds one header plus every data row from both accounts.
    let mirrored = s.sink.contents();
    assert_eq!(mirrored.len(), 16);
    assert_eq!(mirrored[0], HEADER.to_vec());
    assert_eq!(mirrored.iter().filter(|r| r[..] == HEADER[..]).count(), 1);

    assert_eq!(s.source.calls(), vec!["alpha", "beta", "alpha", "beta"]);

    // Cycle 3: nothing changed, mirror is still refreshed.
    let third = s.monitor.run_cycle().await;
    assert_eq!(third.outcome, CycleOutcome::Unchanged);
    assert_eq!(s.notifier.sent().len(), 1);
    assert_eq!(s.sink.write_count(), 3);

    let status = s.monitor.store().read().await.status();
    assert_eq!(status.cycles_run, 3);
    assert_eq!(status.snapshot_rows, 16);
    assert_eq!(status.last_outcome, Some(CycleOutcome::Unchanged));
}

#[tokio::test]
async fn empty_cycle_keeps_the_previous_baseline() {
    let s = scenario();
    s.source.respond("alpha", listings("A", 0..3));
    s.source.respond("beta", listings("B", 0..2));
    s.monitor.run_cycle().await;

    // Both accounts fail: nothing is compared, nothing is written.
    s.source.fail("alpha", FetchError::auth("password expired"));
    s.source.fail("beta", FetchError::extraction("no download link"));
    let empty = s.monitor.run_cycle().await;

    assert_eq!(empty.outcome, CycleOutcome::NoData);
    assert_eq!(empty.sync, Delivery::Skipped);
    assert_eq!(s.sink.write_count(), 1);
    assert_eq!(s.monitor.store().read().await.snapshot_rows(), 6);

    // Recovery with the same rows is not reported as new.
    s.source.respond("alpha", listings("A", 0..3));
    s.source.respond("beta", listings("B", 0..2));
    let recovered = s.monitor.run_cycle().await;

    assert_eq!(recovered.outcome, CycleOutcome::Unchanged);
    assert!(s.notifier.sent().is_empty());
    assert_eq!(s.metrics.empty_cycles_total.get(), 1.0);
}

#[tokio::test]
async fn delivery_failures_do_not_hold_back_the_baseline() {
    let s = scenario();
    s.source.respond("alpha", listings("A", 0..2));
    s.source.respond("beta", listings("B", 0..0));
    s.monitor.run_cycle().await;

    s.notifier.fail_with(DeliveryError::transport("smtp down"));
    s.sink.fail_with(DeliveryError::rejected(403, "forbidden"));
    s.source.respond("alpha", listings("A", 0..4));

    let report = s.monitor.run_cycle().await;

    assert_eq!(report.outcome, CycleOutcome::NewRows(2));
    assert!(matches!(report.notification, Delivery::Failed(_)));
    assert!(matches!(report.sync, Delivery::Failed(_)));

    // The failed rows are not re-announced on the next check.
    let next = s.monitor.run_cycle().await;
    assert_eq!(next.outcome, CycleOutcome::Unchanged);
}

#[tokio::test]
async fn accounts_without_credentials_are_skipped() {
    let source = Arc::new(ScriptedSource::new());
    let sink = Arc::new(MemorySink::new());
    source.respond("alpha", listings("A", 0..1));

    let monitor = Monitor::new(
        vec![
            Account::new("account 1", Some("alpha".into()), Some("pw".into())),
            Account::new("account 2", None, None),
        ],
        source.clone(),
        sink.clone(),
        MonitorStore::shared(Duration::from_secs(30)),
        Arc::new(AppMetrics::new().unwrap()),
    );

    let report = monitor.run_cycle().await;

    assert_eq!(report.outcome, CycleOutcome::Baseline);
    assert_eq!(source.calls(), vec!["alpha"]);
    assert_eq!(report.failed_accounts[0].0, "account 2");
    assert_eq!(sink.contents().len(), 2);
}
