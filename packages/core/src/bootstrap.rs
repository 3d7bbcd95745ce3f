//! Wires configured collaborators into a [`Monitor`].
//!
//! Missing notifier or sink settings never stop startup: the capability is
//! replaced by an [`Unconfigured`] placeholder and every cycle logs it.

use std::sync::Arc;

use crate::config::{Config, SheetsConfig};
use crate::error::ConfigError;
use crate::metrics::AppMetrics;
use crate::monitor::{Monitor, Notifier, Sink, Unconfigured};
use crate::services::mailer::SmtpNotifier;
use crate::services::portal::PortalClient;
use crate::services::sheets::{ServiceAccountKey, ServiceAccountTokens, SheetsSink};
use crate::services::webhook::WebhookNotifier;
use crate::store::SharedStore;

pub fn build_monitor(config: &Config, store: SharedStore, metrics: Arc<AppMetrics>) -> Monitor {
    let source = Arc::new(PortalClient::new(&config.portal));

    let sink: Arc<dyn Sink + Send + Sync> = match build_sheets_sink(&config.sheets) {
        Ok(sink) => Arc::new(sink),
        Err(err) => {
            tracing::warn!(error = %err, "Spreadsheet sync disabled");
            Arc::new(Unconfigured::new("spreadsheet sink"))
        }
    };

    let mut monitor = Monitor::new(config.accounts.clone(), source, sink, store, metrics);

    let mut notifiers: Vec<Arc<dyn Notifier + Send + Sync>> = Vec::new();
    if let Some(email) = &config.email {
        notifiers.push(Arc::new(SmtpNotifier::new(email.clone())));
    }
    if let Some(url) = &config.webhook_url {
        notifiers.push(Arc::new(WebhookNotifier::new(url.clone())));
    }
    if notifiers.is_empty() {
        tracing::warn!("No notifier configured; new rows will only be logged");
        notifiers.push(Arc::new(Unconfigured::new("email notifier")));
    }

    for notifier in notifiers {
        monitor = monitor.with_notifier(notifier);
    }

    let accounts_ready = config
        .accounts
        .iter()
        .filter(|account| account.credentials().is_ok())
        .count();
    tracing::info!(
        accounts = config.accounts.len(),
        accounts_ready,
        notifiers = ?monitor.notifier_names(),
        sink = %monitor.sink_destination(),
        "Monitor configured"
    );

    monitor
}

fn build_sheets_sink(config: &SheetsConfig) -> Result<SheetsSink, ConfigError> {
    let raw_key = config
        .service_account_json
        .as_deref()
        .ok_or_else(|| ConfigError::missing("GCP_SERVICE_ACCOUNT"))?;
    let spreadsheet_id = config
        .spreadsheet_id
        .clone()
        .ok_or_else(|| ConfigError::missing("SPREADSHEET_ID"))?;

    let key = ServiceAccountKey::from_json(raw_key)?;
    let tokens = ServiceAccountTokens::new(key);

    Ok(SheetsSink::new(
        spreadsheet_id,
        config.worksheet.clone(),
        Box::new(tokens),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MonitorStore;
    use std::collections::HashMap;
    use std::time::Duration;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned()).unwrap()
    }

    fn monitor_for(config: &Config) -> Monitor {
        build_monitor(
            config,
            MonitorStore::shared(Duration::from_secs(30)),
            Arc::new(AppMetrics::new().unwrap()),
        )
    }

    #[test]
    fn missing_settings_fall_back_to_placeholders() {
        let monitor = monitor_for(&config_from(&[]));

        assert_eq!(monitor.notifier_names(), vec!["email notifier"]);
        assert!(monitor.sink_destination().contains("not configured"));
    }

    #[test]
    fn configured_notifiers_are_all_registered() {
        let monitor = monitor_for(&config_from(&[
            ("GMAIL_ADDRESS", "me@example.com"),
            ("GMAIL_APP_PASSWORD", "app-pw"),
            ("NOTIFY_WEBHOOK_URL", "http://127.0.0.1:9/hook"),
        ]));

        assert_eq!(monitor.notifier_names(), vec!["email", "webhook"]);
    }

    #[test]
    fn valid_service_account_enables_sheets_sink() {
        let monitor = monitor_for(&config_from(&[
            (
                "GCP_SERVICE_ACCOUNT",
                r#"{"client_email":"svc@example.iam.gserviceaccount.com","private_key":"pem"}"#,
            ),
            ("SPREADSHEET_ID", "abc123"),
        ]));

        assert_eq!(
            monitor.sink_destination(),
            "https://docs.google.com/spreadsheets/d/abc123"
        );
    }

    #[test]
    fn malformed_service_account_is_a_config_error() {
        let config = config_from(&[
            ("GCP_SERVICE_ACCOUNT", "not json"),
            ("SPREADSHEET_ID", "abc123"),
        ]);

        assert!(matches!(
            build_sheets_sink(&config.sheets),
            Err(ConfigError::ServiceAccount { .. })
        ));
    }
}
