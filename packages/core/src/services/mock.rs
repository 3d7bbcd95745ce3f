//! In-memory collaborators for tests and dry runs.
//!
//! `ScriptedSource` answers per username from a table of canned responses,
//! `RecordingNotifier` keeps every notification it is handed and
//! `MemorySink` holds the mirrored rows with the same clear-then-append
//! semantics as the spreadsheet sink.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::monitor::{Credentials, DataSource, DeliveryError, FetchError, Notification, Notifier, Sink};
use crate::table::{Row, Table};

#[derive(Debug, Clone)]
enum Scripted {
    Table(Table),
    Error(FetchError),
    Panic,
}

/// Data source replaying canned per-username responses. Usernames without a
/// response fail with an extraction error.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    responses: Mutex<HashMap<String, Scripted>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `username` with `table` until changed.
    pub fn respond(&self, username: &str, table: Table) {
        self.set(username, Scripted::Table(table));
    }

    /// Fail `username` with `error` until changed.
    pub fn fail(&self, username: &str, error: FetchError) {
        self.set(username, Scripted::Error(error));
    }

    /// Panic when `username` is fetched.
    pub fn panic_on(&self, username: &str) {
        self.set(username, Scripted::Panic);
    }

    /// Usernames fetched so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn set(&self, username: &str, response: Scripted) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.insert(username.to_string(), response);
        }
    }
}

#[async_trait]
impl DataSource for ScriptedSource {
    async fn fetch_table(&self, credentials: &Credentials) -> Result<Table, FetchError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(credentials.username.clone());
        }

        let response = self
            .responses
            .lock()
            .ok()
            .and_then(|r| r.get(&credentials.username).cloned());

        match response {
            Some(Scripted::Table(table)) => Ok(table),
            Some(Scripted::Error(err)) => Err(err),
            Some(Scripted::Panic) => panic!("scripted panic for {}", credentials.username),
            None => Err(FetchError::extraction(format!(
                "no scripted response for {}",
                credentials.username
            ))),
        }
    }

    fn source_name(&self) -> &str {
        "scripted"
    }
}

/// Notifier that records instead of sending.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    failure: Mutex<Option<DeliveryError>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every later delivery with `error`.
    pub fn fail_with(&self, error: DeliveryError) {
        if let Ok(mut failure) = self.failure.lock() {
            *failure = Some(error);
        }
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), DeliveryError> {
        if let Some(err) = self.failure.lock().ok().and_then(|f| f.clone()) {
            return Err(err);
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(notification.clone());
        }
        Ok(())
    }

    fn notifier_name(&self) -> &str {
        "recording"
    }
}

/// Sink holding the mirrored rows in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    rows: Mutex<Vec<Row>>,
    writes: Mutex<usize>,
    failure: Mutex<Option<DeliveryError>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with existing content, as a destination that already holds data.
    pub fn with_contents(rows: Vec<Row>) -> Self {
        Self {
            rows: Mutex::new(rows),
            ..Self::default()
        }
    }

    pub fn fail_with(&self, error: DeliveryError) {
        if let Ok(mut failure) = self.failure.lock() {
            *failure = Some(error);
        }
    }

    pub fn contents(&self) -> Vec<Row> {
        self.rows.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.lock().map(|w| *w).unwrap_or_default()
    }
}

#[async_trait]
impl Sink for MemorySink {
    async fn replace_all(&self, table: &Table) -> Result<(), DeliveryError> {
        if let Some(err) = self.failure.lock().ok().and_then(|f| f.clone()) {
            return Err(err);
        }
        let mut rows = self
            .rows
            .lock()
            .map_err(|_| DeliveryError::transport("memory sink lock poisoned"))?;
        rows.clear();
        rows.extend(table.rows().iter().cloned());
        drop(rows);

        if let Ok(mut writes) = self.writes.lock() {
            *writes += 1;
        }
        Ok(())
    }

    fn destination(&self) -> String {
        "memory://mirror".to_string()
    }
}
