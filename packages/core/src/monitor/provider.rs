//! Collaborator interfaces for the monitoring cycle.
//!
//! The cycle only talks to the outside world through these traits, so the
//! portal scraper, mail transport and spreadsheet client can be swapped for
//! in-memory doubles in tests.

use std::fmt;

use async_trait::async_trait;

use crate::monitor::error::{DeliveryError, FetchError};
use crate::monitor::notification::Notification;
use crate::table::Table;

/// Login for one portal account.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A configured account slot. Either half of the login may be missing, in
/// which case the account is skipped each cycle.
#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    pub label: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("label", &self.label)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Account {
    pub fn new(label: impl Into<String>, username: Option<String>, password: Option<String>) -> Self {
        Self {
            label: label.into(),
            username: username.filter(|u| !u.is_empty()),
            password: password.filter(|p| !p.is_empty()),
        }
    }

    /// Complete credentials, or `MissingCredentials` naming this slot.
    pub fn credentials(&self) -> Result<Credentials, FetchError> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Ok(Credentials {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => Err(FetchError::missing_credentials(&self.label)),
        }
    }
}

/// Source of one account's table.
#[async_trait]
pub trait DataSource {
    /// Log in with `credentials` and return the exported table.
    async fn fetch_table(&self, credentials: &Credentials) -> Result<Table, FetchError>;

    /// Name used in logs.
    fn source_name(&self) -> &str;
}

/// Delivery channel for new-row notifications.
#[async_trait]
pub trait Notifier {
    async fn notify(&self, notification: &Notification) -> Result<(), DeliveryError>;

    fn notifier_name(&self) -> &str;
}

/// Remote mirror of the full current table.
#[async_trait]
pub trait Sink {
    /// Replace the destination's content with `table`. Previous content is
    /// discarded first.
    async fn replace_all(&self, table: &Table) -> Result<(), DeliveryError>;

    /// Human-facing location of the mirror, quoted in notifications.
    fn destination(&self) -> String;
}

/// Placeholder for a capability whose settings are missing. Every call
/// reports `NotConfigured` so the cycle logs it and carries on.
#[derive(Debug, Clone)]
pub struct Unconfigured {
    capability: String,
}

impl Unconfigured {
    pub fn new(capability: impl Into<String>) -> Self {
        Self { capability: capability.into() }
    }
}

#[async_trait]
impl Notifier for Unconfigured {
    async fn notify(&self, _notification: &Notification) -> Result<(), DeliveryError> {
        Err(DeliveryError::not_configured(&self.capability))
    }

    fn notifier_name(&self) -> &str {
        &self.capability
    }
}

#[async_trait]
impl Sink for Unconfigured {
    async fn replace_all(&self, _table: &Table) -> Result<(), DeliveryError> {
        Err(DeliveryError::not_configured(&self.capability))
    }

    fn destination(&self) -> String {
        format!("({} not configured)", self.capability)
    }
}
