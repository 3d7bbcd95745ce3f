//! Error types for the monitoring pipeline.
//!
//! None of these are fatal: a [`FetchError`] drops one account from the
//! cycle and a [`DeliveryError`] is logged and recorded in the cycle report.

use thiserror::Error;

/// Per-account failure from a [`DataSource`](crate::monitor::DataSource).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Missing credentials for {account}")]
    MissingCredentials { account: String },

    #[error("Authentication failed: {message}")]
    Auth { message: String },

    #[error("Table extraction failed: {message}")]
    Extraction { message: String },

    #[error("Network error: {message}")]
    Network { message: String },
}

/// Failure delivering to a [`Notifier`](crate::monitor::Notifier) or
/// [`Sink`](crate::monitor::Sink).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("{capability} is not configured")]
    NotConfigured { capability: String },

    #[error("Authentication error: {message}")]
    Auth { message: String },

    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Remote rejected request (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Invalid payload: {message}")]
    InvalidPayload { message: String },
}

impl FetchError {
    pub fn missing_credentials(account: impl Into<String>) -> Self {
        Self::MissingCredentials { account: account.into() }
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth { message: message.into() }
    }

    pub fn extraction(message: impl Into<String>) -> Self {
        Self::Extraction { message: message.into() }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network { message: message.into() }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        Self::network(err.to_string())
    }
}

impl DeliveryError {
    pub fn not_configured(capability: impl Into<String>) -> Self {
        Self::NotConfigured { capability: capability.into() }
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth { message: message.into() }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport { message: message.into() }
    }

    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected { status, message: message.into() }
    }

    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::InvalidPayload { message: message.into() }
    }
}

impl From<reqwest::Error> for DeliveryError {
    fn from(err: reqwest::Error) -> Self {
        Self::transport(err.to_string())
    }
}
