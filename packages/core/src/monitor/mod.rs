//! Change-detection pipeline
//!
//! Fetches every account's table, merges them into one snapshot, diffs it
//! against the previous snapshot and reacts: notify on new rows, mirror the
//! full snapshot to the sink.

pub mod aggregate;
pub mod cycle;
pub mod detector;
pub mod error;
pub mod notification;
pub mod provider;

pub use aggregate::aggregate;
pub use cycle::{CycleOutcome, CycleReport, Delivery, Monitor};
pub use detector::detect_new_rows;
pub use error::{DeliveryError, FetchError};
pub use notification::{format_new_rows, Notification};
pub use provider::{Account, Credentials, DataSource, Notifier, Sink, Unconfigured};
