//! Library root. `src/main.rs` is the production entry point; integration
//! tests in `tests/` use the modules exposed here.

pub mod api;
pub mod bootstrap;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod monitor;
pub mod scheduler;
pub mod services;
pub mod store;
pub mod table;
