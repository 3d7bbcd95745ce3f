//! Status surface: a read-only view of the monitor served next to the loop.

pub mod health;
pub mod metrics;
pub mod status;

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::metrics::AppMetrics;
use crate::store::SharedStore;

/// State handed to every handler. Handlers only ever take read locks.
#[derive(Clone)]
pub struct ApiState {
    pub store: SharedStore,
    pub metrics: Arc<AppMetrics>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(status::status_page))
        .route("/status", get(status::status_json))
        .route("/health", get(health::health))
        .route("/metrics", get(metrics::metrics))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
