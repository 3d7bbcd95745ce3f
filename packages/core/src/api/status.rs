//! `GET /` and `GET /status`.

use axum::{extract::State, response::Html, Json};
use chrono::{DateTime, Utc};

use crate::api::ApiState;
use crate::store::StatusView;

pub async fn status_json(State(state): State<ApiState>) -> Json<StatusView> {
    Json(state.store.read().await.status())
}

pub async fn status_page(State(state): State<ApiState>) -> Html<String> {
    let status = state.store.read().await.status();
    Html(render_page(&status))
}

fn format_time(at: Option<DateTime<Utc>>) -> String {
    at.map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string())
}

fn render_page(status: &StatusView) -> String {
    let state = if status.active { "running" } else { "stopped" };

    format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <head><meta charset=\"utf-8\"><title>listing-monitor</title></head>\n\
         <body>\n\
         <h1>Listing monitor</h1>\n\
         <p>Monitor is <strong>{}</strong>.</p>\n\
         <ul>\n\
         <li>Check interval: {} seconds</li>\n\
         <li>Last check: {}</li>\n\
         <li>Rows in current snapshot: {}</li>\n\
         <li>Cycles run: {}</li>\n\
         </ul>\n\
         </body>\n\
         </html>\n",
        state,
        status.interval_seconds,
        format_time(status.last_check),
        status.snapshot_rows,
        status.cycles_run,
    )
}
