//! Lightweight in-process metrics (dependency-free).
//!
//! Metrics are stored as atomics and rendered by the `/metrics` handler.
//! `track` is the router middleware feeding the HTTP series.

pub mod metrics;

use std::time::Instant;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::app_state::AppState;

pub async fn track(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let method = req.method().as_str().to_string();
    let started = Instant::now();

    let resp = next.run(req).await;

    let status = resp.status().as_u16().to_string();
    let labels = [("method", method.as_str()), ("status", status.as_str())];
    state.metrics().http_requests.inc(&labels);
    state.metrics().http_duration.observe(&labels, started.elapsed());
    resp
}
