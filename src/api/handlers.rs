use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use crate::errors::{HttpError, HttpResultExt, Payload, ERR_BAD_REQUEST};
use crate::upstream::UpstreamClient;

lazy_static::lazy_static! {
    static ref START_TIME: Instant = Instant::now();
}

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub upstream: UpstreamClient,
    pub instance_id: String,
}

/// Health check, answered through the same value type as errors
pub async fn health(State(state): State<AppState>) -> HttpError {
    HttpError::new(
        StatusCode::OK.as_u16(),
        Some(json!({
            "status": "healthy",
            "service": "her",
            "version": env!("CARGO_PKG_VERSION"),
            "instance_id": state.instance_id,
            "uptime_seconds": START_TIME.elapsed().as_secs(),
        })),
    )
}

/// Project the canonical response for any status code
pub async fn status_code(Path(code): Path<String>) -> Result<HttpError, HttpError> {
    let code: u16 = code.parse().or_http(StatusCode::BAD_REQUEST.as_u16())?;
    if !(100..=599).contains(&code) {
        return Err(ERR_BAD_REQUEST.clone());
    }

    HttpError::new(code, None).into_result()
}

/// Forward a GET to the upstream API and relay its JSON payload.
///
/// Upstream 5xx responses surface as a local 503; unreachable upstreams as
/// the service-unavailable sentinel.
pub async fn proxy_upstream(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<HttpError, HttpError> {
    let (status, payload) = state.upstream.get(&path).await?;
    debug!(status, path = %path, "Relaying upstream response");

    relay(status, payload).into_result()
}

fn relay(status: u16, payload: Payload) -> HttpError {
    if status >= StatusCode::BAD_REQUEST.as_u16() {
        HttpError::with_message(status, payload.message, payload.result)
    } else {
        HttpError::new(status, payload.result)
    }
}
