//! Health, liveness, and readiness endpoint handlers.

use std::time::{Duration, Instant};

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use super::AppState;
use crate::network::HealthState;

/// Upper bound on the downstream reachability check.
const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(2);

/// Returns health details as JSON, including a best-effort downstream check.
///
/// Always returns 200; `status` carries the server state and
/// `downstream.reachable` the check result.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let started = Instant::now();
    let downstream = match tokio::time::timeout(HEALTH_CHECK_TIMEOUT, state.agent.check_health()).await {
        Ok(Ok(())) => json!({
            "reachable": true,
            "latencyMs": u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        }),
        Ok(Err(failure)) => json!({
            "reachable": false,
            "error": failure.to_string(),
        }),
        Err(_) => json!({
            "reachable": false,
            "error": format!("health check timed out after {}ms", HEALTH_CHECK_TIMEOUT.as_millis()),
        }),
    };

    Json(json!({
        "status": state.shutdown.health_state().as_str(),
        "uptimeSecs": state.start_time.elapsed().as_secs(),
        "inFlight": state.shutdown.in_flight_count(),
        "downstream": downstream,
    }))
}

/// Liveness check; always 200 while the process answers.
pub async fn liveness_handler() -> StatusCode {
    StatusCode::OK
}

/// Readiness check; 200 only in the `Ready` state, 503 otherwise.
pub async fn readiness_handler(State(state): State<AppState>) -> StatusCode {
    if state.shutdown.health_state() == HealthState::Ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
