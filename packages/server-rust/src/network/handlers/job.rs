//! `GET /job/{job_id}`: a single status snapshot, no polling.

use axum::extract::{Path, State};
use axum::Json;
use promptgate_core::validate_job_id;
use promptgate_core::wire::JobResponse;
use promptgate_core::GatewayError;

use super::AppState;
use crate::network::error::ApiError;

/// # Errors
///
/// `VALIDATION_ERROR` for a malformed id, otherwise the classified
/// downstream failure (`NOT_FOUND` for unknown or expired jobs).
pub async fn job_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobResponse>, ApiError> {
    validate_job_id(&job_id)?;
    let job = state
        .agent
        .get_job(&job_id)
        .await
        .map_err(GatewayError::from)?;
    Ok(Json(job.into()))
}
