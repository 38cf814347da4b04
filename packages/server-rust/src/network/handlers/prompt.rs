//! `POST /prompt`: submit a prompt and wait for its job to finish.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use promptgate_core::allowance::tx_hash_hex;
use promptgate_core::wire::{JobResponse, PromptRequest};
use promptgate_core::{validate_prompt_request, ErrorKind, GatewayError};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::AppState;
use crate::network::error::ApiError;
use crate::service::Remediation;

/// Validates the body, then blocks until the job is terminal or a bound hits.
///
/// Dropping this future (caller disconnect, shutdown) cancels the poll loop.
///
/// # Errors
///
/// Returns the classified `ApiError`; a `PAYMENT_REQUIRED` failure is
/// optionally enriched with remediation details.
pub async fn prompt_handler(
    State(state): State<AppState>,
    payload: Result<Json<PromptRequest>, JsonRejection>,
) -> Result<Json<JobResponse>, ApiError> {
    let Json(request) = payload?;
    let (submission, poll) = validate_prompt_request(request, &state.service.poll)?;

    let cancel = CancellationToken::new();
    let _cancel_on_drop = cancel.clone().drop_guard();

    match state
        .orchestrator
        .submit_and_await(&submission, &poll, &cancel)
        .await
    {
        Ok(job) => {
            info!(job_id = %job.job_id, status = %job.status, "Prompt finished");
            Ok(Json(job.into()))
        }
        Err(err)
            if err.kind == ErrorKind::PaymentRequired
                && state.service.remediate_payment_required =>
        {
            Err(remediate_payment(&state, err).await.into())
        }
        Err(err) => Err(err.into()),
    }
}

/// Runs one allowance remediation and attaches what happened to `err`.
///
/// The job is not resubmitted and the error stays `PAYMENT_REQUIRED`.
async fn remediate_payment(state: &AppState, err: GatewayError) -> GatewayError {
    let facilitator = state.allowance.facilitator().to_checksum(None);
    let details = match state.allowance.remediate().await {
        Ok(Remediation::AlreadyApproved { allowance }) => json!({
            "facilitatorAddress": facilitator,
            "currentAllowance": allowance.to_string(),
        }),
        Ok(Remediation::Approved { previous, receipt }) => json!({
            "facilitatorAddress": facilitator,
            "currentAllowance": previous.to_string(),
            "approvalTransaction": tx_hash_hex(&receipt.transaction_hash),
        }),
        Err(remediation) => {
            warn!(error = %remediation, "Payment remediation failed");
            json!({ "facilitatorAddress": facilitator })
        }
    };
    err.with_details(details)
}
