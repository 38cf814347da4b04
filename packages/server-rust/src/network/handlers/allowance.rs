//! `GET /allowance` and `POST /approve`.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use promptgate_core::allowance::tx_hash_hex;
use promptgate_core::wire::{AllowanceResponse, ApproveRequest, ApproveResponse};
use promptgate_core::{parse_amount, GatewayError};

use super::AppState;
use crate::network::error::ApiError;

/// Current allowance from the gateway wallet to the facilitator.
///
/// # Errors
///
/// Returns the classified chain failure.
pub async fn allowance_handler(
    State(state): State<AppState>,
) -> Result<Json<AllowanceResponse>, ApiError> {
    let current = state.allowance.state().await?;
    Ok(Json(AllowanceResponse {
        allowance: current.current.to_string(),
        facilitator_address: current.facilitator.to_checksum(None),
        owner_address: state.allowance.owner().to_checksum(None),
    }))
}

/// Submits an approval for the facilitator. An empty body approves the maximum.
///
/// # Errors
///
/// `VALIDATION_ERROR` for a malformed body or amount, otherwise the
/// classified chain failure.
pub async fn approve_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ApproveResponse>, ApiError> {
    let request = parse_approve_body(&body)?;
    let amount = request.amount.as_deref().map(parse_amount).transpose()?;

    let receipt = state
        .allowance
        .approve(state.allowance.facilitator(), amount)
        .await?;
    Ok(Json(ApproveResponse {
        transaction_hash: tx_hash_hex(&receipt.transaction_hash),
        facilitator_address: receipt.facilitator.to_checksum(None),
        amount: receipt.amount.to_string(),
    }))
}

fn parse_approve_body(body: &[u8]) -> Result<ApproveRequest, GatewayError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ApproveRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| GatewayError::validation(format!("invalid approve body: {e}")))
}
