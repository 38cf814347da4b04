//! Rendering of classified errors as HTTP responses.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use promptgate_core::wire::ErrorEnvelope;
use promptgate_core::GatewayError;
use tracing::{debug, error};

/// A `GatewayError` on its way out of a handler.
#[derive(Debug)]
pub struct ApiError(pub GatewayError);

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(GatewayError::validation(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(kind = %self.0.kind, message = %self.0.message, "Request failed");
        } else {
            debug!(kind = %self.0.kind, message = %self.0.message, "Request rejected");
        }
        let envelope = ErrorEnvelope::new(self.0, chrono::Utc::now().to_rfc3339());
        (status, Json(envelope)).into_response()
    }
}
