//! Error classification: converts a `DownstreamFailure` into an `ErrorKind`.
//!
//! The mapping is total. Anything not explicitly recognized falls through to
//! `ErrorKind::Internal`.

use promptgate_core::{ErrorKind, GatewayError};

use super::downstream::DownstreamFailure;

/// Classify a downstream failure.
///
/// | failure                         | kind               |
/// |---------------------------------|--------------------|
/// | HTTP 402                        | `PAYMENT_REQUIRED` |
/// | HTTP 401                        | `UNAUTHORIZED`     |
/// | HTTP 404                        | `NOT_FOUND`        |
/// | HTTP 429                        | `RATE_LIMITED`     |
/// | HTTP 408 / 504, call timed out  | `TIMEOUT`          |
/// | everything else                 | `INTERNAL`         |
#[must_use]
pub fn classify(failure: &DownstreamFailure) -> ErrorKind {
    match failure {
        DownstreamFailure::Status { code, .. } => classify_status(*code),
        DownstreamFailure::TimedOut { .. } => ErrorKind::Timeout,
        DownstreamFailure::Transport { .. }
        | DownstreamFailure::Rpc { .. }
        | DownstreamFailure::Malformed { .. } => ErrorKind::Internal,
    }
}

/// Classify a bare HTTP status code reported by a downstream service.
#[must_use]
pub fn classify_status(code: u16) -> ErrorKind {
    match code {
        402 => ErrorKind::PaymentRequired,
        401 => ErrorKind::Unauthorized,
        404 => ErrorKind::NotFound,
        429 => ErrorKind::RateLimited,
        408 | 504 => ErrorKind::Timeout,
        _ => ErrorKind::Internal,
    }
}

impl From<DownstreamFailure> for GatewayError {
    fn from(failure: DownstreamFailure) -> Self {
        let kind = classify(&failure);
        let message = match kind {
            // 401 from downstream is the gateway's own credential problem.
            ErrorKind::Unauthorized => format!("agent service rejected gateway credentials: {failure}"),
            _ => failure.to_string(),
        };
        GatewayError::new(kind, message)
    }
}
