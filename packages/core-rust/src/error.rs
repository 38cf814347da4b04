//! Gateway error taxonomy.
//!
//! `ErrorKind` is a closed set: every failure the gateway reports carries
//! exactly one kind, and the kind alone decides the HTTP status. The message
//! is diagnostic text only.

use serde::{Deserialize, Serialize};

/// Classified failure category, serialized in `SCREAMING_SNAKE_CASE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// The agent service requires a payment or token allowance that is not in place.
    PaymentRequired,
    /// Credentials were rejected (the caller's proxy token, or the gateway's own
    /// downstream credentials).
    Unauthorized,
    /// The job identifier is unknown or has expired.
    NotFound,
    /// No terminal status within the poll bounds, or a downstream timeout.
    Timeout,
    /// The downstream service throttled the gateway.
    RateLimited,
    /// The request was malformed; detected before any network call.
    ValidationError,
    /// Anything else.
    Internal,
}

impl ErrorKind {
    /// Every kind, in declaration order.
    pub const ALL: [ErrorKind; 7] = [
        ErrorKind::PaymentRequired,
        ErrorKind::Unauthorized,
        ErrorKind::NotFound,
        ErrorKind::Timeout,
        ErrorKind::RateLimited,
        ErrorKind::ValidationError,
        ErrorKind::Internal,
    ];

    /// HTTP status code rendered for this kind.
    #[must_use]
    pub fn http_status(self) -> u16 {
        match self {
            Self::PaymentRequired => 402,
            Self::Unauthorized => 401,
            Self::NotFound => 404,
            Self::Timeout => 408,
            Self::RateLimited => 429,
            Self::ValidationError => 400,
            Self::Internal => 500,
        }
    }

    /// Stable machine-readable code, identical to the serde encoding.
    #[must_use]
    pub fn as_code(self) -> &'static str {
        match self {
            Self::PaymentRequired => "PAYMENT_REQUIRED",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::NotFound => "NOT_FOUND",
            Self::Timeout => "TIMEOUT",
            Self::RateLimited => "RATE_LIMITED",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::Internal => "INTERNAL",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_code())
    }
}

/// A classified failure with its diagnostic message and optional structured details.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct GatewayError {
    /// Category that drives the HTTP status.
    pub kind: ErrorKind,
    /// Original message, kept for diagnostics.
    pub message: String,
    /// Extra context rendered under `error.details`.
    pub details: Option<serde_json::Value>,
}

/// Result alias used across the gateway.
pub type GatewayResult<T> = Result<T, GatewayError>;

impl GatewayError {
    /// Creates an error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    /// Attaches structured details, replacing any existing ones.
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValidationError, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// HTTP status code for this error's kind.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        self.kind.http_status()
    }
}
