use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, GatewayError};

/// Shared shape of every error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Always `false`.
    pub success: bool,
    pub error: ErrorBody,
    /// RFC 3339 time the error was rendered.
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorEnvelope {
    /// Wraps `error` with the supplied render time.
    #[must_use]
    pub fn new(error: GatewayError, timestamp: String) -> Self {
        Self {
            success: false,
            error: ErrorBody {
                code: error.kind,
                message: error.message,
                details: error.details,
            },
            timestamp,
        }
    }
}
