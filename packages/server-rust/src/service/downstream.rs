//! Typed outcome of a failed downstream call.
//!
//! Every collaborator reports failures through `DownstreamFailure` so the
//! classifier inspects structured data (status codes, timeout flags) instead
//! of scanning error strings.

/// Failure of a single outbound call to the agent service or the chain.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DownstreamFailure {
    /// The remote answered with a non-success HTTP status.
    #[error("downstream returned HTTP {code}: {message}")]
    Status { code: u16, message: String },
    /// The call did not complete within its deadline.
    #[error("downstream call timed out: {message}")]
    TimedOut { message: String },
    /// The remote could not be reached (DNS, connect, TLS, reset).
    #[error("downstream unreachable: {message}")]
    Transport { message: String },
    /// A JSON-RPC endpoint answered with an `error` object.
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    /// The remote answered successfully but the body could not be understood.
    #[error("malformed downstream response: {message}")]
    Malformed { message: String },
}

/// Result alias for collaborator calls.
pub type DownstreamResult<T> = Result<T, DownstreamFailure>;

impl DownstreamFailure {
    pub fn status(code: u16, message: impl Into<String>) -> Self {
        Self::Status {
            code,
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for DownstreamFailure {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::TimedOut {
                message: e.to_string(),
            }
        } else if e.is_decode() {
            Self::Malformed {
                message: e.to_string(),
            }
        } else if let Some(status) = e.status() {
            Self::Status {
                code: status.as_u16(),
                message: e.to_string(),
            }
        } else {
            Self::Transport {
                message: e.to_string(),
            }
        }
    }
}
