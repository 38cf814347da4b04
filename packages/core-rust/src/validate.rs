//! Request-shape validation.
//!
//! Runs before any downstream call so malformed input never consumes
//! agent-service quota.

use alloy_primitives::Address;

use crate::allowance::parse_address;
use crate::error::GatewayError;
use crate::poll::PollConfig;
use crate::wire::PromptRequest;

/// Maximum prompt length in characters.
pub const MAX_PROMPT_CHARS: usize = 10_000;
/// Maximum accepted job identifier length.
pub const MAX_JOB_ID_LEN: usize = 128;

/// A prompt that passed validation, ready to hand to the agent service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSubmission {
    pub prompt: String,
    pub wallet_address: Option<Address>,
    pub use_channel: Option<bool>,
}

/// Validates a `POST /prompt` body and resolves its poll bounds against `defaults`.
///
/// # Errors
///
/// Returns a `VALIDATION_ERROR` describing the first problem found.
pub fn validate_prompt_request(
    request: PromptRequest,
    defaults: &PollConfig,
) -> Result<(PromptSubmission, PollConfig), GatewayError> {
    let prompt = request
        .prompt
        .ok_or_else(|| GatewayError::validation("prompt is required"))?;
    if prompt.trim().is_empty() {
        return Err(GatewayError::validation("prompt must not be empty"));
    }
    let chars = prompt.chars().count();
    if chars > MAX_PROMPT_CHARS {
        return Err(GatewayError::validation(format!(
            "prompt must be at most {MAX_PROMPT_CHARS} characters, got {chars}"
        )));
    }

    let wallet_address = request
        .wallet_address
        .as_deref()
        .map(|raw| parse_address(raw, "walletAddress"))
        .transpose()?;

    let poll = match request.poll {
        Some(overrides) => defaults.with_overrides(&overrides)?,
        None => *defaults,
    };

    Ok((
        PromptSubmission {
            prompt,
            wallet_address,
            use_channel: request.channel_flag,
        },
        poll,
    ))
}

/// Checks a job identifier taken from a URL path.
///
/// # Errors
///
/// Returns a `VALIDATION_ERROR` when empty, too long, or containing characters
/// outside `[A-Za-z0-9_-]`.
pub fn validate_job_id(job_id: &str) -> Result<(), GatewayError> {
    if job_id.is_empty() || job_id.len() > MAX_JOB_ID_LEN {
        return Err(GatewayError::validation(format!(
            "jobId must be 1 to {MAX_JOB_ID_LEN} characters"
        )));
    }
    if !job_id
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
    {
        return Err(GatewayError::validation(
            "jobId may only contain letters, digits, '_' and '-'",
        ));
    }
    Ok(())
}
