//! Poll-until-terminal bounds.
//!
//! `PollConfig` carries three independent limits. The poll loop stops at
//! whichever of `max_attempts` or `timeout` is hit first; neither is derived
//! from the other, so an inconsistent combination can never make the loop
//! unbounded.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// Smallest accepted polling interval.
pub const MIN_INTERVAL_MS: u64 = 250;
/// Largest accepted polling interval.
pub const MAX_INTERVAL_MS: u64 = 30_000;
/// Largest accepted attempt cap.
pub const MAX_ATTEMPTS: u32 = 600;
/// Smallest accepted wall-clock timeout.
pub const MIN_TIMEOUT_MS: u64 = 1_000;
/// Largest accepted wall-clock timeout.
pub const MAX_TIMEOUT_MS: u64 = 300_000;

/// Validated polling bounds for one `submit_and_await` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay between consecutive status checks.
    pub interval: Duration,
    /// Hard cap on the number of status checks.
    pub max_attempts: u32,
    /// Wall-clock deadline measured from submission.
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(2_000),
            max_attempts: 60,
            timeout: Duration::from_secs(120),
        }
    }
}

/// Per-request overrides, as sent under `poll` in a prompt request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollOverrides {
    #[serde(default, alias = "interval", skip_serializing_if = "Option::is_none")]
    pub interval_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
    #[serde(default, alias = "timeout", skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl PollConfig {
    /// Builds a config from raw millisecond values, enforcing the bounds.
    ///
    /// # Errors
    ///
    /// Returns a `VALIDATION_ERROR` naming the first out-of-range field.
    pub fn from_millis(
        interval_ms: u64,
        max_attempts: u32,
        timeout_ms: u64,
    ) -> Result<Self, GatewayError> {
        check_range("poll.intervalMs", interval_ms, MIN_INTERVAL_MS, MAX_INTERVAL_MS)?;
        check_range("poll.maxAttempts", u64::from(max_attempts), 1, u64::from(MAX_ATTEMPTS))?;
        check_range("poll.timeoutMs", timeout_ms, MIN_TIMEOUT_MS, MAX_TIMEOUT_MS)?;
        Ok(Self {
            interval: Duration::from_millis(interval_ms),
            max_attempts,
            timeout: Duration::from_millis(timeout_ms),
        })
    }

    /// Applies caller overrides on top of `self`, re-validating the result.
    ///
    /// # Errors
    ///
    /// Returns a `VALIDATION_ERROR` if any resulting value is out of range.
    pub fn with_overrides(&self, overrides: &PollOverrides) -> Result<Self, GatewayError> {
        #[allow(clippy::cast_possible_truncation)]
        let interval_ms = overrides
            .interval_ms
            .unwrap_or(self.interval.as_millis() as u64);
        #[allow(clippy::cast_possible_truncation)]
        let timeout_ms = overrides
            .timeout_ms
            .unwrap_or(self.timeout.as_millis() as u64);
        let max_attempts = overrides.max_attempts.unwrap_or(self.max_attempts);
        Self::from_millis(interval_ms, max_attempts, timeout_ms)
    }

    /// Validates a config that was built without going through `from_millis`.
    ///
    /// # Errors
    ///
    /// Returns a `VALIDATION_ERROR` naming the first out-of-range field.
    pub fn validate(&self) -> Result<(), GatewayError> {
        self.with_overrides(&PollOverrides::default()).map(|_| ())
    }

    /// Upper bound on how long the attempt cap alone would let the loop run.
    #[must_use]
    pub fn attempt_budget(&self) -> Duration {
        self.interval.saturating_mul(self.max_attempts)
    }

    /// The bound that will actually stop a non-terminating loop.
    #[must_use]
    pub fn effective_deadline(&self) -> Duration {
        self.attempt_budget().min(self.timeout)
    }
}

fn check_range(field: &str, value: u64, min: u64, max: u64) -> Result<(), GatewayError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(GatewayError::validation(format!(
            "{field} must be between {min} and {max}, got {value}"
        )))
    }
}
