//! Poll-until-terminal orchestration.
//!
//! Turns the agent service's fire-and-forget job model into a single awaited
//! call. Each invocation submits exactly once, then checks status at a fixed
//! interval until the job is terminal, the attempt cap is spent, or the
//! wall-clock deadline passes. The loop runs inside the request's own task and
//! suspends only at its sleep and downstream-call points, all of which race
//! the request's `CancellationToken`.

use std::future::Future;
use std::sync::Arc;

use promptgate_core::{GatewayError, GatewayResult, Job, PollConfig, PromptSubmission};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::downstream::{DownstreamFailure, DownstreamResult};
use crate::traits::AgentService;

/// Why a bounded downstream call did not produce a result.
enum Interrupted {
    Cancelled,
    Deadline,
}

/// Drives `AgentService` submission and status checks for one request at a time.
///
/// Holds no per-request state; a single instance is shared by all handlers.
pub struct PollOrchestrator {
    agent: Arc<dyn AgentService>,
}

impl PollOrchestrator {
    #[must_use]
    pub fn new(agent: Arc<dyn AgentService>) -> Self {
        Self { agent }
    }

    /// Submit `submission` and wait for the resulting job to reach a terminal status.
    ///
    /// Guarantees:
    /// - the prompt is submitted at most once;
    /// - at most `config.max_attempts` status checks are made;
    /// - no status check is made after a terminal status is observed;
    /// - the call returns no later than `config.timeout` after it started;
    /// - nothing is polled once `cancel` fires.
    ///
    /// # Errors
    ///
    /// - `TIMEOUT` when the bounds are exhausted without a terminal status;
    /// - the classified kind of the first failed submission or status check
    ///   (a failed check aborts the call, it is not retried);
    /// - `INTERNAL` when cancelled or when the agent returns an inconsistent job.
    pub async fn submit_and_await(
        &self,
        submission: &PromptSubmission,
        config: &PollConfig,
        cancel: &CancellationToken,
    ) -> GatewayResult<Job> {
        let started = Instant::now();
        let deadline = started + config.timeout;

        let submitted = match bounded(cancel, deadline, self.agent.submit_prompt(submission)).await
        {
            Ok(result) => result.map_err(GatewayError::from)?,
            Err(Interrupted::Cancelled) => return Err(cancelled(None)),
            Err(Interrupted::Deadline) => {
                record_outcome("timeout", started);
                return Err(GatewayError::timeout(format!(
                    "job submission did not complete within {}ms",
                    config.timeout.as_millis()
                )));
            }
        };
        // The id is interpolated into the status URL, so hold it to the inbound rules.
        if let Err(invalid) = promptgate_core::validate_job_id(&submitted.job_id) {
            return Err(DownstreamFailure::malformed(format!(
                "submission returned an unusable jobId {:?}: {}",
                submitted.job_id, invalid.message
            ))
            .into());
        }

        let job_id = submitted.job_id.clone();
        info!(job_id = %job_id, status = %submitted.status, "Job submitted");
        if submitted.is_terminal() {
            record_outcome(submitted.status.as_str(), started);
            return Ok(submitted);
        }

        let mut attempts: u32 = 0;
        while attempts < config.max_attempts {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            let wake = (now + config.interval).min(deadline);
            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(cancelled(Some(&job_id))),
                () = tokio::time::sleep_until(wake) => {}
            }
            if Instant::now() >= deadline {
                break;
            }

            attempts += 1;
            metrics::counter!("promptgate_poll_attempts_total").increment(1);

            let job = match bounded(cancel, deadline, self.agent.get_job(&job_id)).await {
                Ok(Ok(job)) => job,
                Ok(Err(failure)) => {
                    warn!(job_id = %job_id, attempt = attempts, error = %failure, "Status check failed");
                    record_outcome("error", started);
                    return Err(failure.into());
                }
                Err(Interrupted::Cancelled) => return Err(cancelled(Some(&job_id))),
                Err(Interrupted::Deadline) => break,
            };

            if job.job_id != job_id {
                return Err(DownstreamFailure::malformed(format!(
                    "status check for {job_id} returned job {}",
                    job.job_id
                ))
                .into());
            }

            debug!(job_id = %job_id, attempt = attempts, status = %job.status, "Status checked");
            if job.is_terminal() {
                info!(
                    job_id = %job_id,
                    status = %job.status,
                    attempts,
                    elapsed_ms = elapsed_ms(started),
                    "Job reached terminal status"
                );
                record_outcome(job.status.as_str(), started);
                return Ok(job);
            }
        }

        warn!(
            job_id = %job_id,
            attempts,
            elapsed_ms = elapsed_ms(started),
            "Job did not reach a terminal status within poll bounds"
        );
        record_outcome("timeout", started);
        Err(GatewayError::timeout(format!(
            "job {job_id} not finished after {attempts} status checks in {}ms",
            elapsed_ms(started)
        ))
        .with_details(serde_json::json!({ "jobId": job_id, "attempts": attempts })))
    }
}

/// Runs `fut` until it completes, `deadline` passes, or `cancel` fires.
async fn bounded<T>(
    cancel: &CancellationToken,
    deadline: Instant,
    fut: impl Future<Output = DownstreamResult<T>>,
) -> Result<DownstreamResult<T>, Interrupted> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(Interrupted::Cancelled),
        result = tokio::time::timeout_at(deadline, fut) => result.map_err(|_| Interrupted::Deadline),
    }
}

fn cancelled(job_id: Option<&str>) -> GatewayError {
    info!(job_id = job_id.unwrap_or("-"), "Caller went away, polling stopped");
    metrics::counter!("promptgate_jobs_total", "outcome" => "cancelled").increment(1);
    GatewayError::internal("request cancelled before the job finished")
}

fn record_outcome(outcome: &'static str, started: Instant) {
    metrics::counter!("promptgate_jobs_total", "outcome" => outcome).increment(1);
    #[allow(clippy::cast_precision_loss)]
    metrics::histogram!("promptgate_poll_duration_ms").record(elapsed_ms(started) as f64);
}

#[allow(clippy::cast_possible_truncation)]
fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
