//! Job model observed from the downstream agent service.
//!
//! A `Job` is created by the agent service when a prompt is submitted and is
//! only ever *read* by the gateway. Once its status reaches a terminal value
//! the downstream service never changes it again.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a downstream job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Accepted by the agent service but not yet picked up.
    Pending,
    /// The agent is working on the prompt.
    Processing,
    /// Finished successfully; `response` is populated.
    Completed,
    /// Finished unsuccessfully.
    Failed,
}

impl JobStatus {
    /// Returns `true` for statuses after which no further transition occurs.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Wire representation, matching the serde encoding.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a downstream job.
///
/// `transactions` and `rich_data` are passed through to the caller verbatim;
/// the gateway never interprets their contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Opaque identifier assigned by the agent service.
    pub job_id: String,
    /// Current lifecycle state.
    pub status: JobStatus,
    /// Final text produced by the agent, present once completed.
    #[serde(default)]
    pub response: Option<String>,
    /// On-chain transaction references produced while the job ran.
    #[serde(default)]
    pub transactions: Vec<serde_json::Value>,
    /// Rich-content attachments (cards, charts, links).
    #[serde(default)]
    pub rich_data: Vec<serde_json::Value>,
}

impl Job {
    /// Creates a job snapshot with no payload, as returned by a submission.
    #[must_use]
    pub fn new(job_id: impl Into<String>, status: JobStatus) -> Self {
        Self {
            job_id: job_id.into(),
            status,
            response: None,
            transactions: Vec::new(),
            rich_data: Vec::new(),
        }
    }

    /// Shorthand for `self.status.is_terminal()`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn terminal_statuses() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }

    #[test]
    fn status_serializes_lowercase() {
        let encoded = serde_json::to_string(&JobStatus::Processing).unwrap();
        assert_eq!(encoded, "\"processing\"");
        assert_eq!(JobStatus::Completed.to_string(), "completed");
    }

    #[test]
    fn deserializes_minimal_downstream_payload() {
        let job: Job = serde_json::from_value(json!({
            "jobId": "job_1",
            "status": "pending",
        }))
        .unwrap();
        assert_eq!(job, Job::new("job_1", JobStatus::Pending));
        assert!(job.transactions.is_empty());
        assert!(job.rich_data.is_empty());
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let mut job = Job::new("job_9", JobStatus::Completed);
        job.response = Some("done".to_string());
        job.rich_data.push(json!({"type": "link"}));

        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["jobId"], "job_9");
        assert_eq!(value["status"], "completed");
        assert_eq!(value["response"], "done");
        assert_eq!(value["transactions"], json!([]));
        assert_eq!(value["richData"][0]["type"], "link");
    }

    #[test]
    fn unknown_status_is_rejected() {
        let result: Result<Job, _> = serde_json::from_value(json!({
            "jobId": "job_1",
            "status": "exploded",
        }));
        assert!(result.is_err());
    }
}
