use serde::{Deserialize, Serialize};

use crate::job::{Job, JobStatus};
use crate::poll::PollOverrides;

/// Body of `POST /prompt`.
///
/// `prompt` is optional at the type level so a missing field surfaces as a
/// `VALIDATION_ERROR` from validation rather than as a decode failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_flag: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll: Option<PollOverrides>,
}

/// Job rendered to the caller by `POST /prompt` and `GET /job/{jobId}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResponse {
    pub job_id: String,
    pub status: JobStatus,
    pub response: Option<String>,
    pub transactions: Vec<serde_json::Value>,
    pub rich_data: Vec<serde_json::Value>,
}

impl From<Job> for JobResponse {
    fn from(job: Job) -> Self {
        Self {
            job_id: job.job_id,
            status: job.status,
            response: job.response,
            transactions: job.transactions,
            rich_data: job.rich_data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn prompt_request_tolerates_missing_fields() {
        let request: PromptRequest = serde_json::from_value(json!({})).unwrap();
        assert!(request.prompt.is_none());
        assert!(request.poll.is_none());
    }

    #[test]
    fn prompt_request_reads_camel_case() {
        let request: PromptRequest = serde_json::from_value(json!({
            "prompt": "what's my balance",
            "walletAddress": "0x9431Cf5DA0CE60664661341db650763B08286B18",
            "channelFlag": true,
            "poll": { "maxAttempts": 1, "intervalMs": 1000 },
        }))
        .unwrap();
        assert_eq!(request.prompt.as_deref(), Some("what's my balance"));
        assert_eq!(request.channel_flag, Some(true));
        assert_eq!(request.poll.unwrap().max_attempts, Some(1));
    }

    #[test]
    fn channel_flag_must_be_boolean() {
        let result: Result<PromptRequest, _> = serde_json::from_value(json!({
            "prompt": "hi",
            "channelFlag": "yes",
        }));
        assert!(result.is_err());
    }

    #[test]
    fn job_response_always_carries_lists() {
        let response = JobResponse::from(Job::new("job_1", JobStatus::Pending));
        let value = serde_json::to_value(response).unwrap();
        assert_eq!(
            value,
            json!({
                "jobId": "job_1",
                "status": "pending",
                "response": null,
                "transactions": [],
                "richData": [],
            })
        );
    }
}
