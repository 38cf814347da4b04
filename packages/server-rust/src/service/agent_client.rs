//! HTTP client for the downstream agent service.
//!
//! Endpoints:
//! - `POST {base}/v1/jobs` -- submit a prompt, returns `{ jobId, status }`
//! - `GET {base}/v1/jobs/{jobId}` -- current job snapshot
//! - `GET {base}/health` -- reachability check

use async_trait::async_trait;
use promptgate_core::allowance::address_hex;
use promptgate_core::{Job, PromptSubmission};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::config::AgentClientConfig;
use super::downstream::{DownstreamFailure, DownstreamResult};
use crate::traits::AgentService;

/// Longest slice of an error body kept in failure messages.
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitJobBody<'a> {
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    wallet_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    use_channel: Option<bool>,
}

/// `AgentService` over HTTP/JSON.
#[derive(Clone)]
pub struct HttpAgentClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpAgentClient {
    /// Build a client; the HTTP timeout comes from `config.request_timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(config: &AgentClientConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("failed to create agent HTTP client: {e}"))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}

#[async_trait]
impl AgentService for HttpAgentClient {
    async fn submit_prompt(&self, submission: &PromptSubmission) -> DownstreamResult<Job> {
        let url = format!("{}/v1/jobs", self.base_url);
        debug!(url = %url, "Submitting prompt to agent service");

        let body = SubmitJobBody {
            prompt: &submission.prompt,
            wallet_address: submission.wallet_address.as_ref().map(address_hex),
            use_channel: submission.use_channel,
        };
        let response = self
            .authorized(self.client.post(&url))
            .json(&body)
            .send()
            .await?;
        read_json(response).await
    }

    async fn get_job(&self, job_id: &str) -> DownstreamResult<Job> {
        let url = format!("{}/v1/jobs/{job_id}", self.base_url);
        let response = self.authorized(self.client.get(&url)).send().await?;
        read_json(response).await
    }

    async fn check_health(&self) -> DownstreamResult<()> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(failure_from(response).await)
        }
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> DownstreamResult<T> {
    if !response.status().is_success() {
        return Err(failure_from(response).await);
    }
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| DownstreamFailure::malformed(e.to_string()))
}

async fn failure_from(response: Response) -> DownstreamFailure {
    let code = response.status().as_u16();
    let mut body = response.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    DownstreamFailure::status(code, body)
}
