use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use promptgate_core::{Job, PromptSubmission};

use crate::service::downstream::DownstreamResult;

/// The asynchronous agent service that executes prompts as jobs.
/// Implementations: HTTP (`HttpAgentClient`), in-memory fakes (tests).
#[async_trait]
pub trait AgentService: Send + Sync {
    /// Submit a prompt; returns the new job's identifier and initial status.
    async fn submit_prompt(&self, submission: &PromptSubmission) -> DownstreamResult<Job>;

    /// Fetch the current snapshot of a job, including its result once terminal.
    async fn get_job(&self, job_id: &str) -> DownstreamResult<Job>;

    /// Cheap reachability check used by the health endpoint.
    async fn check_health(&self) -> DownstreamResult<()>;
}

/// ERC-20 allowance reads and approval submission.
/// Implementations: JSON-RPC (`JsonRpcChainClient`), in-memory fakes (tests).
///
/// Signing and nonce sequencing belong to the implementation's signer; callers
/// only see the submitted transaction hash.
#[async_trait]
pub trait AllowanceChain: Send + Sync {
    /// Read `allowance(owner, spender)` on `token`.
    async fn allowance(&self, token: Address, owner: Address, spender: Address)
        -> DownstreamResult<U256>;

    /// Submit `approve(spender, amount)` on `token` from `owner`. Does not wait
    /// for confirmation.
    async fn send_approval(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> DownstreamResult<B256>;
}
