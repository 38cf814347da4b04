//! In-memory collaborators for tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use parking_lot::Mutex;
use promptgate_core::{Job, JobStatus, PromptSubmission};

use super::downstream::{DownstreamFailure, DownstreamResult};
use crate::traits::{AgentService, AllowanceChain};

pub fn job(job_id: &str, status: JobStatus) -> Job {
    Job::new(job_id, status)
}

pub fn completed(job_id: &str, response: &str) -> Job {
    let mut job = Job::new(job_id, JobStatus::Completed);
    job.response = Some(response.to_string());
    job
}

/// Agent whose submission and status answers are scripted up front.
///
/// Status answers are consumed in order; the last one repeats forever.
pub struct ScriptedAgent {
    submit: DownstreamResult<Job>,
    statuses: Mutex<VecDeque<DownstreamResult<Job>>>,
    status_delay: Duration,
    health: DownstreamResult<()>,
    submit_calls: AtomicU32,
    status_calls: AtomicU32,
    submissions: Mutex<Vec<PromptSubmission>>,
}

impl ScriptedAgent {
    pub fn new(submit: DownstreamResult<Job>) -> Self {
        Self {
            submit,
            statuses: Mutex::new(VecDeque::new()),
            status_delay: Duration::ZERO,
            health: Ok(()),
            submit_calls: AtomicU32::new(0),
            status_calls: AtomicU32::new(0),
            submissions: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn then(self, status: DownstreamResult<Job>) -> Self {
        self.statuses.lock().push_back(status);
        self
    }

    #[must_use]
    pub fn with_status_delay(mut self, delay: Duration) -> Self {
        self.status_delay = delay;
        self
    }

    #[must_use]
    pub fn with_health(mut self, health: DownstreamResult<()>) -> Self {
        self.health = health;
        self
    }

    pub fn submit_calls(&self) -> u32 {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> u32 {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn last_submission(&self) -> Option<PromptSubmission> {
        self.submissions.lock().last().cloned()
    }
}

#[async_trait]
impl AgentService for ScriptedAgent {
    async fn submit_prompt(&self, submission: &PromptSubmission) -> DownstreamResult<Job> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.submissions.lock().push(submission.clone());
        self.submit.clone()
    }

    async fn get_job(&self, job_id: &str) -> DownstreamResult<Job> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if !self.status_delay.is_zero() {
            tokio::time::sleep(self.status_delay).await;
        }
        let next = {
            let mut statuses = self.statuses.lock();
            if statuses.len() > 1 {
                statuses.pop_front()
            } else {
                statuses.front().cloned()
            }
        };
        next.unwrap_or_else(|| Err(DownstreamFailure::status(404, format!("unknown job {job_id}"))))
    }

    async fn check_health(&self) -> DownstreamResult<()> {
        self.health.clone()
    }
}

/// One recorded `send_approval` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedApproval {
    pub token: Address,
    pub owner: Address,
    pub spender: Address,
    pub amount: U256,
}

/// Chain that answers allowance reads from memory and records approvals.
pub struct FakeChain {
    allowance: Mutex<DownstreamResult<U256>>,
    approval: Mutex<DownstreamResult<B256>>,
    approvals: Mutex<Vec<RecordedApproval>>,
}

impl FakeChain {
    pub fn with_allowance(allowance: U256) -> Self {
        Self {
            allowance: Mutex::new(Ok(allowance)),
            approval: Mutex::new(Ok(B256::repeat_byte(0xab))),
            approvals: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn failing_reads(self, failure: DownstreamFailure) -> Self {
        *self.allowance.lock() = Err(failure);
        self
    }

    #[must_use]
    pub fn failing_approvals(self, failure: DownstreamFailure) -> Self {
        *self.approval.lock() = Err(failure);
        self
    }

    pub fn approvals(&self) -> Vec<RecordedApproval> {
        self.approvals.lock().clone()
    }
}

#[async_trait]
impl AllowanceChain for FakeChain {
    async fn allowance(
        &self,
        _token: Address,
        _owner: Address,
        _spender: Address,
    ) -> DownstreamResult<U256> {
        self.allowance.lock().clone()
    }

    async fn send_approval(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> DownstreamResult<B256> {
        self.approvals.lock().push(RecordedApproval {
            token,
            owner,
            spender,
            amount,
        });
        self.approval.lock().clone()
    }
}
