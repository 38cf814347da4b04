//! On-chain allowance gate.
//!
//! Reads and raises the ERC-20 allowance from the gateway wallet to the
//! facilitator. Used proactively by `POST /approve` and reactively after a
//! `PAYMENT_REQUIRED` failure. Nothing is cached: every read goes to chain.
//! Approvals are submitted once with no internal retry and are not awaited.

use std::sync::Arc;

use alloy_primitives::{Address, B256, U256};
use promptgate_core::{AllowanceState, GatewayError, GatewayResult, MAX_APPROVAL};
use tracing::{info, warn};

use super::config::ChainConfig;
use crate::traits::AllowanceChain;

/// A submitted (not yet confirmed) approval transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApprovalReceipt {
    pub transaction_hash: B256,
    pub facilitator: Address,
    pub amount: U256,
}

/// Outcome of [`AllowanceGate::remediate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remediation {
    /// The allowance is still above the top-up threshold; nothing was submitted.
    AlreadyApproved { allowance: U256 },
    /// The allowance had run low and a max approval was submitted.
    Approved {
        previous: U256,
        receipt: ApprovalReceipt,
    },
}

pub struct AllowanceGate {
    chain: Arc<dyn AllowanceChain>,
    token: Address,
    owner: Address,
    facilitator: Address,
}

impl AllowanceGate {
    #[must_use]
    pub fn new(chain: Arc<dyn AllowanceChain>, config: &ChainConfig) -> Self {
        Self {
            chain,
            token: config.token_address,
            owner: config.wallet_address,
            facilitator: config.facilitator_address,
        }
    }

    /// The fixed facilitator address payments are pulled by.
    #[must_use]
    pub fn facilitator(&self) -> Address {
        self.facilitator
    }

    /// The gateway wallet that grants the allowance.
    #[must_use]
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Read the allowance `owner` has granted to `facilitator`.
    ///
    /// # Errors
    ///
    /// Returns the classified chain failure.
    pub async fn check_allowance(&self, owner: Address, facilitator: Address) -> GatewayResult<U256> {
        self.chain
            .allowance(self.token, owner, facilitator)
            .await
            .map_err(GatewayError::from)
    }

    /// Current allowance of the gateway wallet towards the configured facilitator.
    ///
    /// # Errors
    ///
    /// Returns the classified chain failure.
    pub async fn state(&self) -> GatewayResult<AllowanceState> {
        let current = self.check_allowance(self.owner, self.facilitator).await?;
        Ok(AllowanceState {
            facilitator: self.facilitator,
            current,
            requested: MAX_APPROVAL,
        })
    }

    /// Submit an approval for `facilitator`; `amount` defaults to `uint256` max.
    ///
    /// Every call submits a new transaction and pays fees. Callers are
    /// responsible for not calling redundantly.
    ///
    /// # Errors
    ///
    /// Returns the classified chain failure. Not retried.
    pub async fn approve(
        &self,
        facilitator: Address,
        amount: Option<U256>,
    ) -> GatewayResult<ApprovalReceipt> {
        let amount = amount.unwrap_or(MAX_APPROVAL);
        let result = self
            .chain
            .send_approval(self.token, self.owner, facilitator, amount)
            .await;

        match result {
            Ok(transaction_hash) => {
                metrics::counter!("promptgate_approvals_total", "outcome" => "submitted").increment(1);
                info!(
                    facilitator = %facilitator,
                    amount = %amount,
                    tx = %transaction_hash,
                    "Approval transaction submitted"
                );
                Ok(ApprovalReceipt {
                    transaction_hash,
                    facilitator,
                    amount,
                })
            }
            Err(failure) => {
                metrics::counter!("promptgate_approvals_total", "outcome" => "failed").increment(1);
                warn!(facilitator = %facilitator, error = %failure, "Approval submission failed");
                Err(failure.into())
            }
        }
    }

    /// Reactive remediation after a `PAYMENT_REQUIRED` failure.
    ///
    /// Submits a max approval when the current allowance has fallen below
    /// half of the maximum; a larger allowance is reported and left alone.
    ///
    /// # Errors
    ///
    /// Returns the classified failure of the allowance read or the approval.
    pub async fn remediate(&self) -> GatewayResult<Remediation> {
        let state = self.state().await?;
        if !state.needs_top_up() {
            info!(allowance = %state.current, "Allowance already granted, skipping approval");
            return Ok(Remediation::AlreadyApproved {
                allowance: state.current,
            });
        }
        let receipt = self.approve(self.facilitator, None).await?;
        Ok(Remediation::Approved {
            previous: state.current,
            receipt,
        })
    }
}

#[cfg(test)]
mod tests {
    use promptgate_core::ErrorKind;

    use super::*;
    use crate::service::downstream::DownstreamFailure;
    use crate::service::fakes::FakeChain;

    fn config() -> ChainConfig {
        ChainConfig {
            token_address: Address::repeat_byte(0x11),
            wallet_address: Address::repeat_byte(0x22),
            facilitator_address: Address::repeat_byte(0x33),
            ..ChainConfig::default()
        }
    }

    #[tokio::test]
    async fn approve_defaults_to_max() {
        let chain = Arc::new(FakeChain::with_allowance(U256::ZERO));
        let gate = AllowanceGate::new(chain.clone(), &config());

        let receipt = gate.approve(gate.facilitator(), None).await.unwrap();

        assert_eq!(receipt.amount, U256::MAX);
        let approvals = chain.approvals();
        assert_eq!(approvals.len(), 1);
        assert_eq!(approvals[0].amount, U256::MAX);
        assert_eq!(approvals[0].spender, Address::repeat_byte(0x33));
        assert_eq!(approvals[0].owner, Address::repeat_byte(0x22));
        assert_eq!(approvals[0].token, Address::repeat_byte(0x11));
    }

    #[tokio::test]
    async fn approve_uses_explicit_amount() {
        let chain = Arc::new(FakeChain::with_allowance(U256::ZERO));
        let gate = AllowanceGate::new(chain.clone(), &config());

        let receipt = gate
            .approve(gate.facilitator(), Some(U256::from(5_000u64)))
            .await
            .unwrap();
        assert_eq!(receipt.amount, U256::from(5_000u64));
    }

    #[tokio::test]
    async fn repeated_approvals_each_submit() {
        let chain = Arc::new(FakeChain::with_allowance(U256::ZERO));
        let gate = AllowanceGate::new(chain.clone(), &config());

        gate.approve(gate.facilitator(), None).await.unwrap();
        gate.approve(gate.facilitator(), None).await.unwrap();
        assert_eq!(chain.approvals().len(), 2);
    }

    #[tokio::test]
    async fn approval_failure_is_classified_and_not_retried() {
        let chain = Arc::new(
            FakeChain::with_allowance(U256::ZERO).failing_approvals(DownstreamFailure::Rpc {
                code: -32000,
                message: "insufficient funds for gas".to_string(),
            }),
        );
        let gate = AllowanceGate::new(chain.clone(), &config());

        let err = gate.approve(gate.facilitator(), None).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Internal);
        assert_eq!(chain.approvals().len(), 1);
    }

    #[tokio::test]
    async fn state_reads_chain() {
        let chain = Arc::new(FakeChain::with_allowance(U256::from(42u64)));
        let gate = AllowanceGate::new(chain, &config());

        let state = gate.state().await.unwrap();
        assert_eq!(state.current, U256::from(42u64));
        assert_eq!(state.facilitator, Address::repeat_byte(0x33));
        assert_eq!(state.requested, MAX_APPROVAL);
    }

    #[tokio::test]
    async fn remediate_approves_zero_allowance() {
        let chain = Arc::new(FakeChain::with_allowance(U256::ZERO));
        let gate = AllowanceGate::new(chain.clone(), &config());
        let outcome = gate.remediate().await.unwrap();
        assert!(matches!(outcome, Remediation::Approved { previous, .. } if previous.is_zero()));
        assert_eq!(chain.approvals().len(), 1);
    }

    #[tokio::test]
    async fn remediate_tops_up_small_allowance() {
        let chain = Arc::new(FakeChain::with_allowance(U256::from(1u64)));
        let gate = AllowanceGate::new(chain.clone(), &config());
        let outcome = gate.remediate().await.unwrap();
        assert!(matches!(
            outcome,
            Remediation::Approved { previous, receipt }
                if previous == U256::from(1u64) && receipt.amount == MAX_APPROVAL
        ));
        assert_eq!(chain.approvals().len(), 1);
    }

    #[tokio::test]
    async fn remediate_leaves_max_allowance_alone() {
        let chain = Arc::new(FakeChain::with_allowance(MAX_APPROVAL));
        let gate = AllowanceGate::new(chain.clone(), &config());
        let outcome = gate.remediate().await.unwrap();
        assert_eq!(
            outcome,
            Remediation::AlreadyApproved {
                allowance: MAX_APPROVAL
            }
        );
        assert!(chain.approvals().is_empty());
    }

    #[tokio::test]
    async fn remediate_surfaces_read_failures() {
        let chain = Arc::new(
            FakeChain::with_allowance(U256::ZERO)
                .failing_reads(DownstreamFailure::status(504, "gateway timeout")),
        );
        let gate = AllowanceGate::new(chain.clone(), &config());
        let err = gate.remediate().await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Timeout);
        assert!(chain.approvals().is_empty());
    }
}
