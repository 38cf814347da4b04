use std::time::Duration;

use alloy_primitives::Address;
use promptgate_core::PollConfig;

/// Gateway-level configuration for the orchestration services.
#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    /// Downstream agent service connection.
    pub agent: AgentClientConfig,
    /// Chain access for allowance reads and approvals.
    pub chain: ChainConfig,
    /// Poll bounds applied when a request carries no overrides.
    pub poll: PollConfig,
    /// Run allowance remediation when a prompt fails with `PAYMENT_REQUIRED`.
    pub remediate_payment_required: bool,
}

impl ServiceConfig {
    /// Startup validation of values that would otherwise fail on every request.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid setting.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.poll
            .validate()
            .map_err(|e| anyhow::anyhow!("invalid default poll settings: {}", e.message))?;
        if self.agent.base_url.trim().is_empty() {
            anyhow::bail!("agent base URL must be set");
        }
        for (name, address) in [
            ("token address", self.chain.token_address),
            ("wallet address", self.chain.wallet_address),
            ("facilitator address", self.chain.facilitator_address),
        ] {
            if address.is_zero() {
                anyhow::bail!("{name} must be set to a non-zero address");
            }
        }
        Ok(())
    }
}

/// Connection settings for the downstream agent service.
#[derive(Debug, Clone)]
pub struct AgentClientConfig {
    /// Base URL, without a trailing slash.
    pub base_url: String,
    /// Bearer token presented to the agent service.
    pub api_key: Option<String>,
    /// Per-call HTTP timeout.
    pub request_timeout: Duration,
}

impl Default for AgentClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:4000".to_string(),
            api_key: None,
            request_timeout: Duration::from_secs(15),
        }
    }
}

/// Chain access settings.
///
/// Reads go to `rpc_url`; approvals go to `signer_url`, a JSON-RPC endpoint
/// that holds the wallet key and accepts `eth_sendTransaction`.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    pub rpc_url: String,
    pub signer_url: String,
    /// ERC-20 token the allowance is granted on.
    pub token_address: Address,
    /// Gateway wallet granting the allowance.
    pub wallet_address: Address,
    /// Fixed facilitator address payments are pulled by.
    pub facilitator_address: Address,
    pub request_timeout: Duration,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8545".to_string(),
            signer_url: "http://127.0.0.1:8545".to_string(),
            token_address: Address::ZERO,
            wallet_address: Address::ZERO,
            facilitator_address: Address::ZERO,
            request_timeout: Duration::from_secs(20),
        }
    }
}
