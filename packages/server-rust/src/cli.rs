//! Command-line and environment configuration.
//!
//! Every flag can also be set through a `PROMPTGATE_*` environment variable.

use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use promptgate_core::poll::MAX_TIMEOUT_MS;
use promptgate_core::{parse_address, PollConfig};

use crate::network::NetworkConfig;
use crate::service::{AgentClientConfig, ChainConfig, ServiceConfig};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Plain,
    /// One JSON object per line.
    Json,
}

/// Promptgate: synchronous HTTP front for an asynchronous, payment-gated agent service.
#[derive(Parser, Debug)]
#[command(name = "promptgate")]
#[command(version)]
pub struct Args {
    // ---- HTTP server ----
    /// Bind address.
    #[arg(long, env = "PROMPTGATE_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "PROMPTGATE_PORT", default_value_t = 3000)]
    pub port: u16,

    /// Comma-separated allowed origins, `*` for any.
    #[arg(long, env = "PROMPTGATE_CORS_ORIGINS", value_delimiter = ',', default_value = "*")]
    pub cors_origins: Vec<String>,

    /// Outer bound on any single request, in seconds.
    #[arg(long, env = "PROMPTGATE_REQUEST_TIMEOUT_SECS", default_value_t = 310)]
    pub request_timeout_secs: u64,

    /// How long shutdown waits for in-flight requests, in seconds.
    #[arg(long, env = "PROMPTGATE_DRAIN_TIMEOUT_SECS", default_value_t = 30)]
    pub drain_timeout_secs: u64,

    /// Shared secret required in `x-proxy-token` on business routes.
    #[arg(long, env = "PROMPTGATE_PROXY_TOKEN", hide_env_values = true)]
    pub proxy_token: Option<String>,

    // ---- Agent service ----
    #[arg(long, env = "PROMPTGATE_AGENT_URL", default_value = "http://127.0.0.1:4000")]
    pub agent_url: String,

    #[arg(long, env = "PROMPTGATE_AGENT_API_KEY", hide_env_values = true)]
    pub agent_api_key: Option<String>,

    #[arg(long, env = "PROMPTGATE_AGENT_TIMEOUT_SECS", default_value_t = 15)]
    pub agent_timeout_secs: u64,

    // ---- Chain ----
    /// JSON-RPC endpoint for allowance reads.
    #[arg(long, env = "PROMPTGATE_RPC_URL", default_value = "http://127.0.0.1:8545")]
    pub rpc_url: String,

    /// JSON-RPC endpoint that signs and sends approval transactions.
    #[arg(long, env = "PROMPTGATE_SIGNER_URL", default_value = "http://127.0.0.1:8545")]
    pub signer_url: String,

    /// ERC-20 token contract the allowance is granted on.
    #[arg(long, env = "PROMPTGATE_TOKEN_ADDRESS")]
    pub token_address: String,

    /// Gateway wallet that owns the allowance.
    #[arg(long, env = "PROMPTGATE_WALLET_ADDRESS")]
    pub wallet_address: String,

    /// Facilitator that pulls payments.
    #[arg(long, env = "PROMPTGATE_FACILITATOR_ADDRESS")]
    pub facilitator_address: String,

    #[arg(long, env = "PROMPTGATE_CHAIN_TIMEOUT_SECS", default_value_t = 20)]
    pub chain_timeout_secs: u64,

    // ---- Polling defaults ----
    #[arg(long, env = "PROMPTGATE_POLL_INTERVAL_MS", default_value_t = 2_000)]
    pub poll_interval_ms: u64,

    #[arg(long, env = "PROMPTGATE_POLL_MAX_ATTEMPTS", default_value_t = 60)]
    pub poll_max_attempts: u32,

    #[arg(long, env = "PROMPTGATE_POLL_TIMEOUT_MS", default_value_t = 120_000)]
    pub poll_timeout_ms: u64,

    /// Approve the facilitator automatically when a prompt fails with PAYMENT_REQUIRED.
    #[arg(long, env = "PROMPTGATE_REMEDIATE_PAYMENT_REQUIRED")]
    pub remediate_payment_required: bool,

    // ---- Observability ----
    #[arg(long, env = "PROMPTGATE_LOG_FORMAT", value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Port for the Prometheus scrape endpoint. Disabled when unset.
    #[arg(long, env = "PROMPTGATE_METRICS_PORT")]
    pub metrics_port: Option<u16>,
}

/// Fully resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub network: NetworkConfig,
    pub service: ServiceConfig,
    pub log_format: LogFormat,
    pub metrics_port: Option<u16>,
}

impl GatewayConfig {
    /// # Errors
    ///
    /// Returns an error describing the first invalid setting.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.service.validate()?;
        // Per-request poll overrides may run up to the maximum poll timeout.
        if self.network.request_timeout <= Duration::from_millis(MAX_TIMEOUT_MS) {
            anyhow::bail!(
                "request timeout ({}s) must exceed the maximum poll timeout ({MAX_TIMEOUT_MS}ms)",
                self.network.request_timeout.as_secs(),
            );
        }
        Ok(())
    }
}

impl Args {
    /// Resolves raw arguments into a validated [`GatewayConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error for malformed addresses or out-of-range settings.
    pub fn into_config(self) -> anyhow::Result<GatewayConfig> {
        let poll = PollConfig::from_millis(
            self.poll_interval_ms,
            self.poll_max_attempts,
            self.poll_timeout_ms,
        )
        .context("invalid default poll settings")?;

        let chain = ChainConfig {
            rpc_url: self.rpc_url,
            signer_url: self.signer_url,
            token_address: parse_address(&self.token_address, "token address")
                .context("invalid --token-address")?,
            wallet_address: parse_address(&self.wallet_address, "wallet address")
                .context("invalid --wallet-address")?,
            facilitator_address: parse_address(&self.facilitator_address, "facilitator address")
                .context("invalid --facilitator-address")?,
            request_timeout: Duration::from_secs(self.chain_timeout_secs),
        };

        let config = GatewayConfig {
            network: NetworkConfig {
                host: self.host,
                port: self.port,
                cors_origins: self.cors_origins,
                request_timeout: Duration::from_secs(self.request_timeout_secs),
                proxy_token: self.proxy_token.filter(|token| !token.is_empty()),
                drain_timeout: Duration::from_secs(self.drain_timeout_secs),
            },
            service: ServiceConfig {
                agent: AgentClientConfig {
                    base_url: self.agent_url,
                    api_key: self.agent_api_key.filter(|key| !key.is_empty()),
                    request_timeout: Duration::from_secs(self.agent_timeout_secs),
                },
                chain,
                poll,
                remediate_payment_required: self.remediate_payment_required,
            },
            log_format: self.log_format,
            metrics_port: self.metrics_port,
        };
        config.validate()?;
        Ok(config)
    }
}
