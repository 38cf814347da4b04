//! Job orchestration and payment-gated remediation.
//!
//! 1. **Downstream outcome** (`downstream`): typed failure of a collaborator call
//! 2. **Classification** (`classify`): `DownstreamFailure` -> `ErrorKind`
//! 3. **Polling** (`poll`): submit once, poll until terminal within bounds
//! 4. **Allowance** (`allowance`): read/raise the facilitator allowance
//! 5. **Clients** (`agent_client`, `chain_client`): HTTP and JSON-RPC collaborators

pub mod agent_client;
pub mod allowance;
pub mod chain_client;
pub mod classify;
pub mod config;
pub mod downstream;
pub mod poll;

#[cfg(test)]
pub(crate) mod fakes;

pub use agent_client::HttpAgentClient;
pub use allowance::{AllowanceGate, ApprovalReceipt, Remediation};
pub use chain_client::JsonRpcChainClient;
pub use classify::classify;
pub use config::{AgentClientConfig, ChainConfig, ServiceConfig};
pub use downstream::{DownstreamFailure, DownstreamResult};
pub use poll::PollOrchestrator;
