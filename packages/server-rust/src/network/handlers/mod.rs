//! HTTP handlers and the shared state they extract.

pub mod allowance;
pub mod health;
pub mod job;
pub mod prompt;

pub use allowance::{allowance_handler, approve_handler};
pub use health::{health_handler, liveness_handler, readiness_handler};
pub use job::job_handler;
pub use prompt::prompt_handler;

use std::sync::Arc;
use std::time::Instant;

use promptgate_core::{ErrorKind, GatewayError};

use super::error::ApiError;
use super::{NetworkConfig, ShutdownController};
use crate::service::{AllowanceGate, PollOrchestrator, ServiceConfig};
use crate::traits::{AgentService, AllowanceChain};

/// Shared application state passed to all axum handlers via `State` extraction.
///
/// Holds `Arc` references so cloning per request is cheap.
#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<dyn AgentService>,
    pub orchestrator: Arc<PollOrchestrator>,
    pub allowance: Arc<AllowanceGate>,
    /// Poll defaults and the payment-remediation switch.
    pub service: Arc<ServiceConfig>,
    pub network: Arc<NetworkConfig>,
    pub shutdown: Arc<ShutdownController>,
    /// Server process start time, used for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    #[must_use]
    pub fn new(
        agent: Arc<dyn AgentService>,
        chain: Arc<dyn AllowanceChain>,
        service: ServiceConfig,
        network: NetworkConfig,
        shutdown: Arc<ShutdownController>,
    ) -> Self {
        Self {
            orchestrator: Arc::new(PollOrchestrator::new(Arc::clone(&agent))),
            allowance: Arc::new(AllowanceGate::new(chain, &service.chain)),
            agent,
            service: Arc::new(service),
            network: Arc::new(network),
            shutdown,
            start_time: Instant::now(),
        }
    }
}

/// Fallback for unknown routes, rendered in the common error shape.
pub async fn not_found_handler() -> ApiError {
    ApiError(GatewayError::new(ErrorKind::NotFound, "no such route"))
}
