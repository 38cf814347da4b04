//! Network module with deferred startup lifecycle.
//!
//! `new()` wires the collaborators into shared state, `start()` binds the TCP
//! listener, and `serve()` accepts connections until the shutdown signal.
//! The split lets the binary report the bound port before serving.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::middleware::{from_fn_with_state, map_response};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::config::NetworkConfig;
use super::handlers::{
    allowance_handler, approve_handler, health_handler, job_handler, liveness_handler,
    not_found_handler, prompt_handler, readiness_handler, AppState,
};
use super::middleware::{
    build_http_layers, envelope_bare_timeout, require_proxy_token, track_in_flight,
};
use super::shutdown::ShutdownController;
use crate::service::ServiceConfig;
use crate::traits::{AgentService, AllowanceChain};

/// Assembles the axum router.
///
/// Routes:
/// - `POST /prompt` -- submit and wait for a job
/// - `GET /job/{job_id}` -- single status snapshot
/// - `GET /allowance` -- current facilitator allowance
/// - `POST /approve` -- submit an approval transaction
/// - `GET /health`, `/health/live`, `/health/ready` -- health checks, never token-gated
pub fn build_router(state: AppState) -> Router {
    let business = Router::new()
        .route("/prompt", post(prompt_handler))
        .route("/job/{job_id}", get(job_handler))
        .route("/allowance", get(allowance_handler))
        .route("/approve", post(approve_handler))
        .route_layer(from_fn_with_state(state.clone(), track_in_flight))
        .route_layer(from_fn_with_state(state.clone(), require_proxy_token));

    let layers = build_http_layers(&state.network);

    Router::new()
        .route("/health", get(health_handler))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler))
        .merge(business)
        .fallback(not_found_handler)
        .layer(layers)
        .layer(map_response(envelope_bare_timeout))
        .with_state(state)
}

/// Manages the HTTP server lifecycle.
pub struct NetworkModule {
    config: NetworkConfig,
    listener: Option<TcpListener>,
    state: AppState,
}

impl NetworkModule {
    /// Creates the module and its shared state without binding any port.
    #[must_use]
    pub fn new(
        config: NetworkConfig,
        service: ServiceConfig,
        agent: Arc<dyn AgentService>,
        chain: Arc<dyn AllowanceChain>,
    ) -> Self {
        let shutdown = Arc::new(ShutdownController::new());
        let state = AppState::new(agent, chain, service, config.clone(), shutdown);
        Self {
            config,
            listener: None,
            state,
        }
    }

    /// Shared shutdown controller, for health inspection from outside the server.
    #[must_use]
    pub fn shutdown_controller(&self) -> Arc<ShutdownController> {
        Arc::clone(&self.state.shutdown)
    }

    #[must_use]
    pub fn build_router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Binds the TCP listener and returns the bound port.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound (e.g., port in use).
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        let port = listener.local_addr()?.port();

        info!("TCP listener bound to {}:{}", self.config.host, port);

        self.listener = Some(listener);
        Ok(port)
    }

    /// Serves connections until `shutdown` resolves, then drains.
    ///
    /// After the signal the health state moves to Draining and the listener
    /// stops accepting. In-flight requests get `drain_timeout` to finish;
    /// any still running after that are dropped, which cancels their poll
    /// loops.
    ///
    /// # Errors
    ///
    /// Returns an error if `start()` was not called or the server hits a
    /// fatal I/O error.
    pub async fn serve(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let listener = self
            .listener
            .ok_or_else(|| anyhow::anyhow!("start() must be called before serve()"))?;
        let controller = Arc::clone(&self.state.shutdown);
        let router = build_router(self.state);
        let drain_timeout = self.config.drain_timeout;

        let signalled = CancellationToken::new();
        let on_signal = {
            let signalled = signalled.clone();
            let controller = Arc::clone(&controller);
            async move {
                shutdown.await;
                info!("Shutdown signal received, draining");
                controller.trigger_shutdown();
                signalled.cancel();
            }
        };

        controller.set_ready();
        info!("Serving HTTP connections");

        let server = axum::serve(listener, router).with_graceful_shutdown(on_signal);
        let server = async move { server.await };
        tokio::pin!(server);

        tokio::select! {
            result = &mut server => {
                result?;
                finish_drain(&controller, drain_timeout).await;
            }
            () = drain_deadline(&signalled, drain_timeout) => {
                warn!(
                    in_flight = controller.in_flight_count(),
                    "Drain timeout expired with in-flight requests remaining"
                );
            }
        }
        Ok(())
    }
}

/// Resolves `drain_timeout` after the shutdown signal.
async fn drain_deadline(signalled: &CancellationToken, drain_timeout: Duration) {
    signalled.cancelled().await;
    tokio::time::sleep(drain_timeout).await;
}

async fn finish_drain(controller: &ShutdownController, drain_timeout: Duration) {
    if controller.wait_for_drain(drain_timeout).await {
        info!("All requests drained");
    } else {
        warn!("Drain timeout expired with in-flight requests remaining");
    }
}
