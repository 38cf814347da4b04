//! Promptgate server binary.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use promptgate_server::cli::{Args, GatewayConfig, LogFormat};
use promptgate_server::network::NetworkModule;
use promptgate_server::service::{HttpAgentClient, JsonRpcChainClient};
use promptgate_server::traits::{AgentService, AllowanceChain};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Args::parse().into_config()?;
    init_tracing(config.log_format);

    if let Some(port) = config.metrics_port {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("failed to install Prometheus exporter")?;
        info!(%addr, "Prometheus exporter listening");
    }

    run(config).await
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,promptgate_server=info"));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Plain => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

async fn run(config: GatewayConfig) -> anyhow::Result<()> {
    let agent: Arc<dyn AgentService> = Arc::new(HttpAgentClient::new(&config.service.agent)?);
    let chain: Arc<dyn AllowanceChain> = Arc::new(JsonRpcChainClient::new(&config.service.chain)?);

    info!(
        agent = %config.service.agent.base_url,
        facilitator = %config.service.chain.facilitator_address,
        remediation = config.service.remediate_payment_required,
        "Starting promptgate"
    );

    let mut module = NetworkModule::new(config.network, config.service, agent, chain);
    let port = module.start().await?;
    info!(port, "Promptgate ready");

    module.serve(shutdown_signal()).await
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
