//! Network configuration types for the gateway.

use std::time::Duration;

/// Top-level network configuration for the server.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Bind address for the server.
    pub host: String,
    /// Port to listen on. 0 means OS-assigned.
    pub port: u16,
    /// Allowed CORS origins.
    pub cors_origins: Vec<String>,
    /// Outer bound on any single HTTP request. Kept above the largest poll
    /// timeout a caller may request so the poll loop reports its own TIMEOUT.
    pub request_timeout: Duration,
    /// Shared secret expected in `x-proxy-token`. `None` disables the check.
    pub proxy_token: Option<String>,
    /// How long shutdown waits for in-flight requests.
    pub drain_timeout: Duration,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            request_timeout: Duration::from_secs(310),
            proxy_token: None,
            drain_timeout: Duration::from_secs(30),
        }
    }
}
