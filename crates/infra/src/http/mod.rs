//! HTTP client construction and the authenticated request gateway

mod gateway;

pub use gateway::VenditGateway;

use std::time::Duration;

use tracing::warn;
use vendit_domain::{ConnectorConfig, ConnectorError, Result};

/// Build the shared `reqwest` client from connector configuration.
///
/// Skipping TLS verification is an explicit opt-in for the vendor's staging
/// environment and its self-signed certificates; enabling it is loudly
/// logged.
pub fn build_client(config: &ConnectorConfig) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .no_proxy();

    if let Some(agent) = &config.user_agent {
        builder = builder.user_agent(agent.clone());
    }

    if config.insecure_skip_tls_verify {
        warn!("TLS certificate verification is DISABLED; all connections are insecure");
        builder = builder.danger_accept_invalid_certs(true);
    }

    builder
        .build()
        .map_err(|e| ConnectorError::Internal(format!("failed to build http client: {e}")))
}
