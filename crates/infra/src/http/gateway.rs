//! Authenticated request gateway
//!
//! Wraps the HTTP client with auth-header injection and a
//! single-retry-on-401 policy. Any other non-2xx status is handed back to
//! the caller, which decides whether that status is fatal to its loop.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, warn};
use vendit_core::ports::{ApiResponse, RequestGateway};
use vendit_domain::{ConnectorError, Result};

use crate::auth::Authenticator;

/// HTTP gateway for the Vendit API.
pub struct VenditGateway {
    client: reqwest::Client,
    auth: Arc<Authenticator>,
}

impl VenditGateway {
    /// Create a gateway sharing `client` and `auth` with the rest of the
    /// run.
    #[must_use]
    pub fn new(client: reqwest::Client, auth: Arc<Authenticator>) -> Self {
        Self { client, auth }
    }

    async fn send(&self, method: Method, url: &str, body: Option<&Value>) -> Result<ApiResponse> {
        // headers() refreshes first when the token is missing or inside
        // the expiry margin.
        let headers = self.auth.headers().await?;
        let response = self.execute(method.clone(), url, body, headers).await?;

        if response.status == 401 {
            warn!(%url, "401 unauthorized received, refreshing token and retrying request");
            self.auth.refresh().await?;
            let headers = self.auth.headers().await?;
            // Exactly one retry; a repeated 401 goes back to the caller.
            return self.execute(method, url, body, headers).await;
        }

        Ok(response)
    }

    async fn execute(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        headers: HeaderMap,
    ) -> Result<ApiResponse> {
        let mut request = self.client.request(method.clone(), url).headers(headers);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ConnectorError::Network(format!("http request failed: {e}")))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ConnectorError::Network(format!("failed to read response body: {e}")))?;
        debug!(%method, %url, status, "received http response");

        Ok(ApiResponse { status, body })
    }
}

#[async_trait]
impl RequestGateway for VenditGateway {
    async fn get(&self, url: &str) -> Result<ApiResponse> {
        self.send(Method::GET, url, None).await
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<ApiResponse> {
        self.send(Method::POST, url, Some(body)).await
    }
}
