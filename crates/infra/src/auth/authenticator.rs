//! Access-token lifecycle management
//!
//! Validity checks, refresh-with-retry against the vendor's token endpoint
//! and auth header construction. Refresh is the only operation in the
//! system with automatic retry-with-backoff: transient failures of the
//! token endpoint are common and expensive to treat as fatal mid-sync.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;
use vendit_common::RetryStrategy;
use vendit_domain::{AccessToken, ConnectorConfig, ConnectorError};

use super::store::TokenStore;

/// Failure kinds of a token refresh.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The token endpoint body was not valid JSON.
    #[error("token response is empty or not valid JSON")]
    EmptyResponse,

    /// The body was JSON but carried no `token` field.
    #[error("invalid token response format")]
    InvalidTokenFormat,

    /// Transport-level failure or non-success status.
    #[error("token refresh failed: {0}")]
    RefreshFailed(String),
}

impl From<AuthError> for ConnectorError {
    fn from(err: AuthError) -> Self {
        Self::Auth(err.to_string())
    }
}

/// Owns the bearer token shared by all stream drivers within a run.
///
/// The token lives behind an async `RwLock`: reads are concurrent, and a
/// refresh takes the write lock so concurrent callers cannot race on the
/// persisted file.
pub struct Authenticator {
    config: Arc<ConnectorConfig>,
    client: reqwest::Client,
    store: TokenStore,
    token: RwLock<Option<AccessToken>>,
    retry: RetryStrategy,
}

impl Authenticator {
    /// Create an authenticator, loading any previously persisted token so a
    /// restarted process can resume without re-authenticating.
    #[must_use]
    pub fn new(config: Arc<ConnectorConfig>, client: reqwest::Client, store: TokenStore) -> Self {
        let stored = store.read();
        let token = stored
            .token
            .map(|token| AccessToken::from_unix_ms(token, stored.token_expire.unwrap_or(0)));
        if token.is_some() {
            info!("loaded persisted token");
        }

        Self {
            config,
            client,
            store,
            token: RwLock::new(token),
            retry: RetryStrategy::new()
                .with_max_attempts(5)
                .with_base_delay(Duration::from_millis(500))
                .with_max_delay(Duration::from_secs(30)),
        }
    }

    /// Replace the retry strategy; used by tests to avoid real backoff.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryStrategy) -> Self {
        self.retry = retry;
        self
    }

    /// Whether the current token exists and stays outside the 2-minute
    /// expiry safety margin.
    pub async fn is_valid(&self) -> bool {
        self.token.read().await.as_ref().is_some_and(AccessToken::is_valid)
    }

    /// Build the auth headers, refreshing the token first when it is
    /// missing or about to expire.
    ///
    /// This is an explicit method rather than a field accessor: it can
    /// block on network I/O and fail, and callers must be able to see
    /// that.
    pub async fn headers(&self) -> Result<HeaderMap, AuthError> {
        if !self.is_valid().await {
            self.refresh().await?;
        }

        let guard = self.token.read().await;
        let token = guard
            .as_ref()
            .ok_or_else(|| AuthError::RefreshFailed("no token after refresh".to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            "Token",
            HeaderValue::from_str(&token.token)
                .map_err(|e| AuthError::RefreshFailed(format!("token is not a valid header: {e}")))?,
        );
        headers.insert(
            "ApiKey",
            HeaderValue::from_str(&self.config.vendit_api_key).map_err(|e| {
                AuthError::RefreshFailed(format!("api key is not a valid header: {e}"))
            })?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// Acquire a fresh token, retrying transient failures with exponential
    /// backoff (5 attempts, factor 2) before surfacing the error.
    pub async fn refresh(&self) -> Result<(), AuthError> {
        self.retry.execute("token_refresh", || self.refresh_once()).await
    }

    async fn refresh_once(&self) -> Result<(), AuthError> {
        // Credentials go in query parameters, per the vendor contract.
        let response = self
            .client
            .post(&self.config.auth_url)
            .query(&[
                ("apiKey", self.config.vendit_api_key.as_str()),
                ("username", self.config.username.as_str()),
                ("password", self.config.password.as_str()),
            ])
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| AuthError::RefreshFailed(e.to_string()))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| AuthError::RefreshFailed(e.to_string()))?;
        if !status.is_success() {
            return Err(AuthError::RefreshFailed(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        let data: Value = serde_json::from_str(&body).map_err(|_| AuthError::EmptyResponse)?;
        let token_value = data
            .get("token")
            .and_then(Value::as_str)
            .ok_or(AuthError::InvalidTokenFormat)?;
        let expire_ms = data.get("expire").and_then(Value::as_i64).unwrap_or(0);

        let token = AccessToken::from_unix_ms(token_value.to_string(), expire_ms);
        let expire_persisted = token.expire_unix_ms();
        *self.token.write().await = Some(token);

        // Persist for the next process; a failed write is non-fatal.
        self.store.write(token_value, expire_persisted);
        info!("successfully obtained new token");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for the authenticator.
    use std::time::Duration;

    use serde_json::json;
    use tempfile::tempdir;
    use vendit_common::time::now_unix_ms;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn fast_retry(attempts: u32) -> RetryStrategy {
        RetryStrategy::new()
            .with_max_attempts(attempts)
            .with_base_delay(Duration::from_millis(1))
            .with_jitter_factor(0.0)
    }

    fn test_config(auth_url: String, secrets: &std::path::Path) -> Arc<ConnectorConfig> {
        let mut config =
            ConnectorConfig::with_credentials("https://api.test", "user", "pw", "key-123");
        config.auth_url = auth_url;
        config.secrets_path = secrets.to_path_buf();
        Arc::new(config)
    }

    fn authenticator(config: Arc<ConnectorConfig>) -> Authenticator {
        let store = TokenStore::new(&config.secrets_path);
        Authenticator::new(config, reqwest::Client::new(), store).with_retry(fast_retry(5))
    }

    #[tokio::test]
    async fn test_refresh_sends_credentials_as_query_params() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/Api/GetToken"))
            .and(query_param("apiKey", "key-123"))
            .and(query_param("username", "user"))
            .and(query_param("password", "pw"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token": "fresh-token",
                "expire": now_unix_ms() + 3_600_000,
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let config =
            test_config(format!("{}/Api/GetToken", server.uri()), &dir.path().join("s.json"));
        let auth = authenticator(config);

        assert!(!auth.is_valid().await);
        auth.refresh().await.unwrap();
        assert!(auth.is_valid().await);

        let headers = auth.headers().await.unwrap();
        assert_eq!(headers.get("Token").unwrap(), "fresh-token");
        assert_eq!(headers.get("ApiKey").unwrap(), "key-123");
        assert_eq!(headers.get("Content-Type").unwrap(), "application/json");
    }

    /// A successful refresh persists exactly the new token and expiry,
    /// merged with pre-existing unrelated keys.
    #[tokio::test]
    async fn test_refresh_persists_token_merging_existing_keys() {
        let server = MockServer::start().await;
        let expire = now_unix_ms() + 3_600_000;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token": "persisted-token",
                "expire": expire,
            })))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let secrets = dir.path().join("secrets.json");
        std::fs::write(&secrets, r#"{"username": "u", "custom": 42}"#).unwrap();

        let auth = authenticator(test_config(server.uri(), &secrets));
        auth.refresh().await.unwrap();

        let contents: Value =
            serde_json::from_str(&std::fs::read_to_string(&secrets).unwrap()).unwrap();
        assert_eq!(contents["token"], "persisted-token");
        assert_eq!(contents["token_expire"], expire);
        assert_eq!(contents["username"], "u");
        assert_eq!(contents["custom"], 42);
    }

    #[tokio::test]
    async fn test_refresh_retries_transient_failures() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token": "after-retries",
                "expire": now_unix_ms() + 3_600_000,
            })))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let auth = authenticator(test_config(server.uri(), &dir.path().join("s.json")));

        auth.refresh().await.unwrap();
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_refresh_empty_body_surfaces_after_retries() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string(""))
            .expect(2)
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let config = test_config(server.uri(), &dir.path().join("s.json"));
        let store = TokenStore::new(&config.secrets_path);
        let auth = Authenticator::new(config, reqwest::Client::new(), store)
            .with_retry(fast_retry(2));

        let err = auth.refresh().await.unwrap_err();
        assert!(matches!(err, AuthError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_refresh_missing_token_field_is_invalid_format() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "expire": 123 })),
            )
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let config = test_config(server.uri(), &dir.path().join("s.json"));
        let store = TokenStore::new(&config.secrets_path);
        let auth = Authenticator::new(config, reqwest::Client::new(), store)
            .with_retry(fast_retry(2));

        let err = auth.refresh().await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidTokenFormat));
    }

    /// A still-valid persisted token is picked up at construction, so no
    /// network round trip happens before the first request.
    #[tokio::test]
    async fn test_persisted_token_loaded_on_startup() {
        let dir = tempdir().unwrap();
        let secrets = dir.path().join("secrets.json");
        let expire = now_unix_ms() + 3_600_000;
        std::fs::write(
            &secrets,
            serde_json::to_string(&json!({ "token": "persisted", "token_expire": expire }))
                .unwrap(),
        )
        .unwrap();

        let auth = authenticator(test_config("http://unused.test".to_string(), &secrets));
        assert!(auth.is_valid().await);

        let headers = auth.headers().await.unwrap();
        assert_eq!(headers.get("Token").unwrap(), "persisted");
    }

    #[tokio::test]
    async fn test_expired_persisted_token_is_invalid() {
        let dir = tempdir().unwrap();
        let secrets = dir.path().join("secrets.json");
        std::fs::write(
            &secrets,
            serde_json::to_string(
                &json!({ "token": "stale", "token_expire": now_unix_ms() - 1000 }),
            )
            .unwrap(),
        )
        .unwrap();

        let auth = authenticator(test_config("http://unused.test".to_string(), &secrets));
        assert!(!auth.is_valid().await);
    }
}
