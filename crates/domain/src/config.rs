//! Connector configuration
//!
//! Immutable for the process lifetime; built once at startup and passed to
//! collaborators by `Arc` rather than through shared mutable state.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

fn default_api_url() -> String {
    "https://api.staging.vendit.online".to_string()
}

fn default_auth_url() -> String {
    "https://oauth.staging.vendit.online/Api/GetToken".to_string()
}

fn default_secrets_path() -> PathBuf {
    PathBuf::from("secrets.json")
}

fn default_state_path() -> PathBuf {
    PathBuf::from("state.json")
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Connector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorConfig {
    /// Base URL of the Vendit public API.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Token endpoint URL.
    #[serde(default = "default_auth_url")]
    pub auth_url: String,

    /// API user name.
    pub username: String,

    /// API password.
    #[serde(skip_serializing)]
    pub password: String,

    /// Vendit API key, sent both to the token endpoint and with every
    /// data request.
    #[serde(skip_serializing)]
    pub vendit_api_key: String,

    /// Earliest record timestamp to sync (ISO-8601) when no bookmark exists.
    #[serde(default)]
    pub start_date: Option<String>,

    /// Latest record timestamp to sync; only the purchase-orders window
    /// requires it.
    #[serde(default)]
    pub end_date: Option<String>,

    /// JSON file where the bearer token and its expiry are persisted.
    #[serde(default = "default_secrets_path")]
    pub secrets_path: PathBuf,

    /// JSON file where per-stream bookmarks are persisted.
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Skip TLS certificate verification. Insecure; intended only for the
    /// vendor's staging environment with self-signed certificates. Enabling
    /// it logs a warning at client construction.
    #[serde(default)]
    pub insecure_skip_tls_verify: bool,

    /// Custom User-Agent header sent with each request.
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl ConnectorConfig {
    /// Build a config with the required credentials and defaults everywhere
    /// else. Mainly used by tests and by the env-var loader.
    #[must_use]
    pub fn with_credentials(
        api_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        vendit_api_key: impl Into<String>,
    ) -> Self {
        Self {
            api_url: api_url.into(),
            auth_url: default_auth_url(),
            username: username.into(),
            password: password.into(),
            vendit_api_key: vendit_api_key.into(),
            start_date: None,
            end_date: None,
            secrets_path: default_secrets_path(),
            state_path: default_state_path(),
            request_timeout_secs: default_request_timeout_secs(),
            insecure_skip_tls_verify: false,
            user_agent: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied_on_deserialize() {
        let json = r#"{
            "username": "u",
            "password": "p",
            "vendit_api_key": "k"
        }"#;

        let config: ConnectorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.api_url, "https://api.staging.vendit.online");
        assert_eq!(config.auth_url, "https://oauth.staging.vendit.online/Api/GetToken");
        assert_eq!(config.secrets_path, PathBuf::from("secrets.json"));
        assert_eq!(config.state_path, PathBuf::from("state.json"));
        assert_eq!(config.request_timeout_secs, 30);
        assert!(!config.insecure_skip_tls_verify);
        assert!(config.start_date.is_none());
    }

    #[test]
    fn test_secrets_never_serialized() {
        let config = ConnectorConfig::with_credentials("https://api", "user", "pw", "key");
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("pw"));
        assert!(!json.contains("vendit_api_key"));
        assert!(json.contains("user"));
    }
}
