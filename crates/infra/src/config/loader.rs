//! Configuration loader
//!
//! Loads connector configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `VENDIT_API_URL`: API base URL (optional, staging default)
//! - `VENDIT_AUTH_URL`: token endpoint URL (optional, staging default)
//! - `VENDIT_USERNAME`: API user name (required)
//! - `VENDIT_PASSWORD`: API password (required)
//! - `VENDIT_API_KEY`: Vendit API key (required)
//! - `VENDIT_START_DATE` / `VENDIT_END_DATE`: sync window (optional)
//! - `VENDIT_SECRETS_PATH`: token persistence file (optional)
//! - `VENDIT_STATE_PATH`: bookmark file (optional)
//! - `VENDIT_REQUEST_TIMEOUT_SECS`: per-request timeout (optional)
//! - `VENDIT_INSECURE_SKIP_TLS_VERIFY`: skip TLS verification (optional)
//! - `VENDIT_USER_AGENT`: custom User-Agent header (optional)
//!
//! ## File Locations
//! The loader probes `config.json`/`config.toml` and
//! `vendit.json`/`vendit.toml` in the current working directory, its
//! parents (up to 2 levels) and next to the executable.

use std::path::{Path, PathBuf};

use vendit_domain::{ConnectorConfig, ConnectorError, Result};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `ConnectorError::Config` if configuration cannot be loaded from
/// either source.
pub fn load() -> Result<ConnectorConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// The credential variables must all be present; everything else falls
/// back to its default.
///
/// # Errors
/// Returns `ConnectorError::Config` if required variables are missing or
/// have invalid values.
pub fn load_from_env() -> Result<ConnectorConfig> {
    let username = env_var("VENDIT_USERNAME")?;
    let password = env_var("VENDIT_PASSWORD")?;
    let api_key = env_var("VENDIT_API_KEY")?;

    let mut config = ConnectorConfig::with_credentials(
        std::env::var("VENDIT_API_URL")
            .unwrap_or_else(|_| "https://api.staging.vendit.online".to_string()),
        username,
        password,
        api_key,
    );

    if let Ok(auth_url) = std::env::var("VENDIT_AUTH_URL") {
        config.auth_url = auth_url;
    }
    config.start_date = std::env::var("VENDIT_START_DATE").ok();
    config.end_date = std::env::var("VENDIT_END_DATE").ok();
    if let Ok(path) = std::env::var("VENDIT_SECRETS_PATH") {
        config.secrets_path = PathBuf::from(path);
    }
    if let Ok(path) = std::env::var("VENDIT_STATE_PATH") {
        config.state_path = PathBuf::from(path);
    }
    if let Ok(timeout) = std::env::var("VENDIT_REQUEST_TIMEOUT_SECS") {
        config.request_timeout_secs = timeout.parse::<u64>().map_err(|e| {
            ConnectorError::Config(format!("invalid request timeout: {e}"))
        })?;
    }
    config.insecure_skip_tls_verify = env_bool("VENDIT_INSECURE_SKIP_TLS_VERIFY", false);
    config.user_agent = std::env::var("VENDIT_USER_AGENT").ok();

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `ConnectorError::Config` if no file is found, the format is
/// invalid or required fields are missing.
pub fn load_from_file(path: Option<PathBuf>) -> Result<ConnectorConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ConnectorError::Config(format!(
                    "config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            ConnectorError::Config(
                "no config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| ConnectorError::Config(format!("failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content, detecting the format by file
/// extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<ConnectorConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| ConnectorError::Config(format!("invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| ConnectorError::Config(format!("invalid JSON format: {e}"))),
        _ => Err(ConnectorError::Config(format!("unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        for base in [&cwd, &cwd.join(".."), &cwd.join("../..")] {
            candidates.extend(candidate_names(base));
        }
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(candidate_names(exe_dir));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn candidate_names(dir: &Path) -> Vec<PathBuf> {
    vec![
        dir.join("config.json"),
        dir.join("config.toml"),
        dir.join("vendit.json"),
        dir.join("vendit.toml"),
    ]
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        ConnectorError::Config(format!("missing required environment variable: {key}"))
    })
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off`
/// (case-insensitive).
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
