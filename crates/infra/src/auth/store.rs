//! Durable token persistence
//!
//! A small JSON key-value file (shared with other secrets) holding the
//! bearer token and its expiry. Reads merge over whatever else the file
//! contains, so unrelated keys survive every write. Failures in either
//! direction are non-fatal: the in-memory token remains valid for the
//! current process even when the disk copy cannot be updated.

use std::path::{Path, PathBuf};

use serde_json::{json, Map, Value};
use tracing::{info, warn};

/// Token data as read back from the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredToken {
    /// Persisted bearer token, if any.
    pub token: Option<String>,
    /// Persisted expiry as a unix-millisecond instant.
    pub token_expire: Option<i64>,
}

/// JSON-file-backed token store.
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    /// Create a store backed by the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted token. A missing or malformed file is not an
    /// error: it logs a warning and yields an empty result.
    #[must_use]
    pub fn read(&self) -> StoredToken {
        let data = self.read_file();
        StoredToken {
            token: data.get("token").and_then(Value::as_str).map(ToString::to_string),
            token_expire: data.get("token_expire").and_then(Value::as_i64),
        }
    }

    /// Persist a token and its expiry, merging over the existing file
    /// contents. Write failures are logged and swallowed.
    pub fn write(&self, token: &str, expire_ms: i64) {
        let mut data = self.read_file();
        data.insert("token".to_string(), json!(token));
        data.insert("token_expire".to_string(), json!(expire_ms));

        let serialized = match serde_json::to_string_pretty(&Value::Object(data)) {
            Ok(serialized) => serialized,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to serialize token data");
                return;
            }
        };

        match std::fs::write(&self.path, serialized) {
            Ok(()) => info!(path = %self.path.display(), "persisted token data"),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to persist token data");
            }
        }
    }

    fn read_file(&self) -> Map<String, Value> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read token file");
                return Map::new();
            }
        };

        match serde_json::from_str::<Value>(&contents) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                warn!(path = %self.path.display(), "token file is not a JSON object");
                Map::new()
            }
        }
    }
}
