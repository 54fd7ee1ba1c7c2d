//! Token, record and sync-state data types

use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::TOKEN_EXPIRY_MARGIN_SECS;

/// A single extracted entity instance: an arbitrary key-value mapping.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Bearer token with its expiry instant.
///
/// Shared across all stream drivers within a run; replaced in place on
/// refresh and persisted to the token store after every successful refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    /// Opaque bearer token string issued by the vendor.
    pub token: String,

    /// Absolute expiration instant (UTC). `None` when the vendor response
    /// did not carry an expiry; such a token is never considered valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    /// Create a token from the vendor's `{token, expire}` response, where
    /// `expire` is a unix-millisecond instant. `expire <= 0` means no expiry
    /// was recorded.
    #[must_use]
    pub fn from_unix_ms(token: String, expire_ms: i64) -> Self {
        let expires_at =
            (expire_ms > 0).then(|| Utc.timestamp_millis_opt(expire_ms).single()).flatten();
        Self { token, expires_at }
    }

    /// Check whether the token is still usable at `now`.
    ///
    /// Returns `false` when no expiry is recorded or when less than the
    /// 2-minute safety margin remains, including negative remaining time.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => (expires_at - now).num_seconds() >= TOKEN_EXPIRY_MARGIN_SECS,
            None => false,
        }
    }

    /// Check whether the token is still usable right now.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    /// Expiry as a unix-millisecond instant, `0` when none is recorded.
    /// This is the representation persisted to the token store.
    #[must_use]
    pub fn expire_unix_ms(&self) -> i64 {
        self.expires_at.map_or(0, |e| e.timestamp_millis())
    }
}

/// Per-stream incremental sync position carried between runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamState {
    /// Cursor lower bound for the next run: an ISO-8601 timestamp for
    /// timestamp-flavored streams, a unix-millisecond integer for
    /// unix-flavored streams.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replication_key_value: Option<serde_json::Value>,
}

/// Persisted sync state for all streams.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncState {
    /// Bookmarks keyed by stream name.
    #[serde(default)]
    pub bookmarks: BTreeMap<String, StreamState>,
}

impl SyncState {
    /// Bookmark for `stream`, or an empty one when the stream has no state.
    #[must_use]
    pub fn stream(&self, stream: &str) -> StreamState {
        self.bookmarks.get(stream).cloned().unwrap_or_default()
    }

    /// Replace the bookmark for `stream`.
    pub fn set_stream(&mut self, stream: &str, state: StreamState) {
        self.bookmarks.insert(stream.to_string(), state);
    }
}

/// Outcome of a single stream sync pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    /// Number of records emitted.
    pub records: usize,
}
