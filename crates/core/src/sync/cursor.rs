//! Incremental cursor tracking
//!
//! Two independent flavors: an ISO-timestamp replication key (floor for the
//! Find filter) and a monotonic unix-millisecond checkpoint (floor for the
//! Optiply timestamp endpoints).

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use tracing::warn;
use vendit_domain::constants::DEFAULT_UNIX_FLOOR_MS;
use vendit_domain::StreamState;

/// Timestamp-flavored cursor for streams filtered on a last-modified column.
pub struct TimestampCursor;

impl TimestampCursor {
    /// Compute the starting point for a sync pass: the prior run's saved
    /// replication-key value if present, else the configured start date,
    /// else the epoch floor (1970-01-01).
    ///
    /// The next bookmark is derived per-record from the data itself by the
    /// bookmark-tracking record writer, so no checkpoint computation lives
    /// here.
    #[must_use]
    pub fn start(state: &StreamState, start_date: Option<&str>) -> NaiveDateTime {
        if let Some(saved) = state.replication_key_value.as_ref().and_then(Value::as_str) {
            if let Some(parsed) = parse_timestamp(saved) {
                return parsed;
            }
            warn!(value = saved, "unparseable saved replication key, falling back");
        }

        if let Some(configured) = start_date {
            if let Some(parsed) = parse_timestamp(configured) {
                return parsed;
            }
            warn!(value = configured, "unparseable start_date, falling back to epoch");
        }

        epoch_floor()
    }
}

/// Unix-millisecond-flavored cursor for the Optiply timestamp endpoints.
pub struct UnixCursor;

impl UnixCursor {
    /// Compute the starting point: the prior run's saved checkpoint if
    /// present, else the fixed 2022-01-01 floor.
    #[must_use]
    pub fn start(state: &StreamState) -> i64 {
        state
            .replication_key_value
            .as_ref()
            .and_then(Value::as_i64)
            .unwrap_or(DEFAULT_UNIX_FLOOR_MS)
    }

    /// Capture the checkpoint for the next run.
    ///
    /// Called at the *start* of the fetch, not at completion: the next run
    /// re-covers everything modified while this run was in flight, trading
    /// overlap (at-least-once delivery) against gaps.
    #[must_use]
    pub fn checkpoint() -> i64 {
        vendit_common::time::now_unix_ms()
    }
}

fn epoch_floor() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1970, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Parse an ISO-8601 timestamp, with or without offset or fractional
/// seconds, or a bare date.
fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(dt);
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    None
}
