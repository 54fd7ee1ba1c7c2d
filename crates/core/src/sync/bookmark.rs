//! Bookmark tracking for timestamp-flavored streams
//!
//! For streams with a replication key the next cursor is derived from the
//! records themselves: the maximum value of the key observed during the run.
//! The tracker wraps the downstream record writer so drivers stay unaware
//! of bookkeeping.

use serde_json::Value;
use vendit_domain::{Record, Result, SyncState};

use crate::ports::RecordWriter;

/// Record writer decorator that tracks the maximum replication-key value.
///
/// ISO-8601 timestamps compare correctly as strings, which is what the
/// vendor emits for last-modified columns.
pub struct BookmarkingWriter<'a> {
    inner: &'a mut dyn RecordWriter,
    replication_key: &'a str,
    max_value: Option<String>,
}

impl<'a> BookmarkingWriter<'a> {
    /// Wrap `inner`, watching `replication_key` on every record.
    pub fn new(inner: &'a mut dyn RecordWriter, replication_key: &'a str) -> Self {
        Self { inner, replication_key, max_value: None }
    }

    /// The maximum replication-key value seen, if any record carried one.
    #[must_use]
    pub fn max_value(&self) -> Option<&str> {
        self.max_value.as_deref()
    }

    /// Consume the tracker and return the bookmark value for the next run.
    #[must_use]
    pub fn into_bookmark(self) -> Option<Value> {
        self.max_value.map(Value::String)
    }
}

impl RecordWriter for BookmarkingWriter<'_> {
    fn write_schema(
        &mut self,
        stream: &str,
        schema: &Value,
        key_properties: &[&str],
    ) -> Result<()> {
        self.inner.write_schema(stream, schema, key_properties)
    }

    fn write_record(&mut self, stream: &str, record: &Record) -> Result<()> {
        if let Some(value) = record.get(self.replication_key).and_then(Value::as_str) {
            let is_newer = self.max_value.as_deref().map_or(true, |current| value > current);
            if is_newer {
                self.max_value = Some(value.to_string());
            }
        }
        self.inner.write_record(stream, record)
    }

    fn write_state(&mut self, state: &SyncState) -> Result<()> {
        self.inner.write_state(state)
    }
}
