//! Record emission to the downstream channel
//!
//! Serializes the schema-tagged record stream as one JSON object per line,
//! the format the downstream loader consumes. Stdout is reserved for this
//! stream; logs go to stderr.

use std::io::Write;

use chrono::Utc;
use serde_json::{json, Value};
use vendit_core::ports::RecordWriter;
use vendit_domain::{ConnectorError, Record, Result, SyncState};

/// JSON-lines record writer over any `io::Write`.
pub struct JsonLinesWriter<W: Write + Send> {
    out: W,
}

impl JsonLinesWriter<std::io::BufWriter<std::io::Stdout>> {
    /// Writer over buffered stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self { out: std::io::BufWriter::new(std::io::stdout()) }
    }
}

impl<W: Write + Send> JsonLinesWriter<W> {
    /// Writer over an arbitrary sink; tests write into a buffer.
    #[must_use]
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// The underlying sink, for inspection in tests.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_message(&mut self, message: &Value) -> Result<()> {
        serde_json::to_writer(&mut self.out, message)
            .map_err(|e| ConnectorError::Internal(format!("failed to serialize message: {e}")))?;
        self.out
            .write_all(b"\n")
            .map_err(|e| ConnectorError::Internal(format!("record channel write failed: {e}")))
    }
}

impl<W: Write + Send> RecordWriter for JsonLinesWriter<W> {
    fn write_schema(
        &mut self,
        stream: &str,
        schema: &Value,
        key_properties: &[&str],
    ) -> Result<()> {
        self.write_message(&json!({
            "type": "SCHEMA",
            "stream": stream,
            "schema": schema,
            "key_properties": key_properties,
        }))
    }

    fn write_record(&mut self, stream: &str, record: &Record) -> Result<()> {
        self.write_message(&json!({
            "type": "RECORD",
            "stream": stream,
            "record": record,
            "time_extracted": Utc::now().to_rfc3339(),
        }))
    }

    fn write_state(&mut self, state: &SyncState) -> Result<()> {
        self.write_message(&json!({ "type": "STATE", "value": state }))?;
        self.out
            .flush()
            .map_err(|e| ConnectorError::Internal(format!("record channel flush failed: {e}")))
    }
}
