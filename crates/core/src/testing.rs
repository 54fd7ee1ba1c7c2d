//! Test doubles for the sync-engine ports
//!
//! In-memory fakes so strategy and driver logic can be exercised without a
//! network or filesystem. Used by this crate's unit tests and by downstream
//! crates' integration tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use vendit_domain::{ConnectorError, Record, Result, SyncState};

use crate::ports::{ApiResponse, RecordWriter, RequestGateway};

/// One request observed by [`ScriptedGateway`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method, `"GET"` or `"POST"`.
    pub method: String,
    /// Full request URL.
    pub url: String,
    /// JSON body for POST requests.
    pub body: Option<Value>,
}

/// Gateway fake that replays a scripted queue of responses and records
/// every request it receives.
///
/// Responses are consumed in FIFO order; once the queue is empty every
/// further request answers `200 {}`.
#[derive(Default)]
pub struct ScriptedGateway {
    responses: Mutex<VecDeque<ApiResponse>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedGateway {
    /// Create an empty gateway.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response with a JSON body.
    pub fn push_json(&self, status: u16, body: Value) {
        self.push_body(status, body.to_string());
    }

    /// Queue a response with a raw body.
    pub fn push_body(&self, status: u16, body: impl Into<String>) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push_back(ApiResponse { status, body: body.into() });
        }
    }

    /// Snapshot of every request seen so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn record(&self, method: &str, url: &str, body: Option<Value>) -> Result<ApiResponse> {
        let mut requests = self
            .requests
            .lock()
            .map_err(|_| ConnectorError::Internal("scripted gateway lock poisoned".into()))?;
        requests.push(RecordedRequest {
            method: method.to_string(),
            url: url.to_string(),
            body,
        });

        let mut responses = self
            .responses
            .lock()
            .map_err(|_| ConnectorError::Internal("scripted gateway lock poisoned".into()))?;
        Ok(responses
            .pop_front()
            .unwrap_or_else(|| ApiResponse { status: 200, body: "{}".to_string() }))
    }
}

#[async_trait]
impl RequestGateway for ScriptedGateway {
    async fn get(&self, url: &str) -> Result<ApiResponse> {
        self.record("GET", url, None)
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<ApiResponse> {
        self.record("POST", url, Some(body.clone()))
    }
}

/// Record writer fake collecting everything written to it.
#[derive(Default)]
pub struct CollectingWriter {
    /// Emitted `(stream, schema, key_properties)` tuples.
    pub schemas: Vec<(String, Value, Vec<String>)>,
    /// Emitted `(stream, record)` pairs.
    pub records: Vec<(String, Record)>,
    /// Emitted state snapshots.
    pub states: Vec<SyncState>,
}

impl RecordWriter for CollectingWriter {
    fn write_schema(
        &mut self,
        stream: &str,
        schema: &Value,
        key_properties: &[&str],
    ) -> Result<()> {
        self.schemas.push((
            stream.to_string(),
            schema.clone(),
            key_properties.iter().map(ToString::to_string).collect(),
        ));
        Ok(())
    }

    fn write_record(&mut self, stream: &str, record: &Record) -> Result<()> {
        self.records.push((stream.to_string(), record.clone()));
        Ok(())
    }

    fn write_state(&mut self, state: &SyncState) -> Result<()> {
        self.states.push(state.clone());
        Ok(())
    }
}
