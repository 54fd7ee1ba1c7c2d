//! Port interfaces for the sync engine

use async_trait::async_trait;
use serde_json::Value;
use tracing::error;
use vendit_domain::{ConnectorError, Record, Result, SyncState};

/// An HTTP response as seen by the sync engine: status plus raw body text.
///
/// Non-2xx statuses are carried back to the caller rather than raised;
/// each call site decides whether a given status is fatal to its loop.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: String,
}

impl ApiResponse {
    /// Whether the status is in the 2xx range.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as JSON.
    ///
    /// A non-JSON body is logged with status and body text for diagnosis
    /// and surfaces as a fatal [`ConnectorError::Parse`].
    pub fn json(&self) -> Result<Value> {
        serde_json::from_str(&self.body).map_err(|e| {
            error!(status = self.status, body = %self.body, "response body is not valid JSON");
            ConnectorError::Parse(format!(
                "invalid JSON response (status {}): {}",
                self.status, e
            ))
        })
    }
}

/// Authenticated HTTP access to the vendor API.
///
/// Implementations inject auth headers, refresh the token when needed and
/// retry exactly once on 401 before handing the response back.
#[async_trait]
pub trait RequestGateway: Send + Sync {
    /// Issue a GET request.
    async fn get(&self, url: &str) -> Result<ApiResponse>;

    /// Issue a POST request with a JSON body.
    async fn post_json(&self, url: &str, body: &Value) -> Result<ApiResponse>;
}

/// Downstream record channel.
///
/// The sync engine emits a schema-tagged record stream through this port;
/// the serialization mechanism behind it is an external collaborator.
pub trait RecordWriter: Send {
    /// Announce the schema for a stream before its records.
    fn write_schema(&mut self, stream: &str, schema: &Value, key_properties: &[&str])
        -> Result<()>;

    /// Emit one record for a stream.
    fn write_record(&mut self, stream: &str, record: &Record) -> Result<()>;

    /// Emit the current sync state as a bookmark message.
    fn write_state(&mut self, state: &SyncState) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_response_success_range() {
        assert!(ApiResponse { status: 200, body: String::new() }.is_success());
        assert!(ApiResponse { status: 204, body: String::new() }.is_success());
        assert!(!ApiResponse { status: 301, body: String::new() }.is_success());
        assert!(!ApiResponse { status: 401, body: String::new() }.is_success());
        assert!(!ApiResponse { status: 500, body: String::new() }.is_success());
    }

    #[test]
    fn test_api_response_json_parse() {
        let ok = ApiResponse { status: 200, body: r#"{"results":[1,2]}"#.to_string() };
        assert_eq!(ok.json().unwrap()["results"][0], 1);

        let bad = ApiResponse { status: 502, body: "<html>Bad Gateway</html>".to_string() };
        let err = bad.json().unwrap_err();
        assert!(matches!(err, ConnectorError::Parse(_)));
        assert!(err.to_string().contains("502"));
    }
}
