//! Detail fetching: batched GetMultiple and per-identifier GetWithDetails
//!
//! Partial failure is isolated: a failing chunk or identifier is logged and
//! skipped so the rest of the stream keeps its progress.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, error, warn};
use vendit_domain::constants::GET_MULTIPLE_BATCH_SIZE;
use vendit_domain::{Record, Result};

use crate::ports::RequestGateway;

/// Strategy for resolving full records from an identifier sequence.
#[async_trait]
pub trait DetailFetchStrategy: Send + Sync {
    /// Fetch the records for `ids`, in order.
    async fn fetch(
        &self,
        gateway: &dyn RequestGateway,
        base_url: &str,
        ids: &[String],
    ) -> Result<Vec<Record>>;
}

/// Batched fetching through a `GetMultiple`-style endpoint.
pub struct BatchedFetcher {
    path: &'static str,
}

impl BatchedFetcher {
    /// Create a fetcher POSTing primary-key batches to `path`.
    #[must_use]
    pub fn new(path: &'static str) -> Self {
        Self { path }
    }
}

#[async_trait]
impl DetailFetchStrategy for BatchedFetcher {
    async fn fetch(
        &self,
        gateway: &dyn RequestGateway,
        base_url: &str,
        ids: &[String],
    ) -> Result<Vec<Record>> {
        let url = format!("{base_url}{}", self.path);
        let mut records = Vec::new();

        for batch in ids.chunks(GET_MULTIPLE_BATCH_SIZE) {
            let response = gateway.post_json(&url, &json!({ "primaryKeys": batch })).await?;
            if response.status != 200 {
                error!(
                    path = self.path,
                    status = response.status,
                    batch_len = batch.len(),
                    "error fetching batch, skipping"
                );
                continue;
            }

            let data = response.json()?;
            let items = data.get("items").and_then(Value::as_array).cloned().unwrap_or_default();
            debug!(path = self.path, batch_len = batch.len(), items = items.len(), "batch fetched");

            for item in items {
                match item {
                    Value::Object(record) => records.push(record),
                    other => warn!(path = self.path, item = %other, "skipping non-object item"),
                }
            }
        }

        Ok(records)
    }
}

/// Per-identifier fetching through a `GetWithDetails`-style endpoint.
pub struct IndividualFetcher {
    path: &'static str,
}

impl IndividualFetcher {
    /// Create a fetcher issuing one GET per identifier to `path/{id}`.
    #[must_use]
    pub fn new(path: &'static str) -> Self {
        Self { path }
    }
}

#[async_trait]
impl DetailFetchStrategy for IndividualFetcher {
    async fn fetch(
        &self,
        gateway: &dyn RequestGateway,
        base_url: &str,
        ids: &[String],
    ) -> Result<Vec<Record>> {
        let mut records = Vec::new();

        for id in ids {
            let url = format!("{base_url}{}/{id}", self.path);
            let response = gateway.get(&url).await?;
            if response.status != 200 {
                error!(
                    path = self.path,
                    id = %id,
                    status = response.status,
                    "error fetching record, skipping"
                );
                continue;
            }
            if response.body.trim().is_empty() {
                continue;
            }

            match response.json()? {
                Value::Object(record) if !record.is_empty() => records.push(record),
                Value::Null => {}
                Value::Object(_) => {}
                other => warn!(path = self.path, id = %id, body = %other, "skipping non-object body"),
            }
        }

        Ok(records)
    }
}
