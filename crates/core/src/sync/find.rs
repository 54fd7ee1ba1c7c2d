//! Identifier discovery: the "Find" query contract and its exceptions
//!
//! Most entities discover identifiers through offset-paginated, filtered
//! Find queries. Suppliers deviate and expose a flat `GetAllIds` endpoint
//! instead - a recognized exception to the Find contract, not a bug.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, warn};
use vendit_domain::constants::{FILTER_GREATER_OR_EQUAL, FIND_PAGE_SIZE};
use vendit_domain::{ConnectorError, Result};

use crate::ports::RequestGateway;

/// Strategy for producing the ordered identifier set of one stream pass.
#[async_trait]
pub trait IdentifierSource: Send + Sync {
    /// Retrieve all entity identifiers, coerced to strings with falsy
    /// values dropped. `filter_value` is the formatted cursor lower bound;
    /// sources that take no filter ignore it.
    async fn ids(
        &self,
        gateway: &dyn RequestGateway,
        base_url: &str,
        filter_value: Option<&str>,
    ) -> Result<Vec<String>>;
}

/// Offset-paginated Find queries against a well-known filter column.
pub struct FindIdSource {
    path: &'static str,
    field: i64,
}

impl FindIdSource {
    /// Create a source for `path` filtering on vendor column `field`.
    #[must_use]
    pub fn new(path: &'static str, field: i64) -> Self {
        Self { path, field }
    }
}

#[async_trait]
impl IdentifierSource for FindIdSource {
    async fn ids(
        &self,
        gateway: &dyn RequestGateway,
        base_url: &str,
        filter_value: Option<&str>,
    ) -> Result<Vec<String>> {
        let value = filter_value.ok_or_else(|| {
            ConnectorError::Config(format!("find query for {} requires a filter value", self.path))
        })?;

        let url = format!("{base_url}{}", self.path);
        let mut all_ids = Vec::new();
        let mut offset = 0usize;

        loop {
            let payload = json!({
                "fieldFilters": [
                    {
                        "field": self.field,
                        "value": value,
                        "filterComparison": FILTER_GREATER_OR_EQUAL,
                    }
                ],
                "paginationOffset": offset,
                "operator": 0,
            });

            let response = gateway.post_json(&url, &payload).await?;
            if !response.is_success() {
                warn!(
                    path = self.path,
                    status = response.status,
                    offset,
                    "find page returned non-success status"
                );
            }

            // A broken Find means no data for the whole stream, so a
            // non-JSON body here is fatal (logged with status and body).
            let data = response.json()?;
            let results = data.get("results").and_then(Value::as_array).cloned().unwrap_or_default();

            if results.is_empty() {
                break;
            }

            let page_len = results.len();
            all_ids.extend(results.iter().filter_map(id_to_string));
            debug!(path = self.path, offset, page_len, total = all_ids.len(), "find page consumed");

            if page_len < FIND_PAGE_SIZE {
                break;
            }
            // The vendor's offset semantics are page-size-based, not
            // result-count-based.
            offset += FIND_PAGE_SIZE;
        }

        Ok(all_ids)
    }
}

/// Flat identifier listing for entities without a Find endpoint.
pub struct AllIdsSource {
    path: &'static str,
}

impl AllIdsSource {
    /// Create a source for the flat `GetAllIds`-style endpoint at `path`.
    #[must_use]
    pub fn new(path: &'static str) -> Self {
        Self { path }
    }
}

#[async_trait]
impl IdentifierSource for AllIdsSource {
    async fn ids(
        &self,
        gateway: &dyn RequestGateway,
        base_url: &str,
        _filter_value: Option<&str>,
    ) -> Result<Vec<String>> {
        let url = format!("{base_url}{}", self.path);
        let response = gateway.get(&url).await?;
        if !response.is_success() {
            warn!(path = self.path, status = response.status, "id listing returned non-success status");
        }

        let data = response.json()?;
        let ids = data
            .as_array()
            .map(|items| items.iter().filter_map(id_to_string).collect())
            .unwrap_or_default();

        Ok(ids)
    }
}

/// Coerce one identifier value to string form, dropping falsy values
/// (null, empty string, zero).
fn id_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => {
            if n.as_i64() == Some(0) || n.as_f64() == Some(0.0) {
                None
            } else {
                Some(n.to_string())
            }
        }
        _ => None,
    }
}
