//! Two-phase streams: discover identifiers, then fetch details

use async_trait::async_trait;
use serde_json::Value;
use tracing::{error, info, warn};
use vendit_domain::constants::{FIND_TIMESTAMP_FORMAT, LAST_MODIFIED_FIELD};
use vendit_domain::{Result, SyncSummary};

use super::{schema, StreamDriver, SyncContext};
use crate::sync::cursor::TimestampCursor;
use crate::sync::fetch::{BatchedFetcher, DetailFetchStrategy, IndividualFetcher};
use crate::sync::find::{AllIdsSource, FindIdSource, IdentifierSource};

/// How the identifier discovery phase is bounded.
enum FindWindow {
    /// Incremental: floor comes from the bookmark, else `start_date`, else
    /// the epoch.
    LastModified,
    /// Bounded export: `start_date` and `end_date` must both be configured;
    /// the raw `start_date` value feeds the filter.
    ConfigWindow,
    /// Full refresh: no filter at all.
    FullRefresh,
}

/// A stream that runs the "discover identifiers" / "fetch details" pattern.
pub struct TwoPhaseStream {
    name: &'static str,
    key_properties: &'static [&'static str],
    replication_key: Option<&'static str>,
    schema_fn: fn() -> Value,
    ids: Box<dyn IdentifierSource>,
    details: Box<dyn DetailFetchStrategy>,
    window: FindWindow,
}

impl TwoPhaseStream {
    /// Products: Find by last-modified, then batched GetMultiple.
    #[must_use]
    pub fn products() -> Self {
        Self {
            name: "products",
            key_properties: &["productId"],
            replication_key: Some("lastModified"),
            schema_fn: schema::products,
            ids: Box::new(FindIdSource::new("/VenditPublicApi/Products/Find", LAST_MODIFIED_FIELD)),
            details: Box::new(BatchedFetcher::new("/VenditPublicApi/Products/GetMultiple")),
            window: FindWindow::LastModified,
        }
    }

    /// Suppliers: flat GetAllIds listing, then batched GetMultiple.
    #[must_use]
    pub fn suppliers() -> Self {
        Self {
            name: "suppliers",
            key_properties: &["supplierId"],
            replication_key: None,
            schema_fn: schema::suppliers,
            ids: Box::new(AllIdsSource::new("/VenditPublicApi/Suppliers/GetAllIds")),
            details: Box::new(BatchedFetcher::new("/VenditPublicApi/Suppliers/GetMultiple")),
            window: FindWindow::FullRefresh,
        }
    }

    /// Orders: Find by last-modified, then per-id GetWithDetails.
    #[must_use]
    pub fn orders() -> Self {
        Self {
            name: "orders",
            key_properties: &["customerOrderHeaderId"],
            replication_key: Some("lastModified"),
            schema_fn: schema::orders,
            ids: Box::new(FindIdSource::new("/VenditPublicApi/Orders/Find", LAST_MODIFIED_FIELD)),
            details: Box::new(IndividualFetcher::new("/VenditPublicApi/Orders/GetWithDetails")),
            window: FindWindow::LastModified,
        }
    }

    /// Purchase orders: Find over a configured date window, then per-id
    /// GetWithDetails.
    #[must_use]
    pub fn purchase_orders() -> Self {
        Self {
            name: "purchase_orders",
            key_properties: &["productPurchaseOrderId"],
            replication_key: None,
            schema_fn: schema::purchase_orders,
            ids: Box::new(FindIdSource::new(
                "/VenditPublicApi/PurchaseOrders/Find",
                LAST_MODIFIED_FIELD,
            )),
            details: Box::new(IndividualFetcher::new(
                "/VenditPublicApi/PurchaseOrders/GetWithDetails",
            )),
            window: FindWindow::ConfigWindow,
        }
    }

    /// Filter value for the discovery phase. `None` means the pass cannot
    /// run at all; `Some(None)` means discovery takes no filter.
    fn filter_value(&self, ctx: &SyncContext<'_>) -> Option<Option<String>> {
        match self.window {
            FindWindow::LastModified => {
                let floor = TimestampCursor::start(ctx.state, ctx.config.start_date.as_deref());
                Some(Some(floor.format(FIND_TIMESTAMP_FORMAT).to_string()))
            }
            FindWindow::ConfigWindow => {
                // end_date gates that a window was configured; the Find
                // filter itself is only bounded from below.
                match (&ctx.config.start_date, &ctx.config.end_date) {
                    (Some(start), Some(_)) => Some(Some(start.clone())),
                    _ => {
                        error!(
                            stream = self.name,
                            "start_date and end_date are required in config"
                        );
                        None
                    }
                }
            }
            FindWindow::FullRefresh => Some(None),
        }
    }
}

#[async_trait]
impl StreamDriver for TwoPhaseStream {
    fn name(&self) -> &'static str {
        self.name
    }

    fn key_properties(&self) -> &'static [&'static str] {
        self.key_properties
    }

    fn replication_key(&self) -> Option<&'static str> {
        self.replication_key
    }

    fn schema(&self) -> Value {
        (self.schema_fn)()
    }

    async fn sync(&self, ctx: &mut SyncContext<'_>) -> Result<SyncSummary> {
        let Some(filter_value) = self.filter_value(ctx) else {
            return Ok(SyncSummary::default());
        };

        info!(stream = self.name, floor = ?filter_value, "discovering identifiers");
        let ids = self.ids.ids(ctx.gateway, &ctx.config.api_url, filter_value.as_deref()).await?;
        if ids.is_empty() {
            warn!(stream = self.name, "no identifiers found");
            return Ok(SyncSummary::default());
        }

        info!(stream = self.name, count = ids.len(), "fetching details");
        let records = self.details.fetch(ctx.gateway, &ctx.config.api_url, &ids).await?;
        for record in &records {
            ctx.out.write_record(self.name, record)?;
        }

        Ok(SyncSummary { records: records.len() })
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for two-phase streams.
    use serde_json::json;
    use vendit_domain::{ConnectorConfig, StreamState};

    use super::*;
    use crate::testing::{CollectingWriter, ScriptedGateway};

    fn test_config() -> ConnectorConfig {
        ConnectorConfig::with_credentials("https://api.test", "user", "pw", "key")
    }

    /// Find returns a short first page, so GetMultiple is called exactly
    /// once with all three keys and records pass through unchanged.
    #[tokio::test]
    async fn test_find_then_get_multiple_end_to_end() {
        let gateway = ScriptedGateway::new();
        gateway.push_json(200, json!({ "results": ["1", "2", "3"] }));
        gateway.push_json(
            200,
            json!({ "items": [
                {"productId": 1, "productNumber": "A"},
                {"productId": 2, "productNumber": "B"},
                {"productId": 3, "productNumber": "C"},
            ]}),
        );

        let stream = TwoPhaseStream::products();
        let config = test_config();
        let mut state = StreamState::default();
        let mut out = CollectingWriter::default();
        let mut ctx = SyncContext {
            gateway: &gateway,
            config: &config,
            state: &mut state,
            out: &mut out,
        };

        let summary = stream.sync(&mut ctx).await.unwrap();
        assert_eq!(summary.records, 3);

        let requests = gateway.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].url, "https://api.test/VenditPublicApi/Products/GetMultiple");
        assert_eq!(requests[1].body.as_ref().unwrap()["primaryKeys"], json!(["1", "2", "3"]));

        assert_eq!(out.records.len(), 3);
        assert_eq!(out.records[0].0, "products");
        assert_eq!(out.records[0].1["productNumber"], json!("A"));
    }

    #[tokio::test]
    async fn test_find_floor_uses_bookmark_over_start_date() {
        let gateway = ScriptedGateway::new();
        gateway.push_json(200, json!({ "results": [] }));

        let stream = TwoPhaseStream::products();
        let mut config = test_config();
        config.start_date = Some("2023-01-01T00:00:00".to_string());
        let mut state = StreamState {
            replication_key_value: Some(json!("2024-06-01T09:00:00")),
        };
        let mut out = CollectingWriter::default();
        let mut ctx = SyncContext {
            gateway: &gateway,
            config: &config,
            state: &mut state,
            out: &mut out,
        };

        stream.sync(&mut ctx).await.unwrap();

        let requests = gateway.requests();
        assert_eq!(
            requests[0].body.as_ref().unwrap()["fieldFilters"][0]["value"],
            json!("2024-06-01T09:00:00.000")
        );
    }

    #[tokio::test]
    async fn test_suppliers_use_flat_id_listing() {
        let gateway = ScriptedGateway::new();
        gateway.push_json(200, json!([5, 6]));
        gateway.push_json(
            200,
            json!({ "items": [
                {"supplierId": 5, "supplierName": "Acme"},
                {"supplierId": 6, "supplierName": "Globex"},
            ]}),
        );

        let stream = TwoPhaseStream::suppliers();
        let config = test_config();
        let mut state = StreamState::default();
        let mut out = CollectingWriter::default();
        let mut ctx = SyncContext {
            gateway: &gateway,
            config: &config,
            state: &mut state,
            out: &mut out,
        };

        let summary = stream.sync(&mut ctx).await.unwrap();
        assert_eq!(summary.records, 2);

        let requests = gateway.requests();
        assert_eq!(requests[0].method, "GET");
        assert_eq!(requests[0].url, "https://api.test/VenditPublicApi/Suppliers/GetAllIds");
        assert_eq!(requests[1].body.as_ref().unwrap()["primaryKeys"], json!(["5", "6"]));
    }

    #[tokio::test]
    async fn test_purchase_orders_require_config_window() {
        let gateway = ScriptedGateway::new();

        let stream = TwoPhaseStream::purchase_orders();
        let config = test_config();
        let mut state = StreamState::default();
        let mut out = CollectingWriter::default();
        let mut ctx = SyncContext {
            gateway: &gateway,
            config: &config,
            state: &mut state,
            out: &mut out,
        };

        let summary = stream.sync(&mut ctx).await.unwrap();
        assert_eq!(summary.records, 0);
        assert!(gateway.requests().is_empty());
    }

    #[tokio::test]
    async fn test_purchase_orders_pass_raw_start_date() {
        let gateway = ScriptedGateway::new();
        gateway.push_json(200, json!({ "results": ["9"] }));
        gateway.push_json(200, json!({ "productPurchaseOrderId": 9 }));

        let stream = TwoPhaseStream::purchase_orders();
        let mut config = test_config();
        config.start_date = Some("2024-01-01T00:00:00".to_string());
        config.end_date = Some("2024-02-01T00:00:00".to_string());
        let mut state = StreamState::default();
        let mut out = CollectingWriter::default();
        let mut ctx = SyncContext {
            gateway: &gateway,
            config: &config,
            state: &mut state,
            out: &mut out,
        };

        let summary = stream.sync(&mut ctx).await.unwrap();
        assert_eq!(summary.records, 1);

        let requests = gateway.requests();
        assert_eq!(
            requests[0].body.as_ref().unwrap()["fieldFilters"][0]["value"],
            json!("2024-01-01T00:00:00")
        );
        assert_eq!(
            requests[1].url,
            "https://api.test/VenditPublicApi/PurchaseOrders/GetWithDetails/9"
        );
    }
}
