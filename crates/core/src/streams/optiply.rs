//! Optiply streams: single timestamped endpoint per entity
//!
//! These streams skip identifier discovery entirely: one GET against
//! `Get{Entity}FromDate/{unixMs}` returns every record modified since the
//! floor. Every record of a run is stamped with the run's starting cursor
//! value, and the checkpoint for the next run is captured at the start of
//! the fetch, so consecutive runs overlap rather than leave gaps
//! (at-least-once delivery).

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{error, info, warn};
use vendit_domain::constants::UNIX_TIMESTAMP_FIELD;
use vendit_domain::{Record, Result, SyncSummary};

use super::{schema, StreamDriver, SyncContext};
use crate::sync::cursor::UnixCursor;

/// A stream backed by one of the Optiply timestamp endpoints.
pub struct OptiplyStream {
    name: &'static str,
    key_properties: &'static [&'static str],
    schema_fn: fn() -> Value,
    path: &'static str,
    flatten: Option<fn(&mut Record)>,
}

impl OptiplyStream {
    /// Supplier-product relations, with the nested purchase-price object
    /// flattened onto the record.
    #[must_use]
    pub fn supplier_products() -> Self {
        Self {
            name: "supplier_products",
            key_properties: &["productSupplierId"],
            schema_fn: schema::supplier_products,
            path: "/Optiply/GetProductSuppliersFromDate",
            flatten: Some(flatten_purchase_price),
        }
    }

    /// Purchase orders including their detail lines and lookups.
    #[must_use]
    pub fn purchase_orders_optiply() -> Self {
        Self {
            name: "purchase_orders_optiply",
            key_properties: &["productPurchaseOrderId"],
            schema_fn: schema::purchase_orders_optiply,
            path: "/Optiply/GetProductPurchaseOrdersFromDate",
            flatten: None,
        }
    }

    /// Customer orders.
    #[must_use]
    pub fn orders_optiply() -> Self {
        Self {
            name: "orders_optiply",
            key_properties: &["customerOrderHeaderId"],
            schema_fn: schema::orders_optiply,
            path: "/Optiply/GetCustomerOrdersFromDate",
            flatten: None,
        }
    }
}

#[async_trait]
impl StreamDriver for OptiplyStream {
    fn name(&self) -> &'static str {
        self.name
    }

    fn key_properties(&self) -> &'static [&'static str] {
        self.key_properties
    }

    fn replication_key(&self) -> Option<&'static str> {
        Some(UNIX_TIMESTAMP_FIELD)
    }

    fn schema(&self) -> Value {
        (self.schema_fn)()
    }

    async fn sync(&self, ctx: &mut SyncContext<'_>) -> Result<SyncSummary> {
        let floor = UnixCursor::start(ctx.state);
        // Captured before the fetch so the next run re-covers anything
        // modified while this one was in flight.
        let checkpoint = UnixCursor::checkpoint();

        let url = format!("{}{}/{floor}", ctx.config.api_url, self.path);
        info!(stream = self.name, floor, "fetching records from date");

        let response = ctx.gateway.get(&url).await?;
        if response.status != 200 {
            error!(
                stream = self.name,
                status = response.status,
                body = %response.body,
                "error fetching records"
            );
            // Checkpoint stays put so the failed window is retried next run.
            return Ok(SyncSummary::default());
        }

        let data = response.json()?;
        let items = data.get("items").and_then(Value::as_array).cloned().unwrap_or_default();
        info!(stream = self.name, count = items.len(), "retrieved records");

        let mut records = 0usize;
        for item in items {
            let Value::Object(mut record) = item else {
                warn!(stream = self.name, item = %item, "skipping non-object item");
                continue;
            };
            if let Some(flatten) = self.flatten {
                flatten(&mut record);
            }
            record.insert(UNIX_TIMESTAMP_FIELD.to_string(), json!(floor));
            ctx.out.write_record(self.name, &record)?;
            records += 1;
        }

        // Only advanced after the run's records have been yielded.
        ctx.state.replication_key_value = Some(json!(checkpoint));
        info!(stream = self.name, records, checkpoint, "advancing unix checkpoint");

        Ok(SyncSummary { records })
    }
}

/// Lift the nested `productPurchasePrice` fields onto the parent record.
fn flatten_purchase_price(record: &mut Record) {
    let nested = record.remove("productPurchasePrice");
    let (price_id, price_ex) = match nested {
        Some(Value::Object(map)) => (
            map.get("productPurchasePriceId").cloned().unwrap_or(Value::Null),
            map.get("purchasePriceEx").cloned().unwrap_or(Value::Null),
        ),
        _ => (Value::Null, Value::Null),
    };
    record.insert("productPurchasePriceId".to_string(), price_id);
    record.insert("purchasePriceEx".to_string(), price_ex);
}
