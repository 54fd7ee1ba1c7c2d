//! Per-entity stream drivers
//!
//! Each driver composes an identifier source, a detail fetch strategy and a
//! cursor flavor; entity selection happens through composition rather than
//! subclassing.

pub mod optiply;
pub mod schema;
pub mod two_phase;

use async_trait::async_trait;
use serde_json::Value;
use vendit_domain::{ConnectorConfig, Result, StreamState, SyncSummary};

pub use optiply::OptiplyStream;
pub use two_phase::TwoPhaseStream;

use crate::ports::{RecordWriter, RequestGateway};

/// Everything a driver needs for one sync pass.
pub struct SyncContext<'a> {
    /// Authenticated HTTP access.
    pub gateway: &'a dyn RequestGateway,
    /// Immutable connector configuration.
    pub config: &'a ConnectorConfig,
    /// The stream's bookmark, read at the start of the pass and updated by
    /// unix-cursor drivers before returning.
    pub state: &'a mut StreamState,
    /// Downstream record channel.
    pub out: &'a mut dyn RecordWriter,
}

/// A record-producing entity stream.
#[async_trait]
pub trait StreamDriver: Send + Sync {
    /// Stream name as emitted on the record channel.
    fn name(&self) -> &'static str;

    /// Primary key fields of the entity.
    fn key_properties(&self) -> &'static [&'static str];

    /// Replication key field, when the stream syncs incrementally.
    fn replication_key(&self) -> Option<&'static str> {
        None
    }

    /// JSON schema describing the emitted records.
    fn schema(&self) -> Value;

    /// Run one sync pass to completion, emitting records through
    /// `ctx.out`.
    async fn sync(&self, ctx: &mut SyncContext<'_>) -> Result<SyncSummary>;
}

/// All streams in their fixed sync order.
#[must_use]
pub fn registry() -> Vec<Box<dyn StreamDriver>> {
    vec![
        Box::new(TwoPhaseStream::products()),
        Box::new(TwoPhaseStream::suppliers()),
        Box::new(TwoPhaseStream::orders()),
        Box::new(TwoPhaseStream::purchase_orders()),
        Box::new(OptiplyStream::supplier_products()),
        Box::new(OptiplyStream::purchase_orders_optiply()),
        Box::new(OptiplyStream::orders_optiply()),
    ]
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_registry_names_are_unique() {
        let drivers = registry();
        let names: HashSet<&str> = drivers.iter().map(|d| d.name()).collect();
        assert_eq!(names.len(), drivers.len());
        assert_eq!(drivers.len(), 7);
    }

    #[test]
    fn test_registry_schemas_are_objects() {
        for driver in registry() {
            let schema = driver.schema();
            assert_eq!(schema["type"], "object", "stream {}", driver.name());
            assert!(schema["properties"].is_object(), "stream {}", driver.name());
            assert!(!driver.key_properties().is_empty(), "stream {}", driver.name());
        }
    }
}
