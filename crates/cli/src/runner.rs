//! Sequential stream runner
//!
//! One stream is synced to completion before the next begins. Per stream:
//! schema message, driver pass (with bookmark tracking for incremental
//! streams), then state persistence and a state message. A failed stream
//! aborts the run; bookmarks of already-completed streams are on disk by
//! then.

use serde_json::Value;
use tracing::info;
use vendit_core::ports::{RecordWriter, RequestGateway};
use vendit_core::streams::{registry, StreamDriver, SyncContext};
use vendit_core::BookmarkingWriter;
use vendit_domain::{ConnectorConfig, Result, StreamState, SyncState};
use vendit_infra::FileStateStore;

/// Sync every registered stream in order.
pub async fn run_all(
    config: &ConnectorConfig,
    gateway: &dyn RequestGateway,
    state_store: &FileStateStore,
    out: &mut dyn RecordWriter,
) -> Result<()> {
    let mut state = state_store.read();

    for driver in registry() {
        sync_stream(driver.as_ref(), config, gateway, &mut state, state_store, out).await?;
    }

    Ok(())
}

async fn sync_stream(
    driver: &dyn StreamDriver,
    config: &ConnectorConfig,
    gateway: &dyn RequestGateway,
    state: &mut SyncState,
    state_store: &FileStateStore,
    out: &mut dyn RecordWriter,
) -> Result<()> {
    let name = driver.name();
    info!(stream = name, "starting stream sync");
    out.write_schema(name, &driver.schema(), driver.key_properties())?;

    let mut stream_state = state.stream(name);
    let (summary, bookmark) = if let Some(key) = driver.replication_key() {
        let mut tracker = BookmarkingWriter::new(&mut *out, key);
        let mut ctx = SyncContext {
            gateway,
            config,
            state: &mut stream_state,
            out: &mut tracker,
        };
        let summary = driver.sync(&mut ctx).await?;
        (summary, tracker.into_bookmark())
    } else {
        let mut ctx = SyncContext { gateway, config, state: &mut stream_state, out };
        (driver.sync(&mut ctx).await?, None)
    };

    if let Some(candidate) = bookmark {
        advance_bookmark(&mut stream_state, candidate);
    }

    state.set_stream(name, stream_state);
    state_store.write(state)?;
    out.write_state(state)?;

    info!(stream = name, records = summary.records, "stream sync complete");
    Ok(())
}

/// Move a record-derived bookmark forward, never backward. Numeric
/// bookmarks belong to the unix-cursor drivers, which manage their own
/// state; they are left alone here.
fn advance_bookmark(state: &mut StreamState, candidate: Value) {
    let should_advance = match (&state.replication_key_value, &candidate) {
        (None, _) => true,
        (Some(Value::String(current)), Value::String(new_value)) => new_value > current,
        _ => false,
    };
    if should_advance {
        state.replication_key_value = Some(candidate);
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for the runner.
    use serde_json::json;
    use tempfile::tempdir;
    use vendit_core::testing::{CollectingWriter, ScriptedGateway};

    use super::*;

    #[test]
    fn test_advance_bookmark_moves_forward_only() {
        let mut state = StreamState::default();

        advance_bookmark(&mut state, json!("2024-02-01T00:00:00"));
        assert_eq!(state.replication_key_value, Some(json!("2024-02-01T00:00:00")));

        // Older candidate does not move the bookmark back
        advance_bookmark(&mut state, json!("2024-01-01T00:00:00"));
        assert_eq!(state.replication_key_value, Some(json!("2024-02-01T00:00:00")));

        advance_bookmark(&mut state, json!("2024-03-01T00:00:00"));
        assert_eq!(state.replication_key_value, Some(json!("2024-03-01T00:00:00")));
    }

    #[test]
    fn test_advance_bookmark_leaves_numeric_state_alone() {
        let mut state =
            StreamState { replication_key_value: Some(json!(1_700_000_000_000_i64)) };
        advance_bookmark(&mut state, json!("2024-03-01T00:00:00"));
        assert_eq!(state.replication_key_value, Some(json!(1_700_000_000_000_i64)));
    }

    /// A full run over the registry with an idle API: every stream gets a
    /// schema and a state message, and the unix streams persist numeric
    /// checkpoints.
    #[tokio::test]
    async fn test_run_all_emits_schema_and_state_per_stream() {
        let gateway = ScriptedGateway::new();
        // Every request answers `200 {}`: empty Find results, empty items.
        let dir = tempdir().unwrap();
        let state_store = FileStateStore::new(dir.path().join("state.json"));
        let config = ConnectorConfig::with_credentials("https://api.test", "u", "p", "k");
        let mut out = CollectingWriter::default();

        run_all(&config, &gateway, &state_store, &mut out).await.unwrap();

        assert_eq!(out.schemas.len(), 7);
        assert_eq!(out.states.len(), 7);

        let persisted = state_store.read();
        for stream in ["supplier_products", "purchase_orders_optiply", "orders_optiply"] {
            let value = persisted.stream(stream).replication_key_value;
            assert!(value.as_ref().and_then(Value::as_i64).is_some(), "stream {stream}");
        }
        // Timestamp streams saw no records, so no bookmark was derived
        assert_eq!(persisted.stream("products").replication_key_value, None);
    }

    /// Records flowing through the tracker advance the persisted bookmark
    /// to the maximum replication-key value of the run.
    #[tokio::test]
    async fn test_run_all_derives_bookmark_from_records() {
        let gateway = ScriptedGateway::new();
        // products: Find page (short) then one GetMultiple batch
        gateway.push_json(200, json!({ "results": ["1", "2"] }));
        gateway.push_json(
            200,
            json!({ "items": [
                { "productId": 1, "lastModified": "2024-04-02T08:00:00" },
                { "productId": 2, "lastModified": "2024-04-01T08:00:00" },
            ]}),
        );

        let dir = tempdir().unwrap();
        let state_store = FileStateStore::new(dir.path().join("state.json"));
        let config = ConnectorConfig::with_credentials("https://api.test", "u", "p", "k");
        let mut out = CollectingWriter::default();

        run_all(&config, &gateway, &state_store, &mut out).await.unwrap();

        let persisted = state_store.read();
        assert_eq!(
            persisted.stream("products").replication_key_value,
            Some(json!("2024-04-02T08:00:00"))
        );
    }
}
