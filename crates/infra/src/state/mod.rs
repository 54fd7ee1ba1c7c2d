//! Sync-state persistence
//!
//! Per-stream bookmarks carried between runs as a JSON file. A missing or
//! malformed file starts the connector from scratch, which only costs a
//! re-extraction, never data loss.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use vendit_domain::{ConnectorError, Result, SyncState};

/// JSON-file-backed sync state store.
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    /// Create a store backed by the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted state, or an empty one when the file is missing
    /// or unreadable.
    #[must_use]
    pub fn read(&self) -> SyncState {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "no sync state file, starting fresh");
                return SyncState::default();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(state) => state,
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "malformed sync state file, starting fresh"
                );
                SyncState::default()
            }
        }
    }

    /// Persist the state. Unlike token persistence this failure is
    /// surfaced: losing bookmarks silently would re-extract everything on
    /// every run.
    pub fn write(&self, state: &SyncState) -> Result<()> {
        let serialized = serde_json::to_string_pretty(state)
            .map_err(|e| ConnectorError::State(format!("failed to serialize sync state: {e}")))?;
        std::fs::write(&self.path, serialized).map_err(|e| {
            ConnectorError::State(format!(
                "failed to write sync state to {}: {e}",
                self.path.display()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for the state store.
    use serde_json::json;
    use tempfile::tempdir;
    use vendit_domain::StreamState;

    use super::*;

    #[test]
    fn test_missing_file_starts_fresh() {
        let dir = tempdir().unwrap();
        let store = FileStateStore::new(dir.path().join("state.json"));
        assert_eq!(store.read(), SyncState::default());
    }

    #[test]
    fn test_malformed_file_starts_fresh() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "not json at all").unwrap();

        let store = FileStateStore::new(&path);
        assert_eq!(store.read(), SyncState::default());
    }

    #[test]
    fn test_write_then_read_roundtrip() {
        let dir = tempdir().unwrap();
        let store = FileStateStore::new(dir.path().join("state.json"));

        let mut state = SyncState::default();
        state.set_stream(
            "supplier_products",
            StreamState { replication_key_value: Some(json!(1_700_000_000_000_i64)) },
        );
        state.set_stream(
            "products",
            StreamState { replication_key_value: Some(json!("2024-05-01T10:00:00")) },
        );

        store.write(&state).unwrap();
        assert_eq!(store.read(), state);
    }

    #[test]
    fn test_write_to_invalid_path_errors() {
        let store = FileStateStore::new("/nonexistent-dir/state.json");
        let err = store.write(&SyncState::default()).unwrap_err();
        assert!(matches!(err, ConnectorError::State(_)));
    }
}
