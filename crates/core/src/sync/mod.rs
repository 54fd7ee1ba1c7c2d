//! Sync-engine building blocks: identifier discovery, detail fetching,
//! incremental cursors and bookmark tracking.

pub mod bookmark;
pub mod cursor;
pub mod fetch;
pub mod find;
