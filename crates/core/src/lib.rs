//! # Vendit Core
//!
//! Pure sync-engine logic - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port/adapter interfaces (traits) for the HTTP gateway and record output
//! - The "discover identifiers" / "fetch details" extraction strategies
//! - Incremental cursor tracking (timestamp and unix-millisecond flavors)
//! - Per-entity stream drivers composed from the strategies
//!
//! ## Architecture Principles
//! - Only depends on `vendit-common` and `vendit-domain`
//! - No HTTP or filesystem code
//! - All external dependencies via traits
//! - Pure, testable sync logic

pub mod ports;
pub mod streams;
pub mod sync;
pub mod testing;

// Re-export specific items to avoid ambiguity
pub use ports::{ApiResponse, RecordWriter, RequestGateway};
pub use streams::{registry, StreamDriver, SyncContext};
pub use sync::bookmark::BookmarkingWriter;
pub use sync::cursor::{TimestampCursor, UnixCursor};
pub use sync::fetch::{BatchedFetcher, DetailFetchStrategy, IndividualFetcher};
pub use sync::find::{AllIdsSource, FindIdSource, IdentifierSource};
