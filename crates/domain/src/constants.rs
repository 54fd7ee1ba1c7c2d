//! Vendor API constants shared across the sync engine

/// Page size used by the offset-paginated Find endpoints.
///
/// The offset advances by this fixed amount per page regardless of how many
/// results the page actually carried (the vendor's offset semantics are
/// page-size-based, not result-count-based).
pub const FIND_PAGE_SIZE: usize = 100;

/// Maximum number of primary keys per GetMultiple request.
pub const GET_MULTIPLE_BATCH_SIZE: usize = 100;

/// Safety margin before token expiry. A token with less remaining lifetime
/// than this is treated as invalid so it cannot expire mid-request.
pub const TOKEN_EXPIRY_MARGIN_SECS: i64 = 120;

/// Vendor column id for the "last modified" field in Find filters.
pub const LAST_MODIFIED_FIELD: i64 = 204;

/// Vendor comparison code for "greater than or equal".
pub const FILTER_GREATER_OR_EQUAL: i64 = 2;

/// Timestamp format expected by Find filter values.
pub const FIND_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S.000";

/// Default floor for unix-millisecond cursors: 2022-01-01T00:00:00Z.
pub const DEFAULT_UNIX_FLOOR_MS: i64 = 1_640_995_200_000;

/// Synthetic cursor field stamped onto records of unix-cursor streams.
pub const UNIX_TIMESTAMP_FIELD: &str = "unix_timestamp";
