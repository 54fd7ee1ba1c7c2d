//! # Vendit Infra
//!
//! Infrastructure adapters for the connector:
//! - Token store and authenticator for the vendor's token endpoint
//! - HTTP request gateway with auth injection and 401 retry
//! - JSON-lines record emitter
//! - Sync-state file store
//! - Configuration loader

pub mod auth;
pub mod config;
pub mod emit;
pub mod http;
pub mod state;

pub use auth::{AuthError, Authenticator, TokenStore};
pub use emit::JsonLinesWriter;
pub use http::VenditGateway;
pub use state::FileStateStore;
