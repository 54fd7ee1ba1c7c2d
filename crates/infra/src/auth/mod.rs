//! Token-based authentication for the Vendit API
//!
//! The authenticator owns the access-token lifecycle: validity checks,
//! acquisition, refresh-with-retry and header construction. Tokens are
//! persisted through the token store so a restarted process can resume
//! with a still-valid token.

mod authenticator;
mod store;

pub use authenticator::{AuthError, Authenticator};
pub use store::{StoredToken, TokenStore};
