//! Error types used throughout the connector

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the Vendit connector
#[derive(Error, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum ConnectorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("State error: {0}")]
    State(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for connector operations
pub type Result<T> = std::result::Result<T, ConnectorError>;
