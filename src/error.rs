//! Error types for portal-access
//!
//! Only boundary work (decoding payloads, reading config) can fail. The
//! resolver, selector, tree and evaluator are total over their inputs.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("invalid payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("invalid id '{0}'")]
    InvalidId(String),

    #[error("invalid config: {0}")]
    Config(String),

    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias for portal-access operations
pub type Result<T> = std::result::Result<T, AccessError>;
