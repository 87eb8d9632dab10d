// Error types for butler.
// Covers Jenkins API errors, profile store errors, and general application errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ButlerError {
    #[error("Jenkins API error: {0}")]
    Api(#[from] reqwest::Error),

    #[error("Authentication failed for {0}")]
    Unauthorized(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Unknown account: {0}")]
    UnknownAccount(String),

    #[error("Account already exists: {0}")]
    DuplicateAccount(String),

    #[error("Could not determine a config directory")]
    NoConfigDir,

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ButlerError>;
