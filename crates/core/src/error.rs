//! Error types for cosfs-core
//!
//! Every adapter operation returns this error on failure so callers can tell a
//! missing object apart from a transport problem without scraping logs.

use thiserror::Error;

/// Result type alias for cosfs-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for cosfs-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid logical path
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Object or key does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network, HTTP or service failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// A response that could not be interpreted
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Batch delete where some keys were not removed
    #[error("Batch delete failed for {} of {} key(s)", failed.len(), failed.len() + deleted.len())]
    PartialBatchFailure {
        deleted: Vec<String>,
        failed: Vec<String>,
    },

    /// Copy succeeded but the source could not be removed afterwards
    #[error("Copied {from} to {to} but failed to delete the source: {reason}")]
    PartialRename {
        from: String,
        to: String,
        reason: String,
    },

    /// Visibility string other than "public" or "private"
    #[error("Invalid visibility: {0}")]
    InvalidVisibility(String),

    /// Expiration that cannot be parsed or lies in the past
    #[error("Invalid expiration: {0}")]
    InvalidExpiration(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Error {
    /// Whether this error means the object is absent
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Get the appropriate exit code for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidPath(_)
            | Error::Config(_)
            | Error::InvalidVisibility(_)
            | Error::InvalidExpiration(_) => 2, // UsageError
            Error::Transport(_) => 3,           // NetworkError
            Error::NotFound(_) => 5,            // NotFound
            Error::PartialBatchFailure { .. } | Error::PartialRename { .. } => 6, // Conflict
            _ => 1,                             // GeneralError
        }
    }
}
