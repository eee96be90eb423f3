//! Core error types for `piusage`.

use thiserror::Error;

/// Core error type for `piusage` operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Provider not known to this build.
    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    /// Invalid data from an API response.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
