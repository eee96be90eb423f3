//! Store error types.

use thiserror::Error;

/// Errors that can occur in the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No credential under the given key.
    #[error("Credential not found: {0}")]
    EntryNotFound(String),

    /// Key does not belong to the provider prefix.
    #[error("Credential {key} is not an entry of {prefix}")]
    PrefixMismatch {
        /// Offending key.
        key: String,
        /// Expected prefix.
        prefix: String,
    },

    /// The credential file is not a JSON object.
    #[error("Credential file is not a JSON object: {0}")]
    NotAnObject(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// Returns true if the underlying file simply does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}
