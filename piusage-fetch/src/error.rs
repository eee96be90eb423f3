//! Fetch error types.

use thiserror::Error;

// ============================================================================
// Main Fetch Error
// ============================================================================

/// Why a provider fetch produced no data.
///
/// Fetchers return `Result<_, FetchError>`; the conversion to the short
/// inline text shown in panels happens once, in
/// [`FetchError::snapshot_message`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// No OAuth credential is stored for the provider.
    #[error("no credentials configured")]
    NoCredentials,

    /// No API key is configured for the provider.
    #[error("no api key configured")]
    NoApiKey,

    /// The request or the whole fetch group ran out of time.
    #[error("request timed out")]
    Timeout,

    /// The provider rejected the token.
    #[error("token expired or revoked")]
    TokenExpired,

    /// Non-2xx status.
    #[error("HTTP status {0}")]
    Status(u16),

    /// Connection, DNS or TLS failure.
    #[error("network error: {0}")]
    Network(String),

    /// The body did not have the expected shape.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Request to a host outside the allowlist.
    #[error("domain not allowed: {0}")]
    DomainNotAllowed(String),
}

impl FetchError {
    /// Text attached to a usage snapshot for this error.
    pub fn snapshot_message(&self) -> String {
        match self {
            Self::NoCredentials => piusage_core::NO_CREDENTIALS.to_string(),
            Self::NoApiKey => piusage_core::NO_API_KEY.to_string(),
            Self::Timeout => "timeout".to_string(),
            Self::TokenExpired => "token expired".to_string(),
            Self::Status(code) => format!("http {code}"),
            Self::Network(_) | Self::DomainNotAllowed(_) => "network error".to_string(),
            Self::Malformed(_) => "bad response".to_string(),
        }
    }

    /// Maps the given HTTP statuses to [`FetchError::TokenExpired`].
    #[must_use]
    pub fn auth_statuses(self, codes: &[u16]) -> Self {
        match self {
            Self::Status(code) if codes.contains(&code) => Self::TokenExpired,
            other => other,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Malformed(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Status(status.as_u16())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

// ============================================================================
// Status Error
// ============================================================================

/// Error type for status page operations.
#[derive(Debug, Error)]
pub enum StatusError {
    /// Request failed.
    #[error("Status page unavailable: {0}")]
    Unavailable(#[from] FetchError),

    /// Provider has no status page.
    #[error("No status page for {0}")]
    NoStatusPage(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_messages() {
        assert_eq!(FetchError::NoCredentials.snapshot_message(), "no credentials");
        assert_eq!(FetchError::NoApiKey.snapshot_message(), "no api key");
        assert_eq!(FetchError::Timeout.snapshot_message(), "timeout");
        assert_eq!(FetchError::TokenExpired.snapshot_message(), "token expired");
        assert_eq!(FetchError::Status(500).snapshot_message(), "http 500");
        assert_eq!(
            FetchError::Malformed("x".into()).snapshot_message(),
            "bad response"
        );
    }

    #[test]
    fn test_auth_statuses() {
        assert_eq!(FetchError::Status(401).auth_statuses(&[401, 403]), FetchError::TokenExpired);
        assert_eq!(FetchError::Status(403).auth_statuses(&[401]), FetchError::Status(403));
        assert_eq!(FetchError::Timeout.auth_statuses(&[401]), FetchError::Timeout);
    }
}
