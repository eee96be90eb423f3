//! Fetch context shared by all provider fetchers of one command.

use std::time::Duration;

use crate::error::FetchError;
use crate::fanout::with_timeout;
use crate::host::{http::HttpClient, status::StatusPoller};

/// Default ceiling for a whole fetch group.
pub const DEFAULT_GROUP_TIMEOUT: Duration = Duration::from_secs(12);

// ============================================================================
// Fetch Settings
// ============================================================================

/// Timing settings for fetch operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchSettings {
    /// Timeout of each HTTP call.
    pub call_timeout: Duration,
    /// Ceiling for a fan-out group.
    pub group_timeout: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            call_timeout: crate::host::http::DEFAULT_TIMEOUT,
            group_timeout: DEFAULT_GROUP_TIMEOUT,
        }
    }
}

// ============================================================================
// Fetch Context
// ============================================================================

/// HTTP client plus timing settings.
#[derive(Debug, Clone)]
pub struct FetchContext {
    /// HTTP client restricted to provider hosts.
    pub http: HttpClient,
    /// Timing settings.
    pub settings: FetchSettings,
}

impl FetchContext {
    /// Creates a context with a provider-restricted client.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built.
    pub fn new(settings: FetchSettings) -> Result<Self, FetchError> {
        Ok(Self {
            http: HttpClient::for_providers(settings.call_timeout)?,
            settings,
        })
    }

    /// Creates a context over an existing client.
    pub fn with_client(http: HttpClient, settings: FetchSettings) -> Self {
        Self { http, settings }
    }

    /// A status poller sharing this context's client.
    pub fn status_poller(&self) -> StatusPoller {
        StatusPoller::new(self.http.clone())
    }

    /// GETs JSON under the per-call timeout.
    pub async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        bearer: Option<&str>,
        headers: &[(&str, &str)],
    ) -> Result<T, FetchError> {
        with_timeout(
            self.settings.call_timeout,
            self.http.get_json(url, bearer, headers),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_client_keeps_allowlist() {
        let settings = FetchSettings {
            call_timeout: Duration::from_secs(1),
            group_timeout: Duration::from_secs(2),
        };
        let http = HttpClient::with_timeout(settings.call_timeout)
            .unwrap()
            .allow_domains(vec!["z.ai".to_string()]);
        let ctx = FetchContext::with_client(http, settings);
        assert_eq!(ctx.settings, settings);

        let err = ctx
            .get_json::<serde_json::Value>("https://example.com/", None, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::DomainNotAllowed(_)));
    }
}
