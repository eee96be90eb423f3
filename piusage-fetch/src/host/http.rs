//! HTTP client with tracing and a domain allowlist.

use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::error::FetchError;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);

/// User agent string for piusage.
const USER_AGENT: &str = concat!("piusage/", env!("CARGO_PKG_VERSION"));

/// Hosts the provider fetchers talk to.
pub const PROVIDER_DOMAINS: &[&str] = &[
    "api.anthropic.com",
    "chatgpt.com",
    "api.openai.com",
    "api.z.ai",
    "status.anthropic.com",
    "status.openai.com",
];

// ============================================================================
// HTTP Client
// ============================================================================

/// HTTP client wrapper with tracing and an optional domain allowlist.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
    allowed_domains: Option<Vec<String>>,
}

impl HttpClient {
    /// Creates a client whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Fails only if the TLS backend cannot be initialized.
    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetchError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            inner: client,
            allowed_domains: None,
        })
    }

    /// Creates a client restricted to the known provider hosts.
    pub fn for_providers(timeout: Duration) -> Result<Self, FetchError> {
        let mut client = Self::with_timeout(timeout)?;
        client.allowed_domains = Some(PROVIDER_DOMAINS.iter().map(|d| (*d).to_string()).collect());
        Ok(client)
    }

    /// Restricts requests to `domains` and their subdomains.
    #[must_use]
    pub fn allow_domains(mut self, domains: Vec<String>) -> Self {
        self.allowed_domains = Some(domains);
        self
    }

    /// Checks if a URL's domain is allowed.
    fn is_domain_allowed(&self, url: &str) -> Result<(), FetchError> {
        let Some(ref allowed) = self.allowed_domains else {
            return Ok(());
        };

        let parsed = Url::parse(url).map_err(|e| FetchError::DomainNotAllowed(e.to_string()))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| FetchError::DomainNotAllowed(url.to_string()))?;

        let allowed = allowed
            .iter()
            .any(|domain| host == domain || host.ends_with(&format!(".{domain}")));

        if allowed {
            Ok(())
        } else {
            Err(FetchError::DomainNotAllowed(host.to_string()))
        }
    }

    /// GETs `url` and decodes the JSON body.
    ///
    /// `bearer` becomes an `Authorization: Bearer` header. Non-2xx statuses
    /// are returned as [`FetchError::Status`].
    #[instrument(skip(self, bearer, headers), fields(url = %url))]
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        bearer: Option<&str>,
        headers: &[(&str, &str)],
    ) -> Result<T, FetchError> {
        self.is_domain_allowed(url)?;

        let mut request = self
            .inner
            .get(url)
            .header(header::ACCEPT, "application/json");
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request.send().await?;
        let status = response.status();
        debug!(status = %status, "Response received");

        if !status.is_success() {
            warn!(status = status.as_u16(), "Request failed");
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            debug!(error = %e, len = body.len(), "Failed to decode response");
            FetchError::Malformed(e.to_string())
        })
    }
}
