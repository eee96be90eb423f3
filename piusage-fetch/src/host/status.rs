//! Status page polling for provider health (statuspage.io format).

use chrono::{DateTime, Utc};
use piusage_core::{ProviderKind, ProviderStatus, StatusIndicator};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use super::http::HttpClient;
use crate::error::StatusError;

// ============================================================================
// Statuspage.io Response Types
// ============================================================================

/// Response from the statuspage.io `/api/v2/status.json` endpoint.
#[derive(Debug, Deserialize)]
struct StatuspageStatus {
    status: StatuspageIndicator,
    #[serde(default)]
    page: Option<StatuspagePage>,
}

#[derive(Debug, Deserialize)]
struct StatuspageIndicator {
    indicator: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct StatuspagePage {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
}

impl StatuspageStatus {
    fn into_status(self) -> ProviderStatus {
        let indicator = StatusIndicator::from_statuspage(&self.status.indicator);
        let (url, updated_at) = match self.page {
            Some(page) => (page.url, page.updated_at),
            None => (None, None),
        };
        let updated_at = updated_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map_or_else(Utc::now, |dt| dt.with_timezone(&Utc));
        let description = if self.status.description.is_empty() {
            indicator.label().to_string()
        } else {
            self.status.description
        };

        ProviderStatus {
            indicator,
            description,
            updated_at,
            url,
        }
    }
}

// ============================================================================
// Status Poller
// ============================================================================

/// Polls provider status pages.
#[derive(Debug, Clone)]
pub struct StatusPoller {
    client: HttpClient,
}

impl StatusPoller {
    /// Creates a status poller over an HTTP client.
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    /// Fetches status from a statuspage.io-compatible endpoint.
    #[instrument(skip(self), fields(url = %status_url))]
    pub async fn fetch_status(&self, status_url: &str) -> Result<ProviderStatus, StatusError> {
        let data: StatuspageStatus = self
            .client
            .get_json(status_url, None, &[])
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to fetch status"))?;

        let status = data.into_status();
        debug!(indicator = ?status.indicator, description = %status.description, "Status fetched");
        Ok(status)
    }

    /// Fetches the status page of a provider.
    pub async fn fetch_provider(&self, kind: ProviderKind) -> Result<ProviderStatus, StatusError> {
        let url = kind
            .status_page_url()
            .ok_or_else(|| StatusError::NoStatusPage(kind.display_name().to_string()))?;
        self.fetch_status(url).await
    }
}
