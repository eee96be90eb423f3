//! Claude OAuth API client.
//!
//! # Endpoints
//!
//! ```text
//! GET https://api.anthropic.com/api/oauth/usage
//! GET https://api.anthropic.com/api/oauth/profile
//! Authorization: Bearer <access_token>
//! anthropic-beta: oauth-2025-04-20
//! ```
//!
//! # Usage Response
//!
//! ```json
//! {
//!   "five_hour": {"utilization": 25.0, "resets_at": "2026-01-01T12:00:00Z"},
//!   "seven_day": {"utilization": 45.0, "resets_at": "2026-01-05T00:00:00Z"},
//!   "seven_day_opus": null,
//!   "seven_day_sonnet": {"utilization": 30.0, "resets_at": "2026-01-05T00:00:00Z"}
//! }
//! ```

use chrono::{DateTime, Utc};
use piusage_core::{ProviderKind, RateWindow, UsageSnapshot};
use piusage_fetch::{FetchContext, FetchError};
use serde::Deserialize;
use tracing::{debug, instrument};

// ============================================================================
// Constants
// ============================================================================

/// Base URL for the Anthropic API.
pub const API_BASE_URL: &str = "https://api.anthropic.com";

/// Usage endpoint.
pub const USAGE_ENDPOINT: &str = "/api/oauth/usage";

/// Profile endpoint.
pub const PROFILE_ENDPOINT: &str = "/api/oauth/profile";

/// Beta header required by the OAuth endpoints.
pub const OAUTH_BETA: &str = "oauth-2025-04-20";

// ============================================================================
// API Response Structures
// ============================================================================

/// Response from the usage endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UsageApiResponse {
    /// Rolling 5-hour window.
    #[serde(default)]
    pub five_hour: Option<UsageWindow>,
    /// 7-day window across all models.
    #[serde(default)]
    pub seven_day: Option<UsageWindow>,
    /// 7-day Opus window.
    #[serde(default)]
    pub seven_day_opus: Option<UsageWindow>,
    /// 7-day Sonnet window.
    #[serde(default)]
    pub seven_day_sonnet: Option<UsageWindow>,
}

/// One window of the usage response.
#[derive(Debug, Clone, Deserialize)]
pub struct UsageWindow {
    /// Used percentage (0-100).
    #[serde(default)]
    pub utilization: Option<f64>,
    /// When the window resets (RFC 3339).
    #[serde(default)]
    pub resets_at: Option<String>,
}

impl UsageWindow {
    /// Parses the reset timestamp.
    pub fn resets_at(&self) -> Option<DateTime<Utc>> {
        self.resets_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    fn to_window(&self, label: &str) -> RateWindow {
        let mut window =
            RateWindow::new(label, self.utilization.unwrap_or(0.0)).resetting_at(self.resets_at());
        window.sanitize();
        window
    }
}

/// Response from the profile endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileResponse {
    /// Account section.
    #[serde(default)]
    pub account: Option<ProfileAccount>,
    /// Organization section.
    #[serde(default)]
    pub organization: Option<ProfileOrganization>,
}

/// Account part of the profile.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileAccount {
    /// Login email.
    #[serde(default)]
    pub email_address: Option<String>,
    /// Older field name for the email.
    #[serde(default)]
    pub email: Option<String>,
}

/// Organization part of the profile.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileOrganization {
    /// Subscription tier, e.g. `claude_max`.
    #[serde(default)]
    pub organization_type: Option<String>,
}

impl ProfileResponse {
    /// Account email, if the profile carries one.
    pub fn email(&self) -> Option<String> {
        let account = self.account.as_ref()?;
        account
            .email_address
            .clone()
            .or_else(|| account.email.clone())
            .filter(|e| !e.is_empty())
    }

    /// Plan name derived from the organization type.
    pub fn plan(&self) -> Option<String> {
        let org_type = self.organization.as_ref()?.organization_type.as_deref()?;
        plan_from_org_type(org_type).map(str::to_string)
    }
}

/// Maps `organization_type` to a plan name.
pub fn plan_from_org_type(org_type: &str) -> Option<&'static str> {
    let lower = org_type.to_ascii_lowercase();
    if lower.contains("max") {
        Some("Max")
    } else if lower.contains("pro") {
        Some("Pro")
    } else if lower.contains("team") {
        Some("Team")
    } else if lower.contains("enterprise") {
        Some("Enterprise")
    } else {
        None
    }
}

// ============================================================================
// API Client
// ============================================================================

/// Claude API client for usage and profile data.
#[derive(Debug, Clone)]
pub struct ClaudeApiClient {
    base_url: String,
}

impl Default for ClaudeApiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ClaudeApiClient {
    /// Creates a client for the production API.
    pub fn new() -> Self {
        Self {
            base_url: API_BASE_URL.to_string(),
        }
    }

    /// Creates a client with a custom base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// Fetches the usage windows. A 401 means the token expired.
    #[instrument(skip(self, ctx, access_token))]
    pub async fn fetch_usage(
        &self,
        ctx: &FetchContext,
        access_token: &str,
    ) -> Result<UsageApiResponse, FetchError> {
        let url = format!("{}{}", self.base_url, USAGE_ENDPOINT);
        debug!(url = %url, "Fetching Claude usage");
        ctx.get_json(&url, Some(access_token), &[("anthropic-beta", OAUTH_BETA)])
            .await
            .map_err(|e| e.auth_statuses(&[401]))
    }

    /// Fetches the account profile.
    #[instrument(skip(self, ctx, access_token))]
    pub async fn fetch_profile(
        &self,
        ctx: &FetchContext,
        access_token: &str,
    ) -> Result<ProfileResponse, FetchError> {
        let url = format!("{}{}", self.base_url, PROFILE_ENDPOINT);
        ctx.get_json(&url, Some(access_token), &[("anthropic-beta", OAUTH_BETA)])
            .await
            .map_err(|e| e.auth_statuses(&[401]))
    }
}

// ============================================================================
// Conversion to Core Types
// ============================================================================

impl UsageApiResponse {
    /// Converts the response into a snapshot. Null windows are skipped.
    pub fn to_snapshot(&self) -> UsageSnapshot {
        let mut snapshot = UsageSnapshot::new(ProviderKind::Claude);
        let windows = [
            ("5h", &self.five_hour),
            ("Week", &self.seven_day),
            ("Opus", &self.seven_day_opus),
            ("Sonnet", &self.seven_day_sonnet),
        ];
        for (label, window) in windows {
            if let Some(window) = window {
                snapshot.push_window(window.to_window(label));
            }
        }
        snapshot
    }
}

// ============================================================================
// Tests
// ============================================================================
