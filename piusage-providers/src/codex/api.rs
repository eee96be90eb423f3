//! ChatGPT backend client for Codex usage.
//!
//! # Endpoints
//!
//! ```text
//! GET https://chatgpt.com/backend-api/wham/usage
//! Authorization: Bearer <access_token>
//! ChatGPT-Account-Id: <account_id>
//!
//! GET https://api.openai.com/v1/me
//! ```
//!
//! # Usage Response
//!
//! ```json
//! {
//!   "plan_type": "plus",
//!   "rate_limit": {
//!     "primary_window": {
//!       "used_percent": 12,
//!       "limit_window_seconds": 18000,
//!       "reset_after_seconds": 4200,
//!       "reset_at": 1767225600
//!     },
//!     "secondary_window": { ... }
//!   },
//!   "credits": {"has_credits": true, "balance": "12.50"}
//! }
//! ```

use chrono::{DateTime, Duration, Utc};
use piusage_core::{ProviderKind, RateWindow, UsageSnapshot};
use piusage_fetch::{FetchContext, FetchError};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::fetcher::plan_name;

// ============================================================================
// Constants
// ============================================================================

/// ChatGPT backend base URL.
pub const CHATGPT_BASE_URL: &str = "https://chatgpt.com/backend-api";

/// Usage endpoint under the ChatGPT backend.
pub const USAGE_ENDPOINT: &str = "/wham/usage";

/// OpenAI identity endpoint.
pub const ME_URL: &str = "https://api.openai.com/v1/me";

/// Header carrying the ChatGPT account id.
pub const ACCOUNT_ID_HEADER: &str = "ChatGPT-Account-Id";

const FIVE_HOURS_SECS: i64 = 5 * 3600;
const WEEK_SECS: i64 = 7 * 86_400;

// ============================================================================
// API Response Structures
// ============================================================================

/// Response from the usage endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WhamUsageResponse {
    /// Subscription plan, e.g. `plus` or `pro`.
    #[serde(default)]
    pub plan_type: Option<String>,
    /// Rate limit windows.
    #[serde(default)]
    pub rate_limit: Option<RateLimit>,
    /// Prepaid credits.
    #[serde(default)]
    pub credits: Option<Credits>,
}

/// The `rate_limit` object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RateLimit {
    /// Short window, normally 5 hours.
    #[serde(default)]
    pub primary_window: Option<WhamWindow>,
    /// Long window, normally one week.
    #[serde(default)]
    pub secondary_window: Option<WhamWindow>,
}

/// One rate limit window.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WhamWindow {
    /// Used percentage (0-100).
    #[serde(default)]
    pub used_percent: Option<f64>,
    /// Window length in seconds.
    #[serde(default)]
    pub limit_window_seconds: Option<i64>,
    /// Seconds until the window resets.
    #[serde(default)]
    pub reset_after_seconds: Option<i64>,
    /// Reset time as epoch seconds.
    #[serde(default)]
    pub reset_at: Option<i64>,
}

/// The `credits` object. `balance` arrives as a string or a number.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Credits {
    /// Remaining balance in dollars.
    #[serde(default)]
    pub balance: Option<Value>,
}

impl Credits {
    /// Balance as a number.
    pub fn balance(&self) -> Option<f64> {
        match self.balance.as_ref()? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Response from `/v1/me`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MeResponse {
    /// Account email.
    #[serde(default)]
    pub email: Option<String>,
}

impl WhamWindow {
    /// Reset time: `reset_at`, else `now + reset_after_seconds`.
    pub fn resets_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.reset_at
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .or_else(|| {
                self.reset_after_seconds
                    .map(|secs| now + Duration::seconds(secs))
            })
    }
}

/// Label for a window of `seconds` length.
///
/// 5 hours is "5h" and 7 days is "Week"; other whole days are "<n>d",
/// everything else is rounded to hours.
pub fn window_label(seconds: i64) -> String {
    match seconds {
        FIVE_HOURS_SECS => "5h".to_string(),
        WEEK_SECS => "Week".to_string(),
        s if s > 0 && s % 86_400 == 0 => format!("{}d", s / 86_400),
        s => format!("{}h", ((s as f64) / 3600.0).round().max(1.0) as i64),
    }
}

// ============================================================================
// API Client
// ============================================================================

/// Client for the ChatGPT usage endpoint.
#[derive(Debug, Clone)]
pub struct CodexApiClient {
    base_url: String,
    me_url: String,
}

impl Default for CodexApiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl CodexApiClient {
    /// Creates a client for the production endpoints.
    pub fn new() -> Self {
        Self {
            base_url: CHATGPT_BASE_URL.to_string(),
            me_url: ME_URL.to_string(),
        }
    }

    /// Creates a client with custom endpoints.
    pub fn with_urls(base_url: impl Into<String>, me_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            me_url: me_url.into(),
        }
    }

    /// Fetches usage. 401 and 403 mean the token expired.
    #[instrument(skip(self, ctx, access_token))]
    pub async fn fetch_usage(
        &self,
        ctx: &FetchContext,
        access_token: &str,
        account_id: Option<&str>,
    ) -> Result<WhamUsageResponse, FetchError> {
        let url = format!("{}{}", self.base_url, USAGE_ENDPOINT);
        debug!(url = %url, has_account = account_id.is_some(), "Fetching Codex usage");

        let headers: Vec<(&str, &str)> = account_id
            .map(|id| (ACCOUNT_ID_HEADER, id))
            .into_iter()
            .collect();
        ctx.get_json(&url, Some(access_token), &headers)
            .await
            .map_err(|e| e.auth_statuses(&[401, 403]))
    }

    /// Looks up the account email.
    #[instrument(skip(self, ctx, access_token))]
    pub async fn fetch_email(
        &self,
        ctx: &FetchContext,
        access_token: &str,
    ) -> Result<Option<String>, FetchError> {
        let me: MeResponse = ctx.get_json(&self.me_url, Some(access_token), &[]).await?;
        Ok(me.email.filter(|e| !e.is_empty()))
    }
}

// ============================================================================
// Conversion to Core Types
// ============================================================================

impl WhamUsageResponse {
    /// Converts the response into a snapshot.
    pub fn to_snapshot(&self, now: DateTime<Utc>) -> UsageSnapshot {
        let mut snapshot = UsageSnapshot::new(ProviderKind::Codex);

        if let Some(limits) = &self.rate_limit {
            let windows = [
                (&limits.primary_window, FIVE_HOURS_SECS),
                (&limits.secondary_window, WEEK_SECS),
            ];
            for (window, default_secs) in windows {
                let Some(window) = window else { continue };
                let label = window_label(window.limit_window_seconds.unwrap_or(default_secs));
                snapshot.push_window(
                    RateWindow::new(label, window.used_percent.unwrap_or(0.0))
                        .resetting_at(window.resets_at(now)),
                );
            }
        }

        let plan = self
            .plan_type
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(plan_name);
        let balance = self.credits.as_ref().and_then(Credits::balance);
        snapshot.plan = match (plan, balance) {
            (Some(plan), Some(balance)) => Some(format!("{plan} (${balance:.2} credits)")),
            (Some(plan), None) => Some(plan),
            (None, Some(balance)) => Some(format!("${balance:.2} credits")),
            (None, None) => None,
        };

        snapshot
    }
}

// ============================================================================
// Tests
// ============================================================================
