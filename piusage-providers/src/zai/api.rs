//! Z.AI quota API client.
//!
//! ```text
//! GET https://api.z.ai/api/monitor/usage/quota/limit
//! Authorization: Bearer <api_key>
//! ```
//!
//! ```json
//! {
//!   "code": 200,
//!   "success": true,
//!   "data": {
//!     "level": "pro",
//!     "limits": [
//!       {"type": "TOKENS_LIMIT", "percentage": 34, "nextResetTime": 1767225600000},
//!       {"type": "TIME_LIMIT", "usage": 1000, "currentValue": 120, "nextResetTime": 1769904000000}
//!     ]
//!   }
//! }
//! ```

use chrono::{DateTime, Utc};
use piusage_core::{ProviderKind, RateWindow, UsageSnapshot};
use piusage_fetch::{FetchContext, FetchError};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::fetcher::plan_name;

/// Z.AI API base URL.
pub const ZAI_API_BASE: &str = "https://api.z.ai";

/// Quota endpoint.
pub const QUOTA_ENDPOINT: &str = "/api/monitor/usage/quota/limit";

// ============================================================================
// API Response Types
// ============================================================================

/// Envelope of the quota response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuotaResponse {
    /// Present on success.
    #[serde(default)]
    pub data: Option<QuotaData>,
    /// Error message, when `data` is missing.
    #[serde(default)]
    pub msg: Option<String>,
}

/// The `data` object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuotaData {
    /// Limit entries.
    #[serde(default)]
    pub limits: Vec<QuotaLimit>,
    /// Subscription level, e.g. `lite` or `pro`.
    #[serde(default)]
    pub level: Option<String>,
}

/// One limit entry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaLimit {
    /// `TOKENS_LIMIT` or `TIME_LIMIT`.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Used percentage, when the server computes it.
    #[serde(default)]
    pub percentage: Option<f64>,
    /// Quota size.
    #[serde(default)]
    pub usage: Option<f64>,
    /// Amount used.
    #[serde(default)]
    pub current_value: Option<f64>,
    /// Reset time as epoch milliseconds or RFC 3339.
    #[serde(default)]
    pub next_reset_time: Option<Value>,
}

impl QuotaLimit {
    /// Display label for a known limit type.
    pub fn label(&self) -> Option<&'static str> {
        match self.kind.as_str() {
            "TOKENS_LIMIT" => Some("5h"),
            "TIME_LIMIT" => Some("Month"),
            _ => None,
        }
    }

    /// `percentage`, else `currentValue / usage`.
    pub fn used_percent(&self) -> Option<f64> {
        if let Some(pct) = self.percentage {
            return Some(pct);
        }
        match (self.current_value, self.usage) {
            (Some(current), Some(total)) if total > 0.0 => Some(current / total * 100.0),
            _ => None,
        }
    }

    /// Parses `nextResetTime`.
    pub fn resets_at(&self) -> Option<DateTime<Utc>> {
        match self.next_reset_time.as_ref()? {
            Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
            Value::String(s) => match s.parse::<i64>() {
                Ok(ms) => DateTime::from_timestamp_millis(ms),
                Err(_) => DateTime::parse_from_rfc3339(s)
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc)),
            },
            _ => None,
        }
    }
}

// ============================================================================
// API Client
// ============================================================================

/// Z.AI API client.
#[derive(Debug, Clone)]
pub struct ZaiApiClient {
    base_url: String,
}

impl Default for ZaiApiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ZaiApiClient {
    /// Creates a client for the production API.
    pub fn new() -> Self {
        Self {
            base_url: ZAI_API_BASE.to_string(),
        }
    }

    /// Creates a client with a custom base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// Fetches quota limits.
    #[instrument(skip(self, ctx, api_key))]
    pub async fn fetch_quota(
        &self,
        ctx: &FetchContext,
        api_key: &str,
    ) -> Result<QuotaResponse, FetchError> {
        let url = format!("{}{}", self.base_url, QUOTA_ENDPOINT);
        debug!(url = %url, "Fetching Z.AI quota");
        ctx.get_json(&url, Some(api_key), &[]).await
    }
}

// ============================================================================
// Conversion to Core Types
// ============================================================================

impl QuotaResponse {
    /// Converts the response into a snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Malformed`] when `data` is missing.
    pub fn to_snapshot(&self) -> Result<UsageSnapshot, FetchError> {
        let data = self.data.as_ref().ok_or_else(|| {
            FetchError::Malformed(self.msg.clone().unwrap_or_else(|| "missing data".into()))
        })?;

        let mut snapshot = UsageSnapshot::new(ProviderKind::Zai);
        for limit in &data.limits {
            let (Some(label), Some(used)) = (limit.label(), limit.used_percent()) else {
                debug!(kind = %limit.kind, "Skipping Z.AI limit");
                continue;
            };
            snapshot.push_window(RateWindow::new(label, used).resetting_at(limit.resets_at()));
        }
        snapshot.plan = data
            .level
            .as_deref()
            .filter(|l| !l.is_empty())
            .map(plan_name);
        Ok(snapshot)
    }
}
