//! Usage-related types.
//!
//! - [`UsageSnapshot`] - Normalized result of one provider fetch
//! - [`RateWindow`] - One quota period

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::provider::ProviderKind;
use crate::error::CoreError;

/// Error text for an OAuth provider with no stored credential.
pub const NO_CREDENTIALS: &str = "no credentials";

/// Error text for an API-key provider with no key configured.
pub const NO_API_KEY: &str = "no api key";

// ============================================================================
// Usage Snapshot
// ============================================================================

/// The `{windows, plan, error}` shape every provider fetch is normalized to.
///
/// Snapshots are derived per fetch and never persisted. A failed fetch still
/// yields a snapshot, carrying the failure in [`UsageSnapshot::error`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    /// Provider this snapshot belongs to.
    pub provider: ProviderKind,
    /// Display name shown in panels.
    pub display_name: String,
    /// Credential key the snapshot was fetched with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_key: Option<String>,
    /// Zero or more rate windows.
    #[serde(default)]
    pub windows: Vec<RateWindow>,
    /// Plan or balance description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
    /// Account email, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Inline error text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When the fetch completed.
    pub updated_at: DateTime<Utc>,
}

impl UsageSnapshot {
    /// Creates an empty snapshot for a provider.
    pub fn new(provider: ProviderKind) -> Self {
        Self {
            provider,
            display_name: provider.display_name().to_string(),
            account_key: None,
            windows: Vec::new(),
            plan: None,
            email: None,
            error: None,
            updated_at: Utc::now(),
        }
    }

    /// Creates a snapshot that only carries an error.
    pub fn with_error(provider: ProviderKind, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(provider)
        }
    }

    /// Sets the credential key this snapshot was fetched with.
    #[must_use]
    pub fn for_account(mut self, key: impl Into<String>) -> Self {
        self.account_key = Some(key.into());
        self
    }

    /// Appends a window.
    pub fn push_window(&mut self, window: RateWindow) {
        self.windows.push(window);
    }

    /// Returns true if any window data is present.
    pub fn has_data(&self) -> bool {
        !self.windows.is_empty()
    }

    /// Returns the highest usage percentage across all windows.
    pub fn max_used_percent(&self) -> f64 {
        self.windows
            .iter()
            .map(|w| w.used_percent)
            .fold(0.0_f64, f64::max)
    }

    /// True when the snapshot only reports a missing credential.
    ///
    /// Such snapshots are hidden from usage lists. Any other error, even
    /// with zero windows, stays visible.
    pub fn is_unconfigured(&self) -> bool {
        self.windows.is_empty()
            && self.plan.is_none()
            && matches!(self.error.as_deref(), Some(NO_CREDENTIALS | NO_API_KEY))
    }

    /// Validates the snapshot data.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidData` if any window has a percentage
    /// outside [0, 100] or one that is not finite.
    pub fn validate(&self) -> Result<(), CoreError> {
        for window in &self.windows {
            window
                .validate()
                .map_err(|e| CoreError::InvalidData(format!("{} window: {e}", window.label)))?;
        }
        Ok(())
    }

    /// Clamps every window to valid ranges instead of failing.
    pub fn sanitize(&mut self) {
        for window in &mut self.windows {
            window.sanitize();
        }
    }
}

// ============================================================================
// Rate Window
// ============================================================================

/// A provider-defined quota period (5-hour, weekly, monthly, per-model).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateWindow {
    /// Short label ("5h", "Week", "Opus").
    pub label: String,
    /// Percentage of quota used (0-100).
    pub used_percent: f64,
    /// When this window resets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resets_at: Option<DateTime<Utc>>,
}

impl RateWindow {
    /// Creates a window without a reset time.
    pub fn new(label: impl Into<String>, used_percent: f64) -> Self {
        Self {
            label: label.into(),
            used_percent,
            resets_at: None,
        }
    }

    /// Sets the reset time.
    #[must_use]
    pub fn resetting_at(mut self, resets_at: Option<DateTime<Utc>>) -> Self {
        self.resets_at = resets_at;
        self
    }

    /// Returns time until reset, if known. Negative once the reset has passed.
    pub fn time_until_reset(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.resets_at.map(|reset| reset - now)
    }

    /// Validates the window data.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidData` if `used_percent` is negative,
    /// greater than 100, or not a finite number.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.used_percent.is_finite() {
            return Err(CoreError::InvalidData(
                "used_percent is not a finite number".to_string(),
            ));
        }
        if self.used_percent < 0.0 || self.used_percent > 100.0 {
            return Err(CoreError::InvalidData(format!(
                "used_percent {} out of valid range [0, 100]",
                self.used_percent
            )));
        }
        Ok(())
    }

    /// Clamps `used_percent` to [0, 100], replacing NaN/Infinity with 0.
    pub fn sanitize(&mut self) {
        if !self.used_percent.is_finite() {
            self.used_percent = 0.0;
        }
        self.used_percent = self.used_percent.clamp(0.0, 100.0);
    }
}
