//! Provider status page types.
//!
//! - [`ProviderStatus`] - Service health information
//! - [`StatusIndicator`] - Status levels

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Provider Status
// ============================================================================

/// Provider service status from a statuspage.io page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderStatus {
    /// Status indicator level.
    pub indicator: StatusIndicator,
    /// Human-readable status description.
    pub description: String,
    /// When this status was fetched.
    pub updated_at: DateTime<Utc>,
    /// URL of the status page.
    pub url: Option<String>,
}

impl ProviderStatus {
    /// Creates a new status with the given indicator and description.
    pub fn new(indicator: StatusIndicator, description: impl Into<String>) -> Self {
        Self {
            indicator,
            description: description.into(),
            updated_at: Utc::now(),
            url: None,
        }
    }

    /// Status used when the page could not be read.
    pub fn unknown(reason: impl Into<String>) -> Self {
        Self::new(StatusIndicator::Unknown, reason)
    }

    /// Returns true if the service is fully operational.
    pub fn is_operational(&self) -> bool {
        self.indicator == StatusIndicator::None
    }

    /// Returns true if there's any degradation or outage.
    pub fn has_issues(&self) -> bool {
        !matches!(self.indicator, StatusIndicator::None | StatusIndicator::Unknown)
    }
}

// ============================================================================
// Status Indicator
// ============================================================================

/// Status indicator levels used by statuspage.io.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StatusIndicator {
    /// Operational.
    #[default]
    None,
    /// Degraded performance.
    Minor,
    /// Partial outage.
    Major,
    /// Major outage.
    Critical,
    /// Scheduled maintenance.
    Maintenance,
    /// Status unknown.
    Unknown,
}

impl StatusIndicator {
    /// Parses the `status.indicator` string of a statuspage response.
    pub fn from_statuspage(indicator: &str) -> Self {
        match indicator {
            "none" => Self::None,
            "minor" => Self::Minor,
            "major" => Self::Major,
            "critical" => Self::Critical,
            "maintenance" => Self::Maintenance,
            _ => Self::Unknown,
        }
    }

    /// Returns a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::None => "Operational",
            Self::Minor => "Degraded",
            Self::Major => "Partial Outage",
            Self::Critical => "Major Outage",
            Self::Maintenance => "Under Maintenance",
            Self::Unknown => "Unknown",
        }
    }

    /// Single-character marker used in panels.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::None => "●",
            Self::Minor | Self::Maintenance => "◐",
            Self::Major | Self::Critical => "○",
            Self::Unknown => "?",
        }
    }
}

impl std::fmt::Display for StatusIndicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
