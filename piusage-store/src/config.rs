//! piusage configuration.
//!
//! Read from `<agent dir>/piusage.json`. Every field is optional; a missing
//! or invalid file yields the defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use piusage_core::{CostPeriod, ProviderKind};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::persistence::{default_config_path, load_json_or_default};

/// Longest accepted timeout, seconds.
pub const MAX_TIMEOUT_SECS: u64 = 120;

/// User configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageConfig {
    /// Timeout of each provider HTTP call, seconds.
    pub fetch_timeout_secs: u64,
    /// Ceiling for a whole fan-out group, seconds.
    pub group_timeout_secs: u64,
    /// Width of usage bars, cells.
    pub bar_width: usize,
    /// Show provider status page health.
    pub show_status: bool,
    /// Providers shown in the usage panel.
    pub providers: Vec<ProviderKind>,
    /// Tab the cost panel opens on.
    pub cost_default_tab: CostPeriod,
}

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: 8,
            group_timeout_secs: 12,
            bar_width: 20,
            show_status: true,
            providers: ProviderKind::all().to_vec(),
            cost_default_tab: CostPeriod::Week,
        }
    }
}

impl UsageConfig {
    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        default_config_path()
    }

    /// Loads the configuration, falling back to defaults.
    pub async fn load(path: &Path) -> Self {
        let mut config: Self = load_json_or_default(path).await;
        if let Err(e) = config.validate() {
            warn!(path = %path.display(), error = %e, "Invalid configuration, using defaults where needed");
        }
        config.sanitize();
        debug!(path = %path.display(), ?config, "Loaded configuration");
        config
    }

    /// Checks values that would make fetching or rendering impossible.
    ///
    /// # Errors
    ///
    /// `StoreError::Config` for timeouts outside `1..=MAX_TIMEOUT_SECS` or
    /// an empty provider list.
    pub fn validate(&self) -> Result<(), StoreError> {
        let range = 1..=MAX_TIMEOUT_SECS;
        if !range.contains(&self.fetch_timeout_secs) || !range.contains(&self.group_timeout_secs) {
            return Err(StoreError::Config(format!(
                "timeouts must be between 1 and {MAX_TIMEOUT_SECS} seconds"
            )));
        }
        if self.providers.is_empty() {
            return Err(StoreError::Config("no providers enabled".to_string()));
        }
        Ok(())
    }

    /// Replaces invalid values with defaults.
    pub fn sanitize(&mut self) {
        let defaults = Self::default();
        if self.fetch_timeout_secs == 0 {
            self.fetch_timeout_secs = defaults.fetch_timeout_secs;
        }
        if self.group_timeout_secs == 0 {
            self.group_timeout_secs = defaults.group_timeout_secs;
        }
        self.fetch_timeout_secs = self.fetch_timeout_secs.min(MAX_TIMEOUT_SECS);
        self.group_timeout_secs = self.group_timeout_secs.min(MAX_TIMEOUT_SECS);
        if self.group_timeout_secs < self.fetch_timeout_secs {
            self.group_timeout_secs = self.fetch_timeout_secs;
        }
        self.bar_width = self.bar_width.clamp(4, 60);
        if self.providers.is_empty() {
            self.providers = defaults.providers;
        }
        let mut seen = Vec::with_capacity(self.providers.len());
        self.providers.retain(|p| {
            let fresh = !seen.contains(p);
            seen.push(*p);
            fresh
        });
    }

    /// Per-call timeout.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Fan-out group ceiling.
    pub fn group_timeout(&self) -> Duration {
        Duration::from_secs(self.group_timeout_secs)
    }

    /// True if `kind` is enabled.
    pub fn is_enabled(&self, kind: ProviderKind) -> bool {
        self.providers.contains(&kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: UsageConfig = serde_json::from_str(r#"{"bar_width": 30}"#).unwrap();
        assert_eq!(config.bar_width, 30);
        assert_eq!(config.fetch_timeout_secs, 8);
        assert_eq!(config.providers.len(), 3);
    }

    #[test]
    fn test_sanitize() {
        let mut config = UsageConfig {
            fetch_timeout_secs: 10,
            group_timeout_secs: 0,
            bar_width: 500,
            providers: vec![ProviderKind::Zai, ProviderKind::Zai],
            ..UsageConfig::default()
        };
        config.sanitize();
        assert_eq!(config.group_timeout_secs, 12);
        assert_eq!(config.bar_width, 60);
        assert_eq!(config.providers, vec![ProviderKind::Zai]);
    }

    #[test]
    fn test_validate() {
        assert!(UsageConfig::default().validate().is_ok());
        let config = UsageConfig {
            providers: Vec::new(),
            ..UsageConfig::default()
        };
        assert!(config.validate().is_err());
        let config = UsageConfig {
            group_timeout_secs: MAX_TIMEOUT_SECS + 1,
            ..UsageConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sanitize_caps_huge_timeouts() {
        let mut config = UsageConfig {
            fetch_timeout_secs: u64::MAX,
            group_timeout_secs: u64::MAX,
            ..UsageConfig::default()
        };
        config.sanitize();
        assert_eq!(config.fetch_timeout_secs, MAX_TIMEOUT_SECS);
        assert_eq!(config.group_timeout_secs, MAX_TIMEOUT_SECS);
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_load_caps_huge_timeouts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("piusage.json");
        std::fs::write(&path, r#"{"fetch_timeout_secs": 18446744073709551615, "group_timeout_secs": 99999999}"#)
            .unwrap();
        let config = UsageConfig::load(&path).await;
        assert_eq!(config.fetch_timeout(), Duration::from_secs(MAX_TIMEOUT_SECS));
        assert_eq!(config.group_timeout(), Duration::from_secs(MAX_TIMEOUT_SECS));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = UsageConfig::load(&dir.path().join("piusage.json")).await;
        assert_eq!(config, UsageConfig::default());
    }
}
