//! Domain models for piusage.
//!
//! ## Submodules
//!
//! - [`provider`] - Provider kinds and their credential-key prefixes
//! - [`credential`] - Stored credential entries
//! - [`usage`] - Usage snapshots and rate windows
//! - [`cost`] - Aggregated spend from local session logs
//! - [`status`] - Provider status page health

mod cost;
mod credential;
mod provider;
mod status;
mod usage;

// Re-export everything at the models level
pub use cost::{CostPeriod, CostReport, ModelCost, ProviderCost};
pub use credential::{CredentialEntry, CredentialKind};
pub use provider::{match_prefix, LoginMethod, PrefixMatch, ProviderKind};
pub use status::{ProviderStatus, StatusIndicator};
pub use usage::{RateWindow, UsageSnapshot, NO_API_KEY, NO_CREDENTIALS};
#[cfg(test)]
mod serde_tests;
