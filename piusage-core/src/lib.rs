// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # piusage Core
//!
//! Core types, scoring and formatting shared by every other `piusage` crate.
//!
//! - Domain models (providers, credentials, usage windows, cost reports)
//! - Error types
//! - Account recommendation scoring ([`urgency`])
//! - Relative time and number formatting ([`format`])
//! - Narrow capability traits for the agent host ([`Theme`], [`AuthStorage`])
//! - Per-session agent timing ([`SessionClock`])
//!
//! ## Key Types
//!
//! ### Provider Types
//! - [`ProviderKind`] - The providers with usage endpoints
//! - [`CredentialEntry`] - One stored OAuth token or API key
//!
//! ### Usage Types
//! - [`UsageSnapshot`] - Normalized `{windows, plan, error}` result of a fetch
//! - [`RateWindow`] - One quota period with a used percentage and reset time
//!
//! ### Cost Tracking
//! - [`CostReport`] - Aggregated spend per provider and model
//! - [`CostPeriod`] - The window a report covers

pub mod error;
pub mod format;
pub mod models;
pub mod session;
pub mod theme;
pub mod traits;
pub mod urgency;

// Re-export error types
pub use error::CoreError;

// Re-export all model types
pub use models::{
    // Provider types
    CredentialEntry,
    CredentialKind,
    LoginMethod,
    PrefixMatch,
    ProviderKind,
    match_prefix,
    // Usage types
    RateWindow,
    UsageSnapshot,
    NO_API_KEY,
    NO_CREDENTIALS,
    // Cost tracking
    CostPeriod,
    CostReport,
    ModelCost,
    ProviderCost,
    // Status
    ProviderStatus,
    StatusIndicator,
};

pub use session::{SessionClock, TurnTiming};
pub use theme::{AnsiTheme, PlainTheme, Theme, ThemeColor};
pub use traits::AuthStorage;
pub use urgency::{compute_urgency, recommend, snapshot_urgency, window_urgency, MIN_HOURS_REMAINING};
