// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # piusage Store
//!
//! Everything piusage reads from or writes to disk.
//!
//! - **CredentialStore**: the agent's `auth.json`, grouped by provider prefix
//! - **reorganize**: promote one account to the selected key and renumber the rest
//! - **migrations**: idempotent key rewrites applied when the store is opened
//! - **UsageConfig**: `piusage.json` settings
//! - **cost_log**: spend reconstructed from agent session logs, and their deletion per provider
//!
//! ## Usage
//!
//! ```ignore
//! use piusage_store::CredentialStore;
//!
//! let mut store = CredentialStore::open(&CredentialStore::default_path()).await?;
//! if let Some(key) = store.entries_for_prefix("anthropic").get(1) {
//!     store.select(&key.clone(), "anthropic")?;
//!     store.save().await?;
//! }
//! ```

pub mod auth_storage;
pub mod config;
pub mod cost_log;
pub mod credentials;
pub mod error;
pub mod migrations;
pub mod persistence;
pub mod reorganize;

pub use auth_storage::FileAuthStorage;
pub use config::UsageConfig;
pub use cost_log::{delete_provider_logs, scan_sessions, CostAggregator, LogDeletion};
pub use credentials::CredentialStore;
pub use piusage_core::{match_prefix, PrefixMatch};
pub use error::StoreError;
pub use migrations::{Migration, MIGRATIONS};
pub use persistence::{
    agent_dir, default_auth_path, default_config_path, default_sessions_dir, ensure_dir,
    home_dir, load_json, load_json_or_default, save_json,
};
pub use reorganize::reorganize;
