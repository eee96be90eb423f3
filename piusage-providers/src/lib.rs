// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # piusage Providers
//!
//! Usage fetchers for the providers the pi coding agent can log into.
//!
//! | Provider | Credential keys | Auth | Endpoint |
//! |----------|-----------------|------|----------|
//! | Claude | `anthropic`, `anthropic-<n>` | OAuth | `api.anthropic.com/api/oauth/usage` |
//! | Codex | `openai-codex`, `openai-codex-<n>` | OAuth | `chatgpt.com/backend-api/wham/usage` |
//! | Z.AI | `zai` or `$Z_AI_API_KEY` | API key | `api.z.ai/api/monitor/usage/quota/limit` |
//!
//! Each provider implements [`UsageFetcher`]. The [`ProviderRegistry`]
//! fans out over every account of every requested provider and groups the
//! resulting snapshots per provider, with the active and recommended key.
//!
//! ## Usage
//!
//! ```ignore
//! use piusage_fetch::{FetchContext, FetchSettings};
//! use piusage_providers::ProviderRegistry;
//!
//! let ctx = FetchContext::new(FetchSettings::default())?;
//! let usage = ProviderRegistry::global()
//!     .fetch_all(&ctx, &store, ProviderKind::all())
//!     .await;
//! ```

pub mod claude;
pub mod codex;
pub mod fetcher;
pub mod registry;
pub mod zai;

pub use claude::ClaudeUsageFetcher;
pub use codex::{remember_emails, CodexUsageFetcher};
pub use fetcher::{fetch_account, Account, UsageFetcher};
pub use registry::{fetch_statuses, recommend_account, ProviderRegistry, ProviderUsage};
pub use zai::ZaiUsageFetcher;

#[cfg(test)]
mod parser_edge_tests;
