// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # piusage Fetch
//!
//! Network plumbing for the provider fetchers.
//!
//! - [`host::http`] - HTTP client with tracing and domain allowlist
//! - [`host::status`] - Status page polling (statuspage.io)
//! - [`fanout`] - Concurrent calls with per-call timeouts and a group ceiling
//! - [`context::FetchContext`] - Client and timing settings for one command
//!
//! ## Example
//!
//! ```ignore
//! use piusage_fetch::{FetchContext, FetchSettings, join_with_ceiling};
//!
//! let ctx = FetchContext::new(FetchSettings::default())?;
//! let results = join_with_ceiling(calls, ctx.settings.group_timeout, |_| fallback()).await;
//! ```

pub mod context;
pub mod error;
pub mod fanout;
pub mod host;

pub use context::{FetchContext, FetchSettings, DEFAULT_GROUP_TIMEOUT};
pub use error::{FetchError, StatusError};
pub use fanout::{join_with_ceiling, with_timeout};
pub use host::{http::HttpClient, status::StatusPoller};
