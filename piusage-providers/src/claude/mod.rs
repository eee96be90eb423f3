//! Claude (Anthropic) provider.
//!
//! Accounts are the `anthropic`, `anthropic-1`, `anthropic-2`, ... entries of
//! the agent's `auth.json`, each an OAuth credential:
//!
//! ```json
//! {
//!   "anthropic": {
//!     "type": "oauth",
//!     "access": "sk-ant-oat01-...",
//!     "refresh": "sk-ant-ort01-...",
//!     "expires": 1767225600000
//!   }
//! }
//! ```
//!
//! Usage comes from `GET /api/oauth/usage` (windows "5h", "Week", "Opus",
//! "Sonnet"); email and plan from `GET /api/oauth/profile`. A rejected
//! token shows as "token expired".

mod api;
mod fetcher;

pub use api::{
    plan_from_org_type, ClaudeApiClient, ProfileResponse, UsageApiResponse, UsageWindow,
};
pub use fetcher::ClaudeUsageFetcher;
