//! Z.AI provider.
//!
//! Uses an API key from the `zai` entry of `auth.json`, or `$Z_AI_API_KEY`.
//! The quota endpoint reports a token limit ("5h") and a monthly time
//! limit ("Month").

mod api;
mod fetcher;

pub use api::{QuotaLimit, QuotaResponse, ZaiApiClient};
pub use fetcher::{resolve_api_key, ZaiUsageFetcher, ZAI_API_KEY_ENV, ZAI_KEY};
