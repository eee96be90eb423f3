//! Codex (OpenAI) provider.
//!
//! Accounts are the `openai-codex`, `openai-codex-1`, ... entries of the
//! agent's `auth.json`. When none exist, the Codex CLI's own credential at
//! `$CODEX_HOME/auth.json` (default `~/.codex/auth.json`) is used instead.
//!
//! Usage comes from the ChatGPT backend (`/wham/usage`). The email is taken
//! from the stored entry, the token's JWT claims or `GET /v1/me`, and newly
//! learned emails are written back with [`remember_emails`].

mod api;
mod auth;
mod fetcher;

pub use api::{window_label, CodexApiClient, WhamUsageResponse, WhamWindow};
pub use auth::{
    codex_home, email_from_jwt, read_cli_credential, read_cli_credential_from, CliAuthFile,
    CODEX_HOME_ENV,
};
pub use fetcher::{remember_emails, CodexUsageFetcher};
