//! Codex usage fetcher.

use async_trait::async_trait;
use chrono::Utc;
use piusage_core::{CredentialEntry, ProviderKind, UsageSnapshot};
use piusage_fetch::{FetchContext, FetchError};
use piusage_store::CredentialStore;
use tracing::{debug, instrument};

use super::api::CodexApiClient;
use super::auth::{email_from_jwt, read_cli_credential};
use crate::fetcher::{missing_credential, stored_accounts, Account, UsageFetcher};

/// Fetches Codex usage from the ChatGPT backend.
#[derive(Debug, Clone)]
pub struct CodexUsageFetcher {
    client: CodexApiClient,
    cli_fallback: bool,
}

impl Default for CodexUsageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl CodexUsageFetcher {
    /// Creates a fetcher that falls back to the Codex CLI credential.
    pub fn new() -> Self {
        Self {
            client: CodexApiClient::new(),
            cli_fallback: true,
        }
    }

    /// Creates a fetcher over a specific API client.
    pub fn with_client(client: CodexApiClient) -> Self {
        Self {
            client,
            cli_fallback: true,
        }
    }

    /// Disables the Codex CLI fallback.
    #[must_use]
    pub fn without_cli_fallback(mut self) -> Self {
        self.cli_fallback = false;
        self
    }

    /// Looks the account email up with `/v1/me`; failures only cost the email.
    async fn lookup_email(&self, ctx: &FetchContext, token: &str) -> Option<String> {
        match self.client.fetch_email(ctx, token).await {
            Ok(email) => email,
            Err(e) => {
                debug!(error = %e, "Codex email lookup failed");
                None
            }
        }
    }
}

/// Email known without a network call: cached on the entry, else a JWT claim.
fn known_email(entry: &CredentialEntry, token: &str) -> Option<String> {
    entry
        .email
        .clone()
        .filter(|e| !e.is_empty())
        .or_else(|| email_from_jwt(token))
}

#[async_trait]
impl UsageFetcher for CodexUsageFetcher {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Codex
    }

    fn accounts(&self, store: &CredentialStore) -> Vec<Account> {
        let accounts = stored_accounts(store, ProviderKind::Codex.key_prefix());
        if !accounts.is_empty() {
            return accounts;
        }
        let cli = self.cli_fallback.then(read_cli_credential).flatten();
        match cli {
            Some(entry) => {
                debug!("Using Codex CLI credential");
                vec![Account {
                    key: None,
                    entry: Some(entry),
                }]
            }
            None => vec![Account::missing()],
        }
    }

    #[instrument(skip_all)]
    async fn fetch(
        &self,
        ctx: &FetchContext,
        entry: &CredentialEntry,
    ) -> Result<UsageSnapshot, FetchError> {
        let token = entry
            .access
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| missing_credential(ProviderKind::Codex))?;

        let usage = self
            .client
            .fetch_usage(ctx, token, entry.account_id.as_deref());
        let (usage, email) = match known_email(entry, token) {
            Some(email) => (usage.await, Some(email)),
            None => tokio::join!(usage, self.lookup_email(ctx, token)),
        };

        let mut snapshot = usage?.to_snapshot(Utc::now());
        snapshot.email = email;
        Ok(snapshot)
    }
}

/// Writes emails learned during a Codex fetch back into the store.
///
/// Only stored Codex accounts without an email are touched. Returns true if
/// the store changed and should be saved.
pub fn remember_emails(store: &mut CredentialStore, snapshots: &[UsageSnapshot]) -> bool {
    let mut changed = false;
    for snapshot in snapshots {
        if snapshot.provider != ProviderKind::Codex {
            continue;
        }
        let (Some(key), Some(email)) = (&snapshot.account_key, &snapshot.email) else {
            continue;
        };
        let known = store.get(key).and_then(|entry| entry.email);
        if known.is_none() && store.set_email(key, email) {
            debug!(key = %key, "Remembered Codex email");
            changed = true;
        }
    }
    changed
}
