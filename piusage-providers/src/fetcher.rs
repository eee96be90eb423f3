//! The provider fetcher seam.
//!
//! A [`UsageFetcher`] knows which credentials belong to its provider and how
//! to turn one of them into a [`UsageSnapshot`]. Fetchers return typed
//! errors; [`fetch_account`] converts them to the snapshot's inline error
//! text so the rest of the program only ever sees snapshots.

use async_trait::async_trait;
use piusage_core::{CredentialEntry, LoginMethod, ProviderKind, UsageSnapshot};
use piusage_fetch::{FetchContext, FetchError};
use piusage_store::CredentialStore;
use tracing::{debug, warn};

// ============================================================================
// Account
// ============================================================================

/// One credential a fetcher will be called with.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// Key in the credential store, `None` for credentials found elsewhere.
    pub key: Option<String>,
    /// The credential, `None` when nothing is configured.
    pub entry: Option<CredentialEntry>,
}

impl Account {
    /// An account stored under `key`.
    pub fn stored(key: impl Into<String>, entry: Option<CredentialEntry>) -> Self {
        Self {
            key: Some(key.into()),
            entry,
        }
    }

    /// Placeholder for a provider with no credential at all.
    pub fn missing() -> Self {
        Self {
            key: None,
            entry: None,
        }
    }
}

/// Accounts of every key in the `prefix` group, in selection order.
pub fn stored_accounts(store: &CredentialStore, prefix: &str) -> Vec<Account> {
    store
        .entries_for_prefix(prefix)
        .into_iter()
        .map(|key| {
            let entry = store.get(&key);
            Account::stored(key, entry)
        })
        .collect()
}

// ============================================================================
// Fetcher Trait
// ============================================================================

/// Fetches usage for one provider.
#[async_trait]
pub trait UsageFetcher: Send + Sync {
    /// The provider served by this fetcher.
    fn kind(&self) -> ProviderKind;

    /// Credentials to fetch with. Never empty: a provider with nothing
    /// configured yields one [`Account::missing`].
    fn accounts(&self, store: &CredentialStore) -> Vec<Account> {
        let accounts = stored_accounts(store, self.kind().key_prefix());
        if accounts.is_empty() {
            vec![Account::missing()]
        } else {
            accounts
        }
    }

    /// Fetches usage with one credential.
    async fn fetch(
        &self,
        ctx: &FetchContext,
        entry: &CredentialEntry,
    ) -> Result<UsageSnapshot, FetchError>;
}

/// Error reported when an account has no usable secret.
pub fn missing_credential(kind: ProviderKind) -> FetchError {
    match kind.login_method() {
        LoginMethod::OAuth => FetchError::NoCredentials,
        LoginMethod::ApiKey => FetchError::NoApiKey,
    }
}

/// Fetches one account and folds any failure into the snapshot.
pub async fn fetch_account(
    fetcher: &dyn UsageFetcher,
    ctx: &FetchContext,
    account: &Account,
) -> UsageSnapshot {
    let kind = fetcher.kind();
    let result = match account.entry.as_ref().filter(|e| e.is_usable()) {
        Some(entry) => fetcher.fetch(ctx, entry).await,
        None => Err(missing_credential(kind)),
    };

    let snapshot = match result {
        Ok(mut snapshot) => {
            snapshot.sanitize();
            debug!(provider = %kind, key = ?account.key, windows = snapshot.windows.len(), "Fetched usage");
            snapshot
        }
        Err(err) => {
            if matches!(err, FetchError::NoCredentials | FetchError::NoApiKey) {
                debug!(provider = %kind, key = ?account.key, "No credential");
            } else {
                warn!(provider = %kind, key = ?account.key, error = %err, "Usage fetch failed");
            }
            UsageSnapshot::with_error(kind, err.snapshot_message())
        }
    };

    match &account.key {
        Some(key) => snapshot.for_account(key.clone()),
        None => snapshot,
    }
}

/// Capitalizes a plan identifier, e.g. `plus` to `Plus`.
pub fn plan_name(plan_type: &str) -> String {
    let mut chars = plan_type.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Snapshot substituted for an account still pending at the group ceiling.
pub fn timed_out(kind: ProviderKind, account: &Account) -> UsageSnapshot {
    let snapshot = UsageSnapshot::with_error(kind, FetchError::Timeout.snapshot_message());
    match &account.key {
        Some(key) => snapshot.for_account(key.clone()),
        None => snapshot,
    }
}
