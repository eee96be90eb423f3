//! Z.AI usage fetcher.

use async_trait::async_trait;
use piusage_core::{AuthStorage, CredentialEntry, ProviderKind, UsageSnapshot};
use piusage_fetch::{FetchContext, FetchError};
use piusage_store::{CredentialStore, FileAuthStorage};
use tracing::{debug, instrument};

use super::api::ZaiApiClient;
use crate::fetcher::{stored_accounts, Account, UsageFetcher};

/// Environment variable holding a Z.AI API key.
pub const ZAI_API_KEY_ENV: &str = "Z_AI_API_KEY";

/// Credential key of the Z.AI entry.
pub const ZAI_KEY: &str = "zai";

/// The Z.AI key: stored entry, else the environment.
pub fn resolve_api_key(auth: &dyn AuthStorage) -> Option<String> {
    auth.api_key(ZAI_KEY).or_else(|| {
        std::env::var(ZAI_API_KEY_ENV)
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
    })
}

/// Fetches Z.AI quota with an API key.
#[derive(Debug, Clone, Default)]
pub struct ZaiUsageFetcher {
    client: ZaiApiClient,
}

impl ZaiUsageFetcher {
    /// Creates a fetcher for the production API.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a fetcher over a specific API client.
    pub fn with_client(client: ZaiApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl UsageFetcher for ZaiUsageFetcher {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Zai
    }

    fn accounts(&self, store: &CredentialStore) -> Vec<Account> {
        let auth = FileAuthStorage::new(store.clone());
        let env_entry = || resolve_api_key(&auth).map(CredentialEntry::api_key);

        let mut accounts = stored_accounts(store, ZAI_KEY);
        if accounts.is_empty() {
            return vec![Account {
                key: None,
                entry: env_entry(),
            }];
        }
        // A bare entry without a key still picks up the environment.
        for account in &mut accounts {
            let bare = account.key.as_deref() == Some(ZAI_KEY);
            if bare && !account.entry.as_ref().is_some_and(CredentialEntry::is_usable) {
                account.entry = env_entry();
            }
        }
        accounts
    }

    #[instrument(skip_all)]
    async fn fetch(
        &self,
        ctx: &FetchContext,
        entry: &CredentialEntry,
    ) -> Result<UsageSnapshot, FetchError> {
        let api_key = entry.bearer().ok_or(FetchError::NoApiKey)?;
        let response = self.client.fetch_quota(ctx, api_key).await?;
        let snapshot = response.to_snapshot()?;
        debug!(windows = snapshot.windows.len(), "Z.AI quota parsed");
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapAuth(HashMap<String, CredentialEntry>);

    impl AuthStorage for MapAuth {
        fn get(&self, key: &str) -> Option<CredentialEntry> {
            self.0.get(key).cloned()
        }

        fn reload(&self) {}
    }

    #[test]
    fn test_stored_key_wins() {
        let auth = MapAuth(HashMap::from([(
            ZAI_KEY.to_string(),
            CredentialEntry::api_key("stored-key"),
        )]));
        assert_eq!(resolve_api_key(&auth).as_deref(), Some("stored-key"));
    }

    #[test]
    fn test_stored_entry_in_accounts() {
        let mut store = CredentialStore::new("/tmp/auth.json");
        store
            .insert(ZAI_KEY, &CredentialEntry::api_key("zk"))
            .unwrap();
        let accounts = ZaiUsageFetcher::new().accounts(&store);
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].key.as_deref(), Some(ZAI_KEY));
        assert_eq!(
            accounts[0].entry.as_ref().and_then(|e| e.key.as_deref()),
            Some("zk")
        );
    }

    #[test]
    fn test_numbered_entries_in_accounts() {
        let mut store = CredentialStore::new("/tmp/auth.json");
        store.insert("zai-1", &CredentialEntry::api_key("second")).unwrap();
        store.insert(ZAI_KEY, &CredentialEntry::api_key("first")).unwrap();
        store.insert("anthropic", &CredentialEntry::oauth("a")).unwrap();

        let accounts = ZaiUsageFetcher::new().accounts(&store);
        let keys: Vec<_> = accounts.iter().map(|a| a.key.as_deref()).collect();
        assert_eq!(keys, vec![Some(ZAI_KEY), Some("zai-1")]);
        assert_eq!(
            accounts[1].entry.as_ref().and_then(|e| e.bearer()),
            Some("second")
        );
    }
}
