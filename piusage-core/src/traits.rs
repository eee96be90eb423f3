//! Capability traits at the agent-host boundary.

use crate::models::CredentialEntry;

/// Read access to the agent's stored credentials.
///
/// This is the slice of the host's auth storage the usage fetchers need.
/// `piusage-store` implements it over `auth.json`; tests implement it over
/// a map.
pub trait AuthStorage: Send + Sync {
    /// Bearer secret for a credential key (access token, else API key).
    fn api_key(&self, key: &str) -> Option<String> {
        self.get(key).and_then(|entry| entry.bearer().map(str::to_string))
    }

    /// The stored entry for a credential key.
    fn get(&self, key: &str) -> Option<CredentialEntry>;

    /// Re-reads the backing store.
    fn reload(&self);
}
