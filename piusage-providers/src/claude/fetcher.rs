//! Claude usage fetcher.
//!
//! Usage and profile are requested together. The profile only decorates the
//! snapshot with email and plan, so its failure is logged and ignored.

use async_trait::async_trait;
use piusage_core::{CredentialEntry, ProviderKind, UsageSnapshot};
use piusage_fetch::{FetchContext, FetchError};
use tracing::{debug, instrument};

use super::api::ClaudeApiClient;
use crate::fetcher::{missing_credential, UsageFetcher};

/// Fetches Claude usage with an OAuth access token.
#[derive(Debug, Clone, Default)]
pub struct ClaudeUsageFetcher {
    client: ClaudeApiClient,
}

impl ClaudeUsageFetcher {
    /// Creates a fetcher for the production API.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a fetcher over a specific API client.
    pub fn with_client(client: ClaudeApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl UsageFetcher for ClaudeUsageFetcher {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Claude
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
            .ok_or_else(|| missing_credential(ProviderKind::Claude))?;

        let (usage, profile) = tokio::join!(
            self.client.fetch_usage(ctx, token),
            self.client.fetch_profile(ctx, token),
        );

        let mut snapshot = usage?.to_snapshot();
        match profile {
            Ok(profile) => {
                snapshot.email = profile.email();
                snapshot.plan = profile.plan();
            }
            Err(e) => debug!(error = %e, "Claude profile unavailable"),
        }
        if snapshot.email.is_none() {
            snapshot.email.clone_from(&entry.email);
        }
        Ok(snapshot)
    }
}
