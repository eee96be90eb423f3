//! Provider registry and the usage fan-out.
//!
//! The registry owns one [`UsageFetcher`] per provider. Fetching expands
//! every enabled provider into its accounts and runs all of them as one
//! group: each call has its own timeout, the group has a ceiling, and an
//! account still pending at the ceiling shows "timeout" without holding up
//! the others.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use piusage_core::{snapshot_urgency, recommend, ProviderKind, ProviderStatus, UsageSnapshot};
use piusage_fetch::{join_with_ceiling, FetchContext, StatusError};
use piusage_store::CredentialStore;
use tracing::{debug, info, instrument, warn};

use crate::claude::ClaudeUsageFetcher;
use crate::codex::CodexUsageFetcher;
use crate::fetcher::{fetch_account, timed_out, Account, UsageFetcher};
use crate::zai::ZaiUsageFetcher;

// ============================================================================
// Static Registry
// ============================================================================

static DEFAULT: OnceLock<ProviderRegistry> = OnceLock::new();

// ============================================================================
// Provider Usage
// ============================================================================

/// All snapshots of one provider plus its selection state.
#[derive(Debug, Clone)]
pub struct ProviderUsage {
    /// The provider.
    pub kind: ProviderKind,
    /// One snapshot per account, in selection order.
    pub snapshots: Vec<UsageSnapshot>,
    /// Key currently used by the agent.
    pub active_key: Option<String>,
    /// Key with the lowest urgency, for switchable providers.
    pub recommended: Option<String>,
}

impl ProviderUsage {
    /// Groups snapshots of `kind` and derives active and recommended keys.
    pub fn new(
        kind: ProviderKind,
        snapshots: Vec<UsageSnapshot>,
        store: &CredentialStore,
        now: DateTime<Utc>,
    ) -> Self {
        let recommended = if kind.supports_account_switching() {
            recommend_account(&snapshots, now)
        } else {
            None
        };
        Self {
            kind,
            active_key: store.selected_key_for_prefix(kind.key_prefix()),
            recommended,
            snapshots,
        }
    }

    /// Snapshots worth showing: those not just reporting a missing credential.
    pub fn visible(&self) -> impl Iterator<Item = &UsageSnapshot> {
        self.snapshots.iter().filter(|s| !s.is_unconfigured())
    }

    /// True if no snapshot is worth showing.
    pub fn is_unconfigured(&self) -> bool {
        self.visible().next().is_none()
    }

    /// Snapshot of the active key.
    pub fn active(&self) -> Option<&UsageSnapshot> {
        let key = self.active_key.as_deref()?;
        self.snapshots
            .iter()
            .find(|s| s.account_key.as_deref() == Some(key))
    }
}

/// Key of the stored account with the lowest urgency.
///
/// Snapshots without a key, with an error, or without any timed window are
/// not candidates. Ties go to the earlier snapshot.
pub fn recommend_account(snapshots: &[UsageSnapshot], now: DateTime<Utc>) -> Option<String> {
    recommend(snapshots.iter().filter_map(|snapshot| {
        let key = snapshot.account_key.clone()?;
        Some((key, snapshot_urgency(Some(snapshot), now)))
    }))
}

// ============================================================================
// Provider Registry
// ============================================================================

/// Fetchers for every supported provider.
pub struct ProviderRegistry {
    fetchers: Vec<Box<dyn UsageFetcher>>,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}

impl ProviderRegistry {
    /// Registry with the production fetchers.
    pub fn new() -> Self {
        Self::with_fetchers(vec![
            Box::new(ClaudeUsageFetcher::new()),
            Box::new(CodexUsageFetcher::new()),
            Box::new(ZaiUsageFetcher::new()),
        ])
    }

    /// Registry over custom fetchers.
    pub fn with_fetchers(fetchers: Vec<Box<dyn UsageFetcher>>) -> Self {
        Self { fetchers }
    }

    /// Shared production registry.
    pub fn global() -> &'static ProviderRegistry {
        DEFAULT.get_or_init(ProviderRegistry::new)
    }

    /// Fetcher for a provider.
    pub fn get(&self, kind: ProviderKind) -> Option<&dyn UsageFetcher> {
        self.fetchers
            .iter()
            .find(|f| f.kind() == kind)
            .map(AsRef::as_ref)
    }

    /// Registered providers, in display order.
    pub fn kinds(&self) -> Vec<ProviderKind> {
        self.fetchers.iter().map(|f| f.kind()).collect()
    }

    /// Fetches every account of one provider.
    pub async fn fetch_provider(
        &self,
        ctx: &FetchContext,
        store: &CredentialStore,
        kind: ProviderKind,
    ) -> ProviderUsage {
        self.fetch_all(ctx, store, &[kind])
            .await
            .pop()
            .unwrap_or_else(|| ProviderUsage::new(kind, Vec::new(), store, Utc::now()))
    }

    /// Fetches every account of the given providers as one group.
    ///
    /// The result has one [`ProviderUsage`] per registered kind in `kinds`,
    /// in registry order.
    #[instrument(skip(self, ctx, store))]
    pub async fn fetch_all(
        &self,
        ctx: &FetchContext,
        store: &CredentialStore,
        kinds: &[ProviderKind],
    ) -> Vec<ProviderUsage> {
        let jobs: Vec<(&dyn UsageFetcher, Account)> = self
            .fetchers
            .iter()
            .filter(|f| kinds.contains(&f.kind()))
            .flat_map(|f| {
                f.accounts(store)
                    .into_iter()
                    .map(move |account| (f.as_ref(), account))
            })
            .collect();
        debug!(accounts = jobs.len(), "Fetching usage");

        let calls: Vec<_> = jobs
            .iter()
            .map(|(fetcher, account)| fetch_account(*fetcher, ctx, account))
            .collect();
        let snapshots = join_with_ceiling(calls, ctx.settings.group_timeout, |index| {
            let (fetcher, account) = &jobs[index];
            timed_out(fetcher.kind(), account)
        })
        .await;

        let now = Utc::now();
        let mut grouped: Vec<ProviderUsage> = Vec::new();
        for snapshot in snapshots {
            match grouped.last_mut() {
                Some(group) if group.kind == snapshot.provider => group.snapshots.push(snapshot),
                _ => grouped.push(ProviderUsage {
                    kind: snapshot.provider,
                    snapshots: vec![snapshot],
                    active_key: None,
                    recommended: None,
                }),
            }
        }
        grouped
            .into_iter()
            .map(|group| ProviderUsage::new(group.kind, group.snapshots, store, now))
            .collect()
    }
}

// ============================================================================
// Status
// ============================================================================

/// Fetches the status page of every provider that has one.
///
/// Providers whose page cannot be read get an "unknown" status.
pub async fn fetch_statuses(
    ctx: &FetchContext,
    kinds: &[ProviderKind],
) -> Vec<(ProviderKind, ProviderStatus)> {
    let poller = ctx.status_poller();
    let kinds: Vec<ProviderKind> = kinds
        .iter()
        .copied()
        .filter(|k| k.status_page_url().is_some())
        .collect();

    let calls: Vec<_> = kinds
        .iter()
        .map(|kind| {
            let poller = &poller;
            async move {
                let status = match poller.fetch_provider(*kind).await {
                    Ok(status) => status,
                    Err(StatusError::Unavailable(e)) => {
                        warn!(provider = %kind, error = %e, "Status unavailable");
                        ProviderStatus::unknown(e.snapshot_message())
                    }
                    Err(e) => ProviderStatus::unknown(e.to_string()),
                };
                (*kind, status)
            }
        })
        .collect();

    let statuses = join_with_ceiling(calls, ctx.settings.group_timeout, |index| {
        (kinds[index], ProviderStatus::unknown("timeout"))
    })
    .await;
    info!(count = statuses.len(), "Status pages fetched");
    statuses
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;
    use piusage_core::{CredentialEntry, RateWindow};
    use piusage_fetch::{FetchError, FetchSettings};
    use serde_json::json;

    /// Returns a fixed snapshot after a delay.
    struct Delayed {
        kind: ProviderKind,
        delay: Duration,
        used: f64,
    }

    #[async_trait]
    impl UsageFetcher for Delayed {
        fn kind(&self) -> ProviderKind {
            self.kind
        }

        async fn fetch(
            &self,
            _ctx: &FetchContext,
            entry: &CredentialEntry,
        ) -> Result<UsageSnapshot, FetchError> {
            tokio::time::sleep(self.delay).await;
            let mut snapshot = UsageSnapshot::new(self.kind);
            let used = if entry.access.as_deref() == Some("busy") {
                90.0
            } else {
                self.used
            };
            snapshot.push_window(
                RateWindow::new("5h", used).resetting_at(Some(Utc::now() + ChronoDuration::hours(2))),
            );
            Ok(snapshot)
        }
    }

    fn store() -> CredentialStore {
        let map = json!({
            "anthropic": {"type": "oauth", "access": "busy"},
            "anthropic-1": {"type": "oauth", "access": "idle"},
            "openai-codex": {"type": "oauth", "access": "c0"},
            "zai": {"type": "api_key", "key": "z0"}
        });
        let serde_json::Value::Object(map) = map else {
            unreachable!()
        };
        CredentialStore::from_map("/tmp/auth.json", map)
    }

    fn ctx(group_ms: u64) -> FetchContext {
        FetchContext::new(FetchSettings {
            call_timeout: Duration::from_secs(5),
            group_timeout: Duration::from_millis(group_ms),
        })
        .unwrap()
    }

    fn fake(kind: ProviderKind, delay_ms: u64) -> Box<dyn UsageFetcher> {
        Box::new(Delayed {
            kind,
            delay: Duration::from_millis(delay_ms),
            used: 10.0,
        })
    }

    #[tokio::test]
    async fn test_slow_provider_does_not_block_others() {
        let registry = ProviderRegistry::with_fetchers(vec![
            fake(ProviderKind::Claude, 10_000),
            fake(ProviderKind::Codex, 5),
            fake(ProviderKind::Zai, 5),
        ]);
        let started = std::time::Instant::now();
        let usage = registry
            .fetch_all(&ctx(300), &store(), ProviderKind::all())
            .await;
        assert!(started.elapsed() < Duration::from_secs(5));

        assert_eq!(usage.len(), 3);
        let claude = &usage[0];
        assert_eq!(claude.kind, ProviderKind::Claude);
        assert_eq!(claude.snapshots.len(), 2);
        for snapshot in &claude.snapshots {
            assert_eq!(snapshot.error.as_deref(), Some("timeout"));
            assert!(snapshot.account_key.is_some());
        }
        assert_eq!(claude.recommended, None);

        for other in &usage[1..] {
            assert_eq!(other.snapshots.len(), 1);
            assert!(other.snapshots[0].error.is_none());
            assert!(other.snapshots[0].has_data());
        }
    }

    #[tokio::test]
    async fn test_recommends_least_urgent_account() {
        let registry = ProviderRegistry::with_fetchers(vec![fake(ProviderKind::Claude, 1)]);
        let usage = registry
            .fetch_provider(&ctx(2_000), &store(), ProviderKind::Claude)
            .await;

        assert_eq!(usage.active_key.as_deref(), Some("anthropic"));
        assert_eq!(usage.recommended.as_deref(), Some("anthropic-1"));
        assert_eq!(
            usage.active().and_then(|s| s.account_key.as_deref()),
            Some("anthropic")
        );
    }

    #[tokio::test]
    async fn test_unregistered_kinds_are_skipped() {
        let registry = ProviderRegistry::with_fetchers(vec![fake(ProviderKind::Zai, 1)]);
        let usage = registry
            .fetch_all(&ctx(2_000), &store(), &[ProviderKind::Claude, ProviderKind::Zai])
            .await;
        assert_eq!(usage.len(), 1);
        assert_eq!(usage[0].kind, ProviderKind::Zai);
        assert_eq!(usage[0].recommended, None);
    }

    #[test]
    fn test_recommend_skips_errors_and_unkeyed() {
        let now = Utc::now();
        let reset = Some(now + ChronoDuration::hours(1));

        let mut busy = UsageSnapshot::new(ProviderKind::Codex).for_account("openai-codex");
        busy.push_window(RateWindow::new("5h", 80.0).resetting_at(reset));
        let failed = UsageSnapshot::with_error(ProviderKind::Codex, "timeout")
            .for_account("openai-codex-1");
        let mut unkeyed = UsageSnapshot::new(ProviderKind::Codex);
        unkeyed.push_window(RateWindow::new("5h", 0.0).resetting_at(reset));

        let snapshots = vec![busy, failed, unkeyed];
        assert_eq!(
            recommend_account(&snapshots, now).as_deref(),
            Some("openai-codex")
        );
    }

    #[test]
    fn test_visible_hides_unconfigured() {
        let usage = ProviderUsage::new(
            ProviderKind::Zai,
            vec![UsageSnapshot::with_error(ProviderKind::Zai, piusage_core::NO_API_KEY)],
            &CredentialStore::new("/tmp/auth.json"),
            Utc::now(),
        );
        assert!(usage.is_unconfigured());
    }

    #[test]
    fn test_default_registry_kinds() {
        assert_eq!(
            ProviderRegistry::global().kinds(),
            vec![ProviderKind::Claude, ProviderKind::Codex, ProviderKind::Zai]
        );
        assert!(ProviderRegistry::global().get(ProviderKind::Codex).is_some());
    }
}
