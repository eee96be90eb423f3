//! CLI command implementations.

pub mod accounts;
pub mod cost;
pub mod select;
pub mod status;
pub mod usage;

use std::io::IsTerminal;
use std::path::Path;

use anyhow::{Context, Result};
use piusage_core::ProviderKind;
use piusage_fetch::{FetchContext, FetchSettings};
use piusage_providers::{remember_emails, ProviderUsage};
use piusage_store::{CredentialStore, UsageConfig};
use tracing::{debug, info, warn};

use crate::tui::Action;
use crate::{CommandResult, ExitCode};

/// True when stdout can host an interactive panel.
pub fn is_tty() -> bool {
    std::io::stdout().is_terminal() && std::io::stdin().is_terminal()
}

/// Loads the user configuration.
pub async fn load_config() -> UsageConfig {
    UsageConfig::load(&UsageConfig::default_path()).await
}

/// Fetch context using the configured timeouts.
pub fn fetch_context(config: &UsageConfig) -> Result<FetchContext> {
    let settings = FetchSettings {
        call_timeout: config.fetch_timeout(),
        group_timeout: config.group_timeout(),
    };
    FetchContext::new(settings).context("Failed to create HTTP client")
}

/// Opens the credential store, running key migrations.
///
/// A store whose migration cannot be saved is still usable for reading.
pub async fn open_store() -> CredentialStore {
    let path = CredentialStore::default_path();
    match CredentialStore::open(&path).await {
        Ok(store) => store,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to save migrated credentials");
            CredentialStore::load(&path).await
        }
    }
}

/// Caches emails learned during a fetch into the credential file.
///
/// The file is re-read first so concurrent logins are not overwritten with
/// the state from before the fetch.
pub async fn persist_emails(path: &Path, providers: &[ProviderUsage]) {
    let snapshots: Vec<_> = providers
        .iter()
        .filter(|usage| usage.kind == ProviderKind::Codex)
        .flat_map(|usage| usage.snapshots.iter().cloned())
        .collect();
    if snapshots.is_empty() {
        return;
    }

    let mut store = match CredentialStore::load_strict(path).await {
        Ok(store) => store,
        Err(e) => {
            warn!(error = %e, "Not caching emails, credential file unreadable");
            return;
        }
    };
    if !remember_emails(&mut store, &snapshots) {
        return;
    }
    match store.save().await {
        Ok(()) => debug!("Cached account emails"),
        Err(e) => warn!(error = %e, "Failed to cache account emails"),
    }
}

/// Makes `key` the active credential of `prefix` on disk.
///
/// Reads the file fresh and refuses to write over a file it cannot parse.
pub async fn switch_account(path: &Path, prefix: &str, key: &str) -> Result<()> {
    let mut store = CredentialStore::load_strict(path)
        .await
        .with_context(|| format!("Cannot read {}", path.display()))?;
    store
        .select(key, prefix)
        .with_context(|| format!("Cannot select {key}"))?;
    store
        .save()
        .await
        .with_context(|| format!("Cannot write {}", path.display()))?;
    info!(prefix, key, "Switched account");
    Ok(())
}

/// Carries out what a panel asked for once it has closed.
pub async fn apply_action(action: Action) -> CommandResult {
    match action {
        // Log deletion is handled inside the cost panel.
        Action::None | Action::Close | Action::DeleteLogs { .. } => Ok(ExitCode::Success),
        Action::Switch { prefix, key } => {
            switch_account(&CredentialStore::default_path(), &prefix, &key).await?;
            let name = ProviderKind::from_credential_key(&prefix)
                .map_or(prefix.as_str(), |kind| kind.display_name());
            println!("Switched {name} to {key}; it is now stored as {prefix}.");
            Ok(ExitCode::Success)
        }
    }
}
