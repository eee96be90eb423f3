//! JSON output formatting.

use anyhow::Result;
use piusage_core::{ProviderKind, ProviderStatus, UsageSnapshot};
use piusage_providers::ProviderUsage;
use piusage_store::CredentialStore;
use serde::Serialize;

// ============================================================================
// Output Types
// ============================================================================

/// JSON output for one provider of `usage --json`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderOutput<'a> {
    pub provider: &'static str,
    pub display_name: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_key: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusOutput<'a>>,
    pub accounts: Vec<&'a UsageSnapshot>,
}

/// Status page summary.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusOutput<'a> {
    pub indicator: &'static str,
    pub description: &'a str,
}

impl<'a> From<&'a ProviderStatus> for StatusOutput<'a> {
    fn from(status: &'a ProviderStatus) -> Self {
        Self {
            indicator: status.indicator.label(),
            description: &status.description,
        }
    }
}

/// One stored credential in `accounts --json`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountOutput {
    pub provider: &'static str,
    pub key: String,
    pub active: bool,
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub usable: bool,
}

// ============================================================================
// Formatting
// ============================================================================

/// Formats fetched usage. Unconfigured providers and accounts are left out.
pub fn usage_json(
    providers: &[ProviderUsage],
    statuses: &[(ProviderKind, ProviderStatus)],
) -> Result<String> {
    let output: Vec<ProviderOutput<'_>> = providers
        .iter()
        .filter(|usage| !usage.is_unconfigured())
        .map(|usage| ProviderOutput {
            provider: usage.kind.cli_name(),
            display_name: usage.kind.display_name(),
            active_key: usage.active_key.as_deref(),
            recommended: usage.recommended.as_deref(),
            status: statuses
                .iter()
                .find(|(kind, _)| *kind == usage.kind)
                .map(|(_, status)| StatusOutput::from(status)),
            accounts: usage.visible().collect(),
        })
        .collect();
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Stored credentials of every provider, in selection order.
pub fn account_outputs(store: &CredentialStore) -> Vec<AccountOutput> {
    ProviderKind::all()
        .iter()
        .flat_map(|kind| {
            let prefix = kind.key_prefix();
            let active = store.selected_key_for_prefix(prefix);
            store
                .entries_for_prefix(prefix)
                .into_iter()
                .filter_map(move |key| {
                    let entry = store.get(&key)?;
                    Some(AccountOutput {
                        provider: kind.cli_name(),
                        active: active.as_deref() == Some(key.as_str()),
                        kind: entry.kind.as_str(),
                        usable: entry.is_usable(),
                        email: entry.email,
                        key,
                    })
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Formats stored credentials without any secret material.
pub fn accounts_json(store: &CredentialStore) -> Result<String> {
    Ok(serde_json::to_string_pretty(&account_outputs(store))?)
}
