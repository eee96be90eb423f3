//! Plain text listings for `status` and `accounts`.

use piusage_core::{ProviderKind, ProviderStatus, Theme, ThemeColor};
use piusage_store::CredentialStore;

use super::json::account_outputs;

/// One line per provider status page.
pub fn status_lines(statuses: &[(ProviderKind, ProviderStatus)], theme: &dyn Theme) -> Vec<String> {
    statuses
        .iter()
        .map(|(kind, status)| {
            let color = if status.is_operational() {
                ThemeColor::Success
            } else if status.has_issues() {
                ThemeColor::Warning
            } else {
                ThemeColor::Muted
            };
            let mut line = format!(
                "{:<8} {} {}",
                kind.display_name(),
                theme.fg(color, status.indicator.symbol()),
                theme.fg(color, &status.description),
            );
            if let Some(url) = &status.url {
                line.push_str(&format!("  {}", theme.dim(url)));
            }
            line
        })
        .collect()
}

/// Stored accounts grouped by provider; `●` marks the active key.
pub fn account_lines(store: &CredentialStore, theme: &dyn Theme) -> Vec<String> {
    let accounts = account_outputs(store);
    if accounts.is_empty() {
        return vec![theme.dim(&format!(
            "No accounts stored in {}",
            store.path().display()
        ))];
    }

    let mut lines = Vec::new();
    for kind in ProviderKind::all() {
        let rows: Vec<_> = accounts
            .iter()
            .filter(|a| a.provider == kind.cli_name())
            .collect();
        if rows.is_empty() {
            continue;
        }
        lines.push(theme.bold(kind.display_name()));
        for account in rows {
            let mark = if account.active {
                theme.fg(ThemeColor::Success, "●")
            } else {
                theme.fg(ThemeColor::Muted, "○")
            };
            let mut line = format!("  {mark} {:<18} {:<8}", account.key, account.kind);
            if let Some(email) = &account.email {
                line.push_str(&format!(" {email}"));
            }
            if !account.usable {
                line.push_str(&format!(" {}", theme.fg(ThemeColor::Error, "(no token)")));
            }
            lines.push(line);
        }
    }
    lines
}
