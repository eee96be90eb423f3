//! `claude-select` / `codex-select` - pick the account the agent uses.

use piusage_core::ProviderKind;
use piusage_providers::ProviderRegistry;
use tracing::info;

use super::{apply_action, fetch_context, is_tty, load_config, open_store, persist_emails};
use crate::tui::{run_panel, AccountPicker};
use crate::{Cli, CommandResult, ExitCode};

/// Runs the picker for one provider.
pub async fn run(kind: ProviderKind, cli: &Cli) -> CommandResult {
    let store = open_store().await;
    let keys = store.entries_for_prefix(kind.key_prefix());
    if keys.is_empty() {
        eprintln!(
            "No {} accounts in {}. Log in with the pi agent first.",
            kind.display_name(),
            store.path().display()
        );
        return Ok(ExitCode::NoAccounts);
    }

    let config = load_config().await;
    let ctx = fetch_context(&config)?;
    info!(provider = %kind, accounts = keys.len(), "Fetching accounts");

    let load = tokio::spawn(async move {
        let usage = ProviderRegistry::global()
            .fetch_provider(&ctx, &store, kind)
            .await;
        persist_emails(store.path(), std::slice::from_ref(&usage)).await;
        usage
    });

    let theme = cli.theme();
    let mut picker = AccountPicker::new(kind);
    let action = run_panel(&mut picker, load, |_| None, is_tty(), theme.as_ref()).await?;
    apply_action(action).await
}
