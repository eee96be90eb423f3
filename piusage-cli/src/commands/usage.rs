//! Usage command - fetch every account and show the usage panel.

use chrono::Utc;
use clap::Args;
use piusage_core::ProviderKind;
use piusage_fetch::FetchContext;
use piusage_providers::{fetch_statuses, ProviderRegistry};
use piusage_store::CredentialStore;
use tracing::info;

use super::{apply_action, fetch_context, is_tty, load_config, open_store, persist_emails};
use crate::output::usage_json;
use crate::tui::usage_panel::UsageData;
use crate::tui::{run_panel, UsagePanel};
use crate::{Cli, CommandResult, ExitCode};

/// Arguments for the usage command.
#[derive(Args, Debug, Default)]
pub struct UsageArgs {
    /// Print JSON instead of the panel.
    #[arg(long)]
    pub json: bool,

    /// Skip provider status pages.
    #[arg(long)]
    pub no_status: bool,
}

/// Runs the usage command.
pub async fn run(args: &UsageArgs, cli: &Cli) -> CommandResult {
    let config = load_config().await;
    let ctx = fetch_context(&config)?;
    let store = open_store().await;
    let kinds: Vec<ProviderKind> = ProviderKind::all()
        .iter()
        .copied()
        .filter(|kind| config.is_enabled(*kind))
        .collect();
    let show_status = config.show_status && !args.no_status;

    info!(providers = ?kinds, accounts = store.len(), "Fetching usage");
    let load = tokio::spawn(load_usage(ctx, store, kinds, show_status));

    if args.json {
        let data = load.await?;
        println!("{}", usage_json(&data.providers, &data.statuses)?);
        let any = data.providers.iter().any(|usage| !usage.is_unconfigured());
        return Ok(if any { ExitCode::Success } else { ExitCode::NoAccounts });
    }

    let theme = cli.theme();
    let mut panel = UsagePanel::new(config.bar_width);
    let action = run_panel(&mut panel, load, |_| None, is_tty(), theme.as_ref()).await?;
    apply_action(action).await
}

/// Fetches usage and status pages together, then caches learned emails.
async fn load_usage(
    ctx: FetchContext,
    store: CredentialStore,
    kinds: Vec<ProviderKind>,
    show_status: bool,
) -> UsageData {
    let registry = ProviderRegistry::global();
    let (providers, statuses) = tokio::join!(registry.fetch_all(&ctx, &store, &kinds), async {
        if show_status {
            fetch_statuses(&ctx, &kinds).await
        } else {
            Vec::new()
        }
    });
    persist_emails(store.path(), &providers).await;

    UsageData {
        providers,
        statuses,
        fetched_at: Utc::now(),
    }
}
