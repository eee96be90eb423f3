//! Status command - provider status pages.

use piusage_core::ProviderKind;
use piusage_providers::fetch_statuses;

use super::{fetch_context, load_config};
use crate::output::status_lines;
use crate::{Cli, CommandResult, ExitCode};

/// Prints one line per provider status page.
pub async fn run(cli: &Cli) -> CommandResult {
    let config = load_config().await;
    let ctx = fetch_context(&config)?;
    let statuses = fetch_statuses(&ctx, ProviderKind::all()).await;

    let theme = cli.theme();
    for line in status_lines(&statuses, theme.as_ref()) {
        println!("{line}");
    }

    let healthy = statuses.iter().all(|(_, s)| !s.has_issues());
    Ok(if healthy { ExitCode::Success } else { ExitCode::Error })
}
