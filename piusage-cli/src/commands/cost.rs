//! Cost command - spend from the agent's session logs.

use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::Args;
use futures::future::join_all;
use piusage_core::{CostPeriod, CostReport};
use piusage_store::{default_sessions_dir, delete_provider_logs, scan_sessions};
use tokio::task::JoinHandle;
use tracing::warn;

use super::{is_tty, load_config};
use crate::tui::cost_panel::tabs_for;
use crate::tui::{run_panel, Action, CostPanel};
use crate::{Cli, CommandResult, ExitCode};

/// Arguments for the cost command.
#[derive(Args, Debug, Default)]
pub struct CostArgs {
    /// Add a tab for the last N days and open on it.
    pub days: Option<u32>,

    /// Tab to open on: week, month, all or a day count.
    #[arg(long)]
    pub tab: Option<CostPeriod>,
}

impl CostArgs {
    /// Custom day count, from the positional argument or `--tab <n>`.
    fn custom_days(&self) -> Option<u32> {
        self.days.filter(|d| *d > 0).or(match self.tab {
            Some(CostPeriod::Days(n)) => Some(n),
            _ => None,
        })
    }

    /// Tab the panel opens on.
    fn initial_tab(&self, default: CostPeriod) -> CostPeriod {
        self.custom_days()
            .map(CostPeriod::Days)
            .or(self.tab)
            .unwrap_or(default)
    }
}

/// Runs the cost command.
pub async fn run(args: &CostArgs, cli: &Cli) -> CommandResult {
    let config = load_config().await;
    let tabs = tabs_for(args.custom_days());
    let mut panel = CostPanel::new(tabs, args.initial_tab(config.cost_default_tab));

    let dir = default_sessions_dir();
    let periods = panel.tabs().to_vec();
    let load = spawn_scan(dir.clone(), periods.clone(), None);
    let reload = |action: &Action| match action {
        Action::DeleteLogs { provider } => {
            Some(spawn_scan(dir.clone(), periods.clone(), Some(provider.clone())))
        }
        _ => None,
    };

    let theme = cli.theme();
    run_panel(&mut panel, load, reload, is_tty(), theme.as_ref()).await?;
    Ok(ExitCode::Success)
}

/// Scans every period in the background, after deleting `delete`'s logs.
fn spawn_scan(
    dir: PathBuf,
    periods: Vec<CostPeriod>,
    delete: Option<String>,
) -> JoinHandle<Vec<CostReport>> {
    tokio::spawn(async move {
        if let Some(provider) = delete {
            if let Err(e) = delete_provider_logs(&dir, &provider).await {
                warn!(provider = %provider, error = %e, "Deleting session logs failed");
            }
        }
        scan_all(&dir, periods).await
    })
}

/// One report per period; a failed scan yields an empty report.
async fn scan_all(dir: &Path, periods: Vec<CostPeriod>) -> Vec<CostReport> {
    let now = Utc::now();
    join_all(periods.into_iter().map(|period| async move {
        scan_sessions(dir, period, now).await.unwrap_or_else(|e| {
            warn!(period = %period.label(), error = %e, "Session scan failed");
            CostReport {
                period,
                ..CostReport::default()
            }
        })
    }))
    .await
}
