// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! piusage - usage, cost and account switching for the pi coding agent.
//!
//! # Examples
//!
//! ```bash
//! # Usage panel for every configured provider
//! piusage
//!
//! # Same data as JSON
//! piusage usage --json
//!
//! # Spend from local session logs, last 3 days
//! piusage cost 3
//!
//! # Pick the Claude account the agent should use
//! piusage claude-select
//!
//! # Provider status pages
//! piusage status
//! ```

mod commands;
mod output;
mod tui;

use std::io::IsTerminal;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{accounts, cost, select, status, usage};
use piusage_core::{AnsiTheme, PlainTheme, ProviderKind, Theme};

/// Environment variable holding a tracing filter.
const LOG_ENV: &str = "PIUSAGE_LOG";

// ============================================================================
// CLI Definition
// ============================================================================

/// piusage - provider usage for the pi coding agent.
#[derive(Parser)]
#[command(name = "piusage")]
#[command(about = "Usage, cost and account switching for the pi coding agent")]
#[command(long_about = r#"
piusage shows rate-limit usage for every account stored in the pi agent's
auth.json, recommends the account with the most headroom and switches the
agent to it.

Supported providers:
  • Claude (anthropic, anthropic-1, ...)
  • Codex (openai-codex, openai-codex-1, ...)
  • Z.AI (zai or $Z_AI_API_KEY)

Examples:
  piusage                      # Usage panel
  piusage usage --json         # Usage as JSON
  piusage cost 3               # Spend over the last 3 days
  piusage claude-select        # Switch Claude account
  piusage codex-select         # Switch Codex account
"#)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run. If none, runs 'usage'.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub plain: bool,

    /// Verbose logging on stderr.
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Show usage of every stored account (default).
    #[command(visible_alias = "u")]
    Usage(usage::UsageArgs),

    /// Show spend from local session logs.
    #[command(visible_alias = "c")]
    Cost(cost::CostArgs),

    /// Choose the Claude account the agent uses.
    ClaudeSelect,

    /// Choose the Codex account the agent uses.
    CodexSelect,

    /// Show provider status pages.
    Status,

    /// List stored accounts without fetching.
    #[command(visible_alias = "a")]
    Accounts(accounts::AccountsArgs),
}

impl Commands {
    /// True for commands that take over the terminal.
    fn is_interactive(&self) -> bool {
        match self {
            Self::Usage(args) => !args.json,
            Self::Cost(_) | Self::ClaudeSelect | Self::CodexSelect => true,
            Self::Status | Self::Accounts(_) => false,
        }
    }
}

/// CLI exit codes.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// General error.
    Error = 1,
    /// Nothing configured to show or switch.
    NoAccounts = 2,
}

impl Cli {
    /// Theme for this invocation.
    pub fn theme(&self) -> Box<dyn Theme> {
        if self.plain || !std::io::stdout().is_terminal() {
            Box::new(PlainTheme)
        } else {
            Box::new(AnsiTheme)
        }
    }
}

// ============================================================================
// Logging Setup
// ============================================================================

/// Log filter: `--verbose` wins, then `$PIUSAGE_LOG`, then warnings only.
///
/// While a panel owns the terminal, `$PIUSAGE_LOG` is ignored so lower
/// records cannot scribble over it.
fn log_filter(verbose: bool, interactive: bool, env: Option<&str>) -> String {
    if verbose {
        return "piusage=debug".to_string();
    }
    match env {
        Some(directives) if !interactive && !directives.trim().is_empty() => {
            directives.to_string()
        }
        _ => "piusage=warn".to_string(),
    }
}

fn setup_logging(verbose: bool, interactive: bool) {
    let env = std::env::var(LOG_ENV).ok();
    let filter = EnvFilter::try_new(log_filter(verbose, interactive, env.as_deref()))
        .unwrap_or_else(|_| EnvFilter::new("piusage=warn"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let interactive = cli
        .command
        .as_ref()
        .is_none_or(Commands::is_interactive);

    setup_logging(cli.verbose, interactive);

    let result = match &cli.command {
        Some(Commands::Usage(args)) => usage::run(args, &cli).await,
        Some(Commands::Cost(args)) => cost::run(args, &cli).await,
        Some(Commands::ClaudeSelect) => select::run(ProviderKind::Claude, &cli).await,
        Some(Commands::CodexSelect) => select::run(ProviderKind::Codex, &cli).await,
        Some(Commands::Status) => status::run(&cli).await,
        Some(Commands::Accounts(args)) => accounts::run(args, &cli).await,
        None => usage::run(&usage::UsageArgs::default(), &cli).await,
    };

    let code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::Error
        }
    };
    std::process::exit(code as i32);
}

/// What a command handler returns: the process exit code.
pub type CommandResult = Result<ExitCode>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_filter_precedence() {
        assert_eq!(log_filter(true, true, Some("trace")), "piusage=debug");
        assert_eq!(log_filter(false, false, Some("piusage=info")), "piusage=info");
        assert_eq!(log_filter(false, true, Some("piusage=info")), "piusage=warn");
        assert_eq!(log_filter(false, false, None), "piusage=warn");
        assert_eq!(log_filter(false, false, Some("  ")), "piusage=warn");
    }

    #[test]
    fn test_cli_parses_commands() {
        let cli = Cli::parse_from(["piusage", "cost", "3", "--plain"]);
        assert!(cli.plain);
        assert!(matches!(cli.command, Some(Commands::Cost(ref a)) if a.days == Some(3)));

        let cli = Cli::parse_from(["piusage", "usage", "--json"]);
        assert!(!cli.command.as_ref().is_some_and(Commands::is_interactive));

        let cli = Cli::parse_from(["piusage", "codex-select", "-v"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Some(Commands::CodexSelect)));
    }
}
