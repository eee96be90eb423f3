//! Accounts command - list stored credentials without fetching.

use clap::Args;
use piusage_core::ProviderKind;
use piusage_store::CredentialStore;

use super::open_store;
use crate::output::{account_lines, accounts_json};
use crate::{Cli, CommandResult, ExitCode};

/// Arguments for the accounts command.
#[derive(Args, Debug, Default)]
pub struct AccountsArgs {
    /// Print JSON.
    #[arg(long)]
    pub json: bool,
}

/// Lists stored accounts per provider.
pub async fn run(args: &AccountsArgs, cli: &Cli) -> CommandResult {
    let store = open_store().await;

    if args.json {
        println!("{}", accounts_json(&store)?);
    } else {
        for line in account_lines(&store, cli.theme().as_ref()) {
            println!("{line}");
        }
    }

    Ok(if has_provider_accounts(&store) {
        ExitCode::Success
    } else {
        ExitCode::NoAccounts
    })
}

/// True if any stored key belongs to a known provider.
fn has_provider_accounts(store: &CredentialStore) -> bool {
    store
        .keys()
        .any(|key| ProviderKind::from_credential_key(key).is_some())
}
