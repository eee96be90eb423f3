//! Non-interactive output for scripting and plain terminals.

mod json;
mod text;

pub use json::{accounts_json, usage_json, AccountOutput, ProviderOutput};
pub use text::{account_lines, status_lines};

#[cfg(test)]
mod tests;
