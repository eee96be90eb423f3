//! Credential key migrations.
//!
//! Each migration rewrites the raw key/value map and reports whether it
//! changed anything. Migrations must be idempotent: they run on every
//! [`CredentialStore::open`](crate::CredentialStore::open) and are no-ops
//! once applied, so no applied-state marker is written to the file.

use piusage_core::match_prefix;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::credentials::CredentialStore;

/// A named rewrite of the credential map.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    /// Stable identifier, used in logs.
    pub id: &'static str,
    /// What the migration does.
    pub description: &'static str,
    /// Rewrites the map, returning true if anything changed.
    pub apply: fn(&mut Map<String, Value>) -> bool,
}

/// All migrations, in application order.
pub const MIGRATIONS: &[Migration] = &[Migration {
    id: "codex-to-openai-codex",
    description: "Rename codex and codex-<n> keys to openai-codex and openai-codex-<n>",
    apply: rename_codex_keys,
}];

/// Runs every migration and returns the ids of those that changed the store.
pub fn run_all(store: &mut CredentialStore) -> Vec<&'static str> {
    let mut entries = store.raw().clone();
    let mut applied = Vec::new();
    for migration in MIGRATIONS {
        if (migration.apply)(&mut entries) {
            info!(id = migration.id, "{}", migration.description);
            applied.push(migration.id);
        } else {
            debug!(id = migration.id, "Migration not needed");
        }
    }
    if !applied.is_empty() {
        store.replace_raw(entries);
    }
    applied
}

const OLD_CODEX_PREFIX: &str = "codex";
const NEW_CODEX_PREFIX: &str = "openai-codex";

/// Moves `codex*` keys under the `openai-codex` prefix.
///
/// A renamed key that would collide with an existing `openai-codex*` key
/// takes the next free `openai-codex-<n>` instead. Keys keep their position.
fn rename_codex_keys(entries: &mut Map<String, Value>) -> bool {
    if !entries
        .keys()
        .any(|key| match_prefix(key, OLD_CODEX_PREFIX).is_some())
    {
        return false;
    }

    let mut taken: Vec<String> = entries
        .keys()
        .filter(|key| match_prefix(key, NEW_CODEX_PREFIX).is_some())
        .cloned()
        .collect();

    let old = std::mem::take(entries);
    for (key, value) in old {
        if match_prefix(&key, OLD_CODEX_PREFIX).is_none() {
            entries.insert(key, value);
            continue;
        }
        let preferred = format!("openai-{key}");
        let new_key = if taken.contains(&preferred) {
            next_free(&taken)
        } else {
            preferred
        };
        debug!(from = %key, to = %new_key, "Renaming credential key");
        taken.push(new_key.clone());
        entries.insert(new_key, value);
    }
    true
}

fn next_free(taken: &[String]) -> String {
    (1..)
        .map(|n| format!("{NEW_CODEX_PREFIX}-{n}"))
        .find(|key| !taken.contains(key))
        .unwrap_or_else(|| NEW_CODEX_PREFIX.to_string())
}
