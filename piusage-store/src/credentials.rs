//! The agent credential file.
//!
//! `auth.json` is one JSON object mapping keys to credential entries. Keys
//! group by provider prefix: `anthropic` is the selected Claude account,
//! `anthropic-1`, `anthropic-2`, ... are the alternates.
//!
//! Entries are kept as raw JSON values in file order, so keys and fields
//! this crate does not understand survive a load/save cycle unchanged.

use std::path::{Path, PathBuf};

use piusage_core::{match_prefix, CredentialEntry, PrefixMatch};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::migrations;
use crate::persistence::{default_auth_path, save_json};

/// Ordered mapping from key to credential entry, bound to a file.
#[derive(Debug, Clone, PartialEq)]
pub struct CredentialStore {
    path: PathBuf,
    entries: Map<String, Value>,
}

impl CredentialStore {
    /// Creates an empty store bound to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: Map::new(),
        }
    }

    /// Creates a store from an already parsed object.
    pub fn from_map(path: impl Into<PathBuf>, entries: Map<String, Value>) -> Self {
        Self {
            path: path.into(),
            entries,
        }
    }

    /// Parses the file contents.
    ///
    /// # Errors
    ///
    /// Fails if the text is not JSON or not a JSON object.
    pub fn parse(path: impl Into<PathBuf>, content: &str) -> Result<Self, StoreError> {
        let path = path.into();
        if content.trim().is_empty() {
            return Ok(Self::new(path));
        }
        match serde_json::from_str::<Value>(content)? {
            Value::Object(entries) => Ok(Self { path, entries }),
            _ => Err(StoreError::NotAnObject(path.display().to_string())),
        }
    }

    /// Default credential file location.
    pub fn default_path() -> PathBuf {
        default_auth_path()
    }

    /// Loads the store, returning an error for unreadable or invalid files.
    ///
    /// A missing file is not an error; it yields an empty store.
    pub async fn load_strict(path: &Path) -> Result<Self, StoreError> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => Self::parse(path, &content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Credential file not found");
                Ok(Self::new(path))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Loads the store, treating any failure as an empty store.
    pub async fn load(path: &Path) -> Self {
        match Self::load_strict(path).await {
            Ok(store) => store,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Unreadable credential file, treating as empty");
                Self::new(path)
            }
        }
    }

    /// Synchronous variant of [`CredentialStore::load`].
    pub fn load_blocking(path: &Path) -> Self {
        let parsed = match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(path, &content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::new(path)),
            Err(e) => Err(e.into()),
        };
        parsed.unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "Unreadable credential file, treating as empty");
            Self::new(path)
        })
    }

    /// Loads the store and applies pending key migrations.
    ///
    /// The file is rewritten only when a migration changed something.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let mut store = Self::load(path).await;
        let applied = migrations::run_all(&mut store);
        if !applied.is_empty() {
            info!(path = %path.display(), migrations = ?applied, "Migrated credential keys");
            store.save().await?;
        }
        Ok(store)
    }

    /// Writes the store back to its file.
    pub async fn save(&self) -> Result<(), StoreError> {
        save_json(&self.path, &self.entries).await?;
        debug!(path = %self.path.display(), entries = self.entries.len(), "Saved credentials");
        Ok(())
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the store has no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All keys in file order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// True if `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// The entry under `key`, if present and well formed.
    pub fn get(&self, key: &str) -> Option<CredentialEntry> {
        let value = self.entries.get(key)?;
        match serde_json::from_value(value.clone()) {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!(key, error = %e, "Ignoring malformed credential entry");
                None
            }
        }
    }

    /// Inserts or replaces an entry. A replaced key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, entry: &CredentialEntry) -> Result<(), StoreError> {
        let value = serde_json::to_value(entry)?;
        self.entries.insert(key.into(), value);
        Ok(())
    }

    /// Removes an entry, returning it if it was well formed.
    pub fn remove(&mut self, key: &str) -> Option<CredentialEntry> {
        let value = self.entries.shift_remove(key)?;
        serde_json::from_value(value).ok()
    }

    /// Keys equal to `prefix` or `prefix-<n>`.
    ///
    /// The bare key comes first, then numbered keys by ascending suffix.
    pub fn entries_for_prefix(&self, prefix: &str) -> Vec<String> {
        let mut matched: Vec<(Option<u64>, &String)> = self
            .entries
            .keys()
            .filter_map(|key| match match_prefix(key, prefix)? {
                PrefixMatch::Selected => Some((None, key)),
                PrefixMatch::Numbered(n) => Some((Some(n), key)),
            })
            .collect();
        // None sorts before Some, so the bare key leads.
        matched.sort_by_key(|(n, _)| *n);
        matched.into_iter().map(|(_, key)| key.clone()).collect()
    }

    /// The key currently used for a provider.
    ///
    /// The bare key wins if it holds a usable credential, else the lowest
    /// numbered usable entry. `None` when no entry is usable.
    pub fn selected_key_for_prefix(&self, prefix: &str) -> Option<String> {
        self.entries_for_prefix(prefix)
            .into_iter()
            .find(|key| self.get(key).is_some_and(|entry| entry.is_usable()))
    }

    /// Stores a learned email on an entry. Returns true if it changed.
    pub fn set_email(&mut self, key: &str, email: &str) -> bool {
        let Some(Value::Object(fields)) = self.entries.get_mut(key) else {
            return false;
        };
        if fields.get("email").and_then(Value::as_str) == Some(email) {
            return false;
        }
        fields.insert("email".to_string(), Value::String(email.to_string()));
        true
    }

    /// Raw entries, in file order.
    pub(crate) fn raw(&self) -> &Map<String, Value> {
        &self.entries
    }

    /// Replaces the raw entries.
    pub(crate) fn replace_raw(&mut self, entries: Map<String, Value>) {
        self.entries = entries;
    }
}
