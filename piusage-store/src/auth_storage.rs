//! [`AuthStorage`] over the credential file.

use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};

use piusage_core::{AuthStorage, CredentialEntry};
use tracing::debug;

use crate::credentials::CredentialStore;

/// Read-only, reloadable view of `auth.json`.
#[derive(Debug)]
pub struct FileAuthStorage {
    path: PathBuf,
    store: RwLock<CredentialStore>,
}

impl FileAuthStorage {
    /// Wraps an already loaded store.
    pub fn new(store: CredentialStore) -> Self {
        Self {
            path: store.path().to_path_buf(),
            store: RwLock::new(store),
        }
    }

    /// Loads the store at `path`.
    pub fn open_blocking(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self::new(CredentialStore::load_blocking(&path))
    }

    /// A copy of the current store contents.
    pub fn snapshot(&self) -> CredentialStore {
        self.store
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl AuthStorage for FileAuthStorage {
    fn get(&self, key: &str) -> Option<CredentialEntry> {
        self.store
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
    }

    fn reload(&self) {
        let fresh = CredentialStore::load_blocking(&self.path);
        debug!(path = %self.path.display(), entries = fresh.len(), "Reloaded credentials");
        *self.store.write().unwrap_or_else(PoisonError::into_inner) = fresh;
    }
}
