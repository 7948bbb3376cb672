//! Local session storage for the command line.
//!
//! The CLI has no cookie jar, so a session is kept as a small JSON record in a
//! key/value file on disk. Nothing here is signed: anyone who can edit the
//! file can change the stored identity. It records who logged in on this
//! machine and grants nothing on the server.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use podcast_core::{Email, Role, SessionClaim, SessionStore, UserId};

/// Key the session record is stored under.
pub const SESSION_KEY: &str = "podcast-user";

/// Default state file, relative to the working directory.
pub const DEFAULT_STATE_FILE: &str = ".podcast-session.json";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("state file {0} is not a JSON object of strings")]
    Corrupt(PathBuf),

    #[error("could not encode session: {0}")]
    Encode(#[from] serde_json::Error),
}

/// String key/value storage.
pub trait LocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&mut self, key: &str) -> Result<(), StorageError>;
}

/// [`LocalStorage`] backed by a JSON object in a single file.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Storage at `PODCAST_CLI_STATE`, or [`DEFAULT_STATE_FILE`].
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(
            std::env::var("PODCAST_CLI_STATE").unwrap_or_else(|_| DEFAULT_STATE_FILE.to_owned()),
        )
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => {
                serde_json::from_str(&raw).map_err(|_| StorageError::Corrupt(self.path.clone()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn save(&self, items: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let encoded = serde_json::to_string_pretty(items)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, encoded).map_err(|e| self.io_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))
    }
}

impl LocalStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.load()?.remove(key))
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        // A corrupt file is replaced rather than blocking a fresh login.
        let mut items = self.load().unwrap_or_default();
        items.insert(key.to_owned(), value.to_owned());
        self.save(&items)
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        let mut items = match self.load() {
            Ok(items) => items,
            Err(StorageError::Corrupt(_)) => BTreeMap::new(),
            Err(e) => return Err(e),
        };
        if items.remove(key).is_none() && self.path.exists() {
            return Ok(());
        }
        if items.is_empty() {
            return match fs::remove_file(&self.path) {
                Err(e) if e.kind() != ErrorKind::NotFound => Err(self.io_error(e)),
                _ => Ok(()),
            };
        }
        self.save(&items)
    }
}

/// The identity kept in local storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredUser {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: Role,
}

impl From<&SessionClaim> for StoredUser {
    fn from(claim: &SessionClaim) -> Self {
        Self {
            id: claim.user_id,
            name: claim.name.clone(),
            email: claim.email.clone(),
            role: claim.role,
        }
    }
}

/// [`SessionStore`] over any [`LocalStorage`].
///
/// A missing, unreadable or malformed record reads as no session.
#[derive(Debug, Clone)]
pub struct LocalSessionStore<S> {
    storage: S,
}

impl<S: LocalStorage> LocalSessionStore<S> {
    pub const fn new(storage: S) -> Self {
        Self { storage }
    }
}

impl<S: LocalStorage> SessionStore for LocalSessionStore<S> {
    type Value = StoredUser;
    type Error = StorageError;

    fn persist(&mut self, user: StoredUser) -> Result<(), StorageError> {
        let encoded = serde_json::to_string(&user)?;
        self.storage.set_item(SESSION_KEY, &encoded)
    }

    fn retrieve(&self) -> Option<StoredUser> {
        let raw = match self.storage.get_item(SESSION_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::debug!(error = %e, "session storage unreadable");
                return None;
            }
        };
        serde_json::from_str(&raw)
            .inspect_err(|e| tracing::debug!(error = %e, "stored session is malformed"))
            .ok()
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.storage.remove_item(SESSION_KEY)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use chrono::Utc;

    use super::*;

    #[derive(Default)]
    struct MemoryStorage(HashMap<String, String>);

    impl LocalStorage for MemoryStorage {
        fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
            Ok(self.0.get(key).cloned())
        }

        fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
            self.0.insert(key.to_owned(), value.to_owned());
            Ok(())
        }

        fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
            self.0.remove(key);
            Ok(())
        }
    }

    fn user() -> StoredUser {
        let claim = SessionClaim::new(
            UserId::new(7),
            Email::parse("ana@example.com").unwrap(),
            "Ana".to_owned(),
            Role::User,
            Utc::now(),
        );
        StoredUser::from(&claim)
    }

    #[test]
    fn test_persist_retrieve_clear() {
        let mut store = LocalSessionStore::new(MemoryStorage::default());
        assert_eq!(store.retrieve(), None);

        store.persist(user()).unwrap();
        assert_eq!(store.retrieve(), Some(user()));

        store.clear().unwrap();
        assert_eq!(store.retrieve(), None);
        store.clear().unwrap();
    }

    #[test]
    fn test_malformed_record_is_absent() {
        let mut storage = MemoryStorage::default();
        storage.set_item(SESSION_KEY, "{\"id\": \"seven\"").unwrap();
        assert_eq!(LocalSessionStore::new(storage).retrieve(), None);
    }

    #[test]
    fn test_file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut store = LocalSessionStore::new(FileStorage::new(&path));
        store.persist(user()).unwrap();
        assert!(path.exists());

        // A fresh handle on the same file sees the session.
        let reopened = LocalSessionStore::new(FileStorage::new(&path));
        assert_eq!(reopened.retrieve(), Some(user()));

        store.clear().unwrap();
        assert!(!path.exists());
        assert_eq!(reopened.retrieve(), None);
    }

    #[test]
    fn test_file_storage_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut storage = FileStorage::new(&path);
        storage.set_item("theme", "dark").unwrap();

        let mut store = LocalSessionStore::new(storage.clone());
        store.persist(user()).unwrap();
        store.clear().unwrap();

        assert_eq!(storage.get_item("theme").unwrap().as_deref(), Some("dark"));
        assert_eq!(storage.get_item(SESSION_KEY).unwrap(), None);
    }

    #[test]
    fn test_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "not json").unwrap();

        let mut store = LocalSessionStore::new(FileStorage::new(&path));
        assert_eq!(store.retrieve(), None);

        store.persist(user()).unwrap();
        assert_eq!(store.retrieve(), Some(user()));
    }
}
