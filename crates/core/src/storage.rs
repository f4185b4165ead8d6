//! Best-effort key-value persistence for wizard sessions.
//!
//! The app shell provides a device key-value store; this module gives the
//! engine the same contract plus a file-backed implementation for desktop
//! and test use. Wizards treat persistence as fire-and-forget: failures are
//! logged and swallowed, never retried or surfaced (losing a saved session
//! must never break the feature that saved it).

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Errors from the key-value store or the session envelope.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    #[error("failed to create storage directory: {0}")]
    DirCreation(io::Error),

    #[error("failed to write value: {0}")]
    Write(io::Error),

    #[error("failed to read value: {0}")]
    Read(io::Error),

    #[error("failed to remove value: {0}")]
    Remove(io::Error),

    #[error("failed to serialise session state: {0}")]
    Serialisation(serde_json::Error),

    #[error("failed to deserialise session state: {0}")]
    Deserialisation(serde_json::Error),
}

/// The key-value persistence contract.
pub trait KeyValueStore {
    /// Returns the stored value, or `None` when the key has never been set.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// One file per key beneath a root directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Maps a key to its file path.
    ///
    /// Keys are restricted to a conservative character set so they can never
    /// escape the root directory or produce an invalid file name.
    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        if key.is_empty() {
            return Err(StorageError::InvalidKey("key cannot be empty".into()));
        }
        let ok = key
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' | b'.' | b'-' | b'_'));
        if !ok {
            return Err(StorageError::InvalidKey(format!(
                "key `{key}` contains invalid characters (only alphanumeric, '.', '-', '_' allowed)"
            )));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(StorageError::Read(error)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.root).map_err(StorageError::DirCreation)?;
        fs::write(&path, value).map_err(StorageError::Write)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(StorageError::Remove(error)),
        }
    }
}

/// In-memory store for tests and previews.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.values.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.values().remove(key);
        Ok(())
    }
}

/// A persisted session with its save timestamp.
#[derive(Clone, Debug, PartialEq)]
pub struct SavedSession<T> {
    pub saved_at: DateTime<Utc>,
    pub state: T,
}

#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionEnvelope<T> {
    saved_at: DateTime<Utc>,
    state: T,
}

/// Saves serde-serialisable session state under a key.
///
/// # Errors
///
/// Returns a [`StorageError`] when serialisation or the underlying store
/// fails; callers on the wizard path should prefer
/// [`save_session_best_effort`].
pub fn save_session<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    state: &T,
) -> Result<(), StorageError> {
    let envelope = SessionEnvelope {
        saved_at: Utc::now(),
        state,
    };
    let serialised = serde_json::to_string(&envelope).map_err(StorageError::Serialisation)?;
    store.set(key, &serialised)
}

/// Loads previously saved session state from a key.
///
/// # Errors
///
/// Returns a [`StorageError`] when the store fails or the stored value no
/// longer deserialises (for example after a schema change).
pub fn load_session<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<SavedSession<T>>, StorageError> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    let envelope: SessionEnvelope<T> =
        serde_json::from_str(&raw).map_err(StorageError::Deserialisation)?;
    Ok(Some(SavedSession {
        saved_at: envelope.saved_at,
        state: envelope.state,
    }))
}

/// [`save_session`], with failures logged and swallowed.
pub fn save_session_best_effort<T: Serialize>(store: &dyn KeyValueStore, key: &str, state: &T) {
    if let Err(error) = save_session(store, key, state) {
        tracing::warn!("failed to persist session state for `{key}`: {error}");
    }
}

/// [`load_session`], with failures logged and treated as "nothing saved".
pub fn load_session_best_effort<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Option<SavedSession<T>> {
    match load_session(store, key) {
        Ok(saved) => saved,
        Err(error) => {
            tracing::warn!("failed to load session state for `{key}`: {error}");
            None
        }
    }
}
