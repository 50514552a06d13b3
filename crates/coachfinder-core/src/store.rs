//! Key-value persistence and the auth token store built on it.
//!
//! The app keeps its session tokens and the signed-in user object in a flat
//! string-to-string store. [`KeyValueStore`] is that collaborator's surface;
//! [`MemoryStore`] backs tests and [`FileStore`] persists to a JSON file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ACCESS_TOKEN_KEY: &str = "auth.accessToken";
pub const REFRESH_TOKEN_KEY: &str = "auth.refreshToken";
pub const USER_KEY: &str = "auth.user";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("store contents at {context} are not valid JSON: {source}")]
    Serde {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("store lock poisoned")]
    Poisoned,
}

pub trait KeyValueStore: Send + Sync {
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing storage cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removes every listed key. Missing keys are not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing storage cannot be written.
    fn multi_remove(&self, keys: &[&str]) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, String>>, StoreError> {
        self.entries.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.lock()?.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn multi_remove(&self, keys: &[&str]) -> Result<(), StoreError> {
        let mut entries = self.lock()?;
        for key in keys {
            entries.remove(*key);
        }
        Ok(())
    }
}

/// A store persisted as a single JSON object on disk.
///
/// Every operation reads and rewrites the whole file; the store holds a
/// handful of small entries. A missing file reads as empty.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<HashMap<String, String>, StoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if raw.trim().is_empty() {
            return Ok(HashMap::new());
        }
        serde_json::from_str(&raw).map_err(|source| StoreError::Serde {
            context: self.path.display().to_string(),
            source,
        })
    }

    fn write_all(&self, entries: &HashMap<String, String>) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let body = serde_json::to_string_pretty(entries).map_err(|source| StoreError::Serde {
            context: self.path.display().to_string(),
            source,
        })?;
        std::fs::write(&self.path, body).map_err(io_err)
    }

    fn locked<T>(
        &self,
        f: impl FnOnce(&Self) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let _held = self.guard.lock().map_err(|_| StoreError::Poisoned)?;
        f(self)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.locked(|s| Ok(s.read_all()?.remove(key)))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.locked(|s| {
            let mut entries = s.read_all()?;
            entries.insert(key.to_owned(), value.to_owned());
            s.write_all(&entries)
        })
    }

    fn multi_remove(&self, keys: &[&str]) -> Result<(), StoreError> {
        self.locked(|s| {
            let mut entries = s.read_all()?;
            let before = entries.len();
            for key in keys {
                entries.remove(*key);
            }
            if entries.len() == before {
                return Ok(());
            }
            s.write_all(&entries)
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

/// Persists the signed-in session on top of any [`KeyValueStore`].
pub struct AuthTokenStore<S> {
    store: S,
}

impl<S: KeyValueStore> AuthTokenStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the underlying store fails.
    pub fn save_tokens(&self, tokens: &AuthTokens) -> Result<(), StoreError> {
        self.store.set(ACCESS_TOKEN_KEY, &tokens.access_token)?;
        match &tokens.refresh_token {
            Some(refresh) => self.store.set(REFRESH_TOKEN_KEY, refresh),
            None => self.store.multi_remove(&[REFRESH_TOKEN_KEY]),
        }
    }

    /// Returns `None` when no access token is stored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the underlying store fails.
    pub fn load_tokens(&self) -> Result<Option<AuthTokens>, StoreError> {
        let Some(access_token) = self.store.get(ACCESS_TOKEN_KEY)? else {
            return Ok(None);
        };
        Ok(Some(AuthTokens {
            access_token,
            refresh_token: self.store.get(REFRESH_TOKEN_KEY)?,
        }))
    }

    /// # Errors
    ///
    /// Returns [`StoreError::Serde`] if `user` cannot be serialized, or any
    /// error from the underlying store.
    pub fn save_user<U: Serialize>(&self, user: &U) -> Result<(), StoreError> {
        let raw = serde_json::to_string(user).map_err(|source| StoreError::Serde {
            context: USER_KEY.to_string(),
            source,
        })?;
        self.store.set(USER_KEY, &raw)
    }

    /// # Errors
    ///
    /// Returns [`StoreError::Serde`] if the stored user does not deserialize
    /// into `U`, or any error from the underlying store.
    pub fn load_user<U: DeserializeOwned>(&self) -> Result<Option<U>, StoreError> {
        self.store
            .get(USER_KEY)?
            .map(|raw| {
                serde_json::from_str(&raw).map_err(|source| StoreError::Serde {
                    context: USER_KEY.to_string(),
                    source,
                })
            })
            .transpose()
    }

    /// Forgets the whole session.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the underlying store fails.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.store
            .multi_remove(&[ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY])
    }
}
