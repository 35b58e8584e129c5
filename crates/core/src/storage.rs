//! Durable key/value storage for session state
//!
//! Values are JSON documents addressed by a string key, mirroring browser
//! `localStorage`. Writes replace the whole value; last write wins.

use crate::{CoreError, CoreResult};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Raw string storage keyed by name
pub trait Storage: Send + Sync {
    /// Read the raw value for `key`
    fn get_raw(&self, key: &str) -> CoreResult<Option<String>>;

    /// Replace the raw value for `key`
    fn set_raw(&self, key: &str, value: &str) -> CoreResult<()>;

    /// Remove `key`; removing a missing key is not an error
    fn remove(&self, key: &str) -> CoreResult<()>;
}

/// Typed JSON helpers over any [`Storage`]
pub trait StorageExt: Storage {
    fn get<T: DeserializeOwned>(&self, key: &str) -> CoreResult<Option<T>> {
        match self.get_raw(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn set<T: Serialize>(&self, key: &str, value: &T) -> CoreResult<()> {
        let raw = serde_json::to_string(value)?;
        self.set_raw(key, &raw)
    }
}

impl<S: Storage + ?Sized> StorageExt for S {}

/// One JSON file per key inside a state directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn get_raw(&self, key: &str) -> CoreResult<Option<String>> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(CoreError::storage(key, err.to_string())),
        }
    }

    fn set_raw(&self, key: &str, value: &str) -> CoreResult<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| CoreError::storage(key, e.to_string()))?;

        // Write then rename so readers never observe a half-written file
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value).map_err(|e| CoreError::storage(key, e.to_string()))?;
        std::fs::rename(&tmp, &path).map_err(|e| CoreError::storage(key, e.to_string()))
    }

    fn remove(&self, key: &str) -> CoreResult<()> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(CoreError::storage(key, err.to_string())),
        }
    }
}

/// In-process storage, used by tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> CoreResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.values
            .lock()
            .map_err(|_| CoreError::internal_error("memory storage lock poisoned"))
    }
}

impl Storage for MemoryStorage {
    fn get_raw(&self, key: &str) -> CoreResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set_raw(&self, key: &str, value: &str) -> CoreResult<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> CoreResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}
