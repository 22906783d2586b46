//! File-backed storage on the local device.
//!
//! All keys live in one JSON object file. The file is the only copy of the
//! data: every operation reads it under the handle's lock, and every
//! mutation rewrites it via a temp file and rename. Two handles on the same
//! path therefore see each other's writes and never drop each other's keys,
//! and a crash never leaves a half-written store behind.

use super::{BackendError, StorageBackend};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

type Items = BTreeMap<String, String>;

/// Durable storage backend writing a single JSON file.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileBackend {
    /// Open (or lazily create) the store file at `path`.
    ///
    /// A missing file opens as an empty store; the parent directory is
    /// created if needed.
    ///
    /// # Errors
    ///
    /// Returns `Corrupt` if the file exists but is not a JSON object of
    /// strings, or `Io` if it cannot be read.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, BackendError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let items = load(&path)?;
        tracing::debug!("Opened store file {} ({} keys)", path.display(), items.len());
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        // Guards no data of its own.
        self.lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn persist(&self, items: &Items) -> Result<(), BackendError> {
        let content = serde_json::to_string_pretty(items).map_err(|e| BackendError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Re-read the file, apply `change`, and write it back if it reports a
    /// modification.
    fn mutate<F>(&self, change: F) -> Result<(), BackendError>
    where
        F: FnOnce(&mut Items) -> bool,
    {
        let _guard = self.guard();
        let mut items = load(&self.path)?;
        if change(&mut items) {
            self.persist(&items)?;
        }
        Ok(())
    }
}

/// Read the store file. Missing or blank files are an empty store.
fn load(path: &Path) -> Result<Items, BackendError> {
    match std::fs::read_to_string(path) {
        Ok(content) if content.trim().is_empty() => Ok(Items::new()),
        Ok(content) => serde_json::from_str(&content).map_err(|e| BackendError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Items::new()),
        Err(e) => Err(e.into()),
    }
}

impl StorageBackend for FileBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>, BackendError> {
        let _guard = self.guard();
        Ok(load(&self.path)?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), BackendError> {
        self.mutate(|items| {
            items.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn remove_item(&self, key: &str) -> Result<(), BackendError> {
        self.mutate(|items| items.remove(key).is_some())
    }

    fn keys(&self) -> Result<Vec<String>, BackendError> {
        let _guard = self.guard();
        Ok(load(&self.path)?.into_keys().collect())
    }

    fn clear(&self) -> Result<(), BackendError> {
        self.mutate(|items| {
            items.clear();
            true
        })
    }
}
