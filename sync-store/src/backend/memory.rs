//! In-memory storage backend.
//!
//! Allows seeding raw data, simulating a storage quota and forcing failures
//! for testing.

use super::{BackendError, StorageBackend};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// In-memory storage backend.
///
/// Stores raw strings in a thread-safe HashMap. Not persistent - all data
/// is lost when the last clone is dropped. Clones share the same map.
#[derive(Debug, Default, Clone)]
pub struct MemoryBackend {
    inner: Arc<Mutex<MemoryBackendInner>>,
}

#[derive(Debug, Default)]
struct MemoryBackendInner {
    items: HashMap<String, String>,
    quota: Option<usize>,
    fail_next_read: Option<String>,
    fail_next_write: Option<String>,
}

impl MemoryBackendInner {
    fn used_bytes(&self) -> usize {
        self.items.iter().map(|(k, v)| k.len() + v.len()).sum()
    }
}

impl MemoryBackend {
    /// Create a new empty backend with no quota.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend that rejects writes pushing it past `limit` bytes.
    ///
    /// Usage is counted as the sum of key and value lengths.
    pub fn with_quota(limit: usize) -> Self {
        let backend = Self::default();
        backend.inner.lock().unwrap().quota = Some(limit);
        backend
    }

    /// Cause the next read to fail with the given error.
    pub fn fail_next_read(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_read = Some(error.to_string());
    }

    /// Cause the next write to fail with the given error.
    pub fn fail_next_write(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_write = Some(error.to_string());
    }

    /// Raw value currently stored under `key`.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.inner.lock().unwrap().items.get(key).cloned()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().items.len()
    }

    /// Check if the backend is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().items.is_empty()
    }
}

impl StorageBackend for MemoryBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>, BackendError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(error) = inner.fail_next_read.take() {
            return Err(BackendError::Unavailable(error));
        }
        Ok(inner.items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), BackendError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(error) = inner.fail_next_write.take() {
            return Err(BackendError::Unavailable(error));
        }

        if let Some(limit) = inner.quota {
            let current = inner.items.get(key).map(|v| key.len() + v.len()).unwrap_or(0);
            let needed = inner.used_bytes() - current + key.len() + value.len();
            if needed > limit {
                return Err(BackendError::QuotaExceeded { needed, limit });
            }
        }

        inner.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), BackendError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(error) = inner.fail_next_write.take() {
            return Err(BackendError::Unavailable(error));
        }
        inner.items.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, BackendError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.items.keys().cloned().collect())
    }

    fn clear(&self) -> Result<(), BackendError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(error) = inner.fail_next_write.take() {
            return Err(BackendError::Unavailable(error));
        }
        inner.items.clear();
        Ok(())
    }
}
