//! Typed JSON store over a [`StorageBackend`].
//!
//! [`PersistentStore`] is failure-opaque: `get` falls back to the caller's
//! initial value and `set` never reports an error. When the medium rejects a
//! write the value is kept in an in-memory mirror, so the current process
//! still sees the value it last set.
//!
//! The medium is the source of truth. Reads go to it first, so every store
//! sharing one medium observes the latest write. The mirror is consulted
//! only when there is no medium, when a read fails, or when this store's
//! last write of the key was rejected (the key is "dirty"). A later
//! successful write clears the dirty mark.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::backend::StorageBackend;
use crate::error::StoreError;

/// Shared handle to the key-value store.
///
/// Cloning is cheap; clones share the same mirror and backend.
#[derive(Clone)]
pub struct PersistentStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    backend: Option<Arc<dyn StorageBackend>>,
    mirror: Mutex<Mirror>,
}

/// Last known value per key, plus the keys the medium is behind on.
#[derive(Default)]
struct Mirror {
    values: HashMap<String, Value>,
    dirty: HashSet<String>,
}

impl Mirror {
    fn dirty_value(&self, key: &str) -> Option<&Value> {
        if self.dirty.contains(key) {
            self.values.get(key)
        } else {
            None
        }
    }

    fn forget(&mut self, key: &str) {
        self.values.remove(key);
        self.dirty.remove(key);
    }
}

impl std::fmt::Debug for PersistentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mirror = self.mirror();
        f.debug_struct("PersistentStore")
            .field("persistent", &self.is_persistent())
            .field("mirrored_keys", &mirror.values.len())
            .field("dirty_keys", &mirror.dirty.len())
            .finish()
    }
}

impl PersistentStore {
    /// Create a store over `backend`.
    pub fn new<B: StorageBackend + 'static>(backend: B) -> Self {
        Self::with_backend(Arc::new(backend))
    }

    /// Create a store over a shared backend.
    ///
    /// Stores sharing one backend see each other's writes; last write wins.
    pub fn with_backend(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                backend: Some(backend),
                mirror: Mutex::new(Mirror::default()),
            }),
        }
    }

    /// Create a store with no storage medium.
    ///
    /// Values live only in the in-memory mirror for the life of the process.
    pub fn unavailable() -> Self {
        Self {
            inner: Arc::new(StoreInner {
                backend: None,
                mirror: Mutex::new(Mirror::default()),
            }),
        }
    }

    /// True if values are written to a storage medium.
    pub fn is_persistent(&self) -> bool {
        self.inner.backend.is_some()
    }

    /// Read `key`, falling back to `initial` on absence or any failure.
    ///
    /// Never fails. Decoding and medium errors are logged.
    pub fn get<T: DeserializeOwned>(&self, key: &str, initial: T) -> T {
        match self.try_get(key) {
            Ok(Some(value)) => value,
            Ok(None) => initial,
            Err(StoreError::Unavailable) => {
                tracing::debug!("No storage medium, using initial value for {}", key);
                initial
            }
            Err(e) => {
                tracing::warn!("Error reading store key {}: {}", key, e);
                initial
            }
        }
    }

    /// Write `value` under `key`.
    ///
    /// Never fails. If the medium rejects the write the failure is logged
    /// and the value stays visible to this process through the mirror.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        match self.try_set(key, value) {
            Ok(()) => {}
            Err(StoreError::Unavailable) => {
                tracing::debug!("No storage medium, {} kept in memory only", key);
            }
            Err(e) => {
                tracing::warn!("Error setting store key {}: {}", key, e);
            }
        }
    }

    /// Read `key`, reporting failures.
    ///
    /// Returns `Ok(None)` if the key is not stored.
    ///
    /// # Errors
    ///
    /// `Unavailable` when there is no medium and the key is not mirrored,
    /// `Serialization` when the stored data does not decode as `T`, and
    /// `Backend` when the medium read fails and no value is mirrored.
    pub fn try_get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let Some(backend) = self.inner.backend.as_ref() else {
            let mirrored = self.mirror().values.get(key).cloned();
            return match mirrored {
                Some(value) => Ok(Some(serde_json::from_value(value)?)),
                None => Err(StoreError::Unavailable),
            };
        };

        let dirty = self.mirror().dirty_value(key).cloned();
        if let Some(value) = dirty {
            return Ok(Some(serde_json::from_value(value)?));
        }

        match backend.get_item(key) {
            Ok(Some(raw)) => {
                let value: Value = serde_json::from_str(&raw)?;
                let typed = serde_json::from_value(value.clone())?;
                self.mirror().values.insert(key.to_string(), value);
                Ok(Some(typed))
            }
            Ok(None) => {
                self.mirror().values.remove(key);
                Ok(None)
            }
            Err(e) => {
                let last_known = self.mirror().values.get(key).cloned();
                match last_known {
                    Some(value) => {
                        tracing::debug!("Read of {} failed ({}), using last known value", key, e);
                        Ok(Some(serde_json::from_value(value)?))
                    }
                    None => Err(e.into()),
                }
            }
        }
    }

    /// Write `value` under `key`, reporting failures.
    ///
    /// The mirror is updated before the medium is written, so the value is
    /// visible in-process even when this returns an error other than
    /// `Serialization`.
    ///
    /// # Errors
    ///
    /// `Serialization` if `value` cannot be encoded as JSON, `Unavailable`
    /// when there is no medium, `Backend` when the medium write fails.
    pub fn try_set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(value)?;
        let raw = value.to_string();
        self.mirror().values.insert(key.to_string(), value);

        let Some(backend) = self.inner.backend.as_ref() else {
            self.mirror().dirty.insert(key.to_string());
            return Err(StoreError::Unavailable);
        };

        match backend.set_item(key, &raw) {
            Ok(()) => {
                self.mirror().dirty.remove(key);
                Ok(())
            }
            Err(e) => {
                self.mirror().dirty.insert(key.to_string());
                Err(e.into())
            }
        }
    }

    /// Delete `key` from the mirror and the medium.
    pub fn remove(&self, key: &str) {
        self.mirror().forget(key);
        if let Some(backend) = &self.inner.backend {
            if let Err(e) = backend.remove_item(key) {
                tracing::warn!("Error removing store key {}: {}", key, e);
            }
        }
    }

    /// Delete every key from the mirror and the medium.
    pub fn clear(&self) {
        {
            let mut mirror = self.mirror();
            mirror.values.clear();
            mirror.dirty.clear();
        }
        if let Some(backend) = &self.inner.backend {
            if let Err(e) = backend.clear() {
                tracing::warn!("Error clearing store: {}", e);
            }
        }
    }

    /// All known keys, sorted: stored keys plus keys only held in memory.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: BTreeSet<String> = self.mirror().dirty.iter().cloned().collect();
        if let Some(backend) = &self.inner.backend {
            match backend.keys() {
                Ok(stored) => keys.extend(stored),
                Err(e) => tracing::warn!("Error listing store keys: {}", e),
            }
        }
        keys.into_iter().collect()
    }

    /// True if `key` has a value in the medium or only in memory.
    pub fn contains(&self, key: &str) -> bool {
        if self.mirror().dirty.contains(key) {
            return true;
        }
        match &self.inner.backend {
            Some(backend) => match backend.get_item(key) {
                Ok(found) => found.is_some(),
                Err(_) => self.mirror().values.contains_key(key),
            },
            None => false,
        }
    }

    /// Typed handle bound to `key` with a fallback of `initial`.
    pub fn entry<T>(&self, key: &str, initial: T) -> StoredValue<T>
    where
        T: Serialize + DeserializeOwned + Clone,
    {
        StoredValue {
            store: self.clone(),
            key: key.to_string(),
            initial,
        }
    }

    fn mirror(&self) -> MutexGuard<'_, Mirror> {
        // A panic while holding the lock cannot leave a half-written map.
        self.inner
            .mirror
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// A value of type `T` stored under one key.
///
/// The value-and-setter pair consumers use for durable client-side state.
#[derive(Debug, Clone)]
pub struct StoredValue<T> {
    store: PersistentStore,
    key: String,
    initial: T,
}

impl<T> StoredValue<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    /// The key this handle reads and writes.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Current value, or the initial value.
    pub fn get(&self) -> T {
        self.store.get(&self.key, self.initial.clone())
    }

    /// Replace the value.
    pub fn set(&self, value: &T) {
        self.store.set(&self.key, value);
    }

    /// Replace the value with `f(current)` and return the new value.
    pub fn update<F>(&self, f: F) -> T
    where
        F: FnOnce(T) -> T,
    {
        let next = f(self.get());
        self.set(&next);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{FileBackend, MemoryBackend};
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Prefs {
        theme: String,
        font_size: u8,
        pinned: Vec<String>,
    }

    fn prefs() -> Prefs {
        Prefs {
            theme: "dark".into(),
            font_size: 14,
            pinned: vec!["cs101".into(), "ma201".into()],
        }
    }

    #[test]
    fn get_after_set_returns_value() {
        let store = PersistentStore::new(MemoryBackend::new());
        store.set("prefs", &prefs());

        let loaded: Prefs = store.get(
            "prefs",
            Prefs {
                theme: "light".into(),
                font_size: 12,
                pinned: vec![],
            },
        );
        assert_eq!(loaded, prefs());
    }

    #[test]
    fn unwritten_key_returns_initial() {
        let store = PersistentStore::new(MemoryBackend::new());
        assert_eq!(store.get("missing", 42u32), 42);
        assert_eq!(store.get::<Option<String>>("missing", None), None);
    }

    #[test]
    fn malformed_data_returns_initial() {
        let backend = MemoryBackend::new();
        backend.set_item("prefs", "{not json").unwrap();
        let store = PersistentStore::new(backend);

        assert_eq!(store.get("prefs", 7i64), 7);
        assert!(matches!(
            store.try_get::<i64>("prefs"),
            Err(StoreError::Serialization(_))
        ));
    }

    #[test]
    fn wrong_shape_returns_initial() {
        let backend = MemoryBackend::new();
        backend.set_item("count", r#"{"a":1}"#).unwrap();
        let store = PersistentStore::new(backend);

        assert_eq!(store.get("count", 0u32), 0);
    }

    #[test]
    fn value_is_stored_as_json() {
        let backend = MemoryBackend::new();
        let store = PersistentStore::new(backend.clone());
        store.set("pinned", &vec!["cs101"]);

        assert_eq!(backend.raw("pinned").as_deref(), Some(r#"["cs101"]"#));
    }

    #[test]
    fn failed_write_still_visible_in_process() {
        let backend = MemoryBackend::with_quota(16);
        let store = PersistentStore::new(backend.clone());

        store.set("big", &"x".repeat(64));

        assert_eq!(store.get("big", String::new()), "x".repeat(64));
        assert!(matches!(
            store.try_set("big", &"y".repeat(64)),
            Err(StoreError::Backend(_))
        ));
        assert_eq!(backend.raw("big"), None);

        let fresh = PersistentStore::new(backend);
        assert_eq!(fresh.get("big", String::new()), "");
    }

    #[test]
    fn read_failure_returns_initial() {
        let backend = MemoryBackend::new();
        backend.set_item("n", "5").unwrap();
        backend.fail_next_read("locked");
        let store = PersistentStore::new(backend);

        assert_eq!(store.get("n", 0u8), 0);
        assert_eq!(store.get("n", 0u8), 5);
    }

    #[test]
    fn unavailable_store_skips_persistence() {
        let store = PersistentStore::unavailable();
        assert!(!store.is_persistent());
        assert_eq!(store.get("k", "initial".to_string()), "initial");
        assert!(matches!(
            store.try_get::<String>("k"),
            Err(StoreError::Unavailable)
        ));

        store.set("k", "value");
        assert_eq!(store.get("k", "initial".to_string()), "value");
    }

    #[test]
    fn last_write_wins() {
        let store = PersistentStore::new(MemoryBackend::new());
        let other = store.clone();

        store.set("draft", "from edit");
        other.set("draft", "from sync");

        assert_eq!(store.get("draft", String::new()), "from sync");
    }

    #[test]
    fn stores_sharing_a_backend_see_latest_write() {
        let backend: Arc<dyn StorageBackend> = Arc::new(MemoryBackend::new());
        let ui = PersistentStore::with_backend(Arc::clone(&backend));
        let sync = PersistentStore::with_backend(backend);

        ui.set("draft", "from edit");
        assert_eq!(ui.get("draft", String::new()), "from edit");

        sync.set("draft", "from sync");
        assert_eq!(ui.get("draft", String::new()), "from sync");
        assert_eq!(sync.get("draft", String::new()), "from sync");

        sync.remove("draft");
        assert_eq!(ui.get("draft", String::from("gone")), "gone");
    }

    #[test]
    fn rejected_write_shadows_medium_until_next_write() {
        let shared = MemoryBackend::new();
        let ui = PersistentStore::new(shared.clone());
        let sync = PersistentStore::new(shared.clone());

        shared.fail_next_write("disk full");
        ui.set("draft", "local only");
        sync.set("draft", "from sync");

        // The medium is behind on ui's own write, so ui keeps its value.
        assert_eq!(ui.get("draft", String::new()), "local only");
        assert_eq!(sync.get("draft", String::new()), "from sync");

        ui.set("draft", "saved");
        sync.set("draft", "from sync again");
        assert_eq!(ui.get("draft", String::new()), "from sync again");
    }

    #[test]
    fn read_failure_falls_back_to_last_known_value() {
        let backend = MemoryBackend::new();
        let store = PersistentStore::new(backend.clone());
        store.set("n", &5u8);
        assert_eq!(store.get("n", 0u8), 5);

        backend.fail_next_read("locked");
        assert_eq!(store.get("n", 0u8), 5);
    }

    #[test]
    fn remove_forgets_value() {
        let backend = MemoryBackend::new();
        let store = PersistentStore::new(backend.clone());
        store.set("k", &1u8);

        store.remove("k");

        assert!(!store.contains("k"));
        assert_eq!(store.get("k", 9u8), 9);
        assert!(backend.is_empty());
    }

    #[test]
    fn clear_forgets_everything() {
        let store = PersistentStore::new(MemoryBackend::new());
        store.set("a", &1u8);
        store.set("b", &2u8);

        store.clear();
        assert!(store.keys().is_empty());
    }

    #[test]
    fn keys_merge_backend_and_mirror() {
        let backend = MemoryBackend::new();
        backend.set_item("stored", "1").unwrap();
        let store = PersistentStore::new(backend.clone());
        backend.fail_next_write("full");
        store.set("mirrored", &2u8);

        assert_eq!(store.keys(), vec!["mirrored", "stored"]);
    }

    #[test]
    fn values_persist_across_store_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        PersistentStore::new(FileBackend::open(&path).unwrap()).set("prefs", &prefs());

        let reopened = PersistentStore::new(FileBackend::open(&path).unwrap());
        assert_eq!(reopened.try_get::<Prefs>("prefs").unwrap(), Some(prefs()));
    }

    #[test]
    fn entry_update_applies_function() {
        let store = PersistentStore::new(MemoryBackend::new());
        let visits = store.entry("visits", 0u32);

        assert_eq!(visits.get(), 0);
        assert_eq!(visits.update(|n| n + 1), 1);
        assert_eq!(visits.update(|n| n + 1), 2);
        assert_eq!(store.get("visits", 0u32), 2);
        assert_eq!(visits.key(), "visits");
    }
}
