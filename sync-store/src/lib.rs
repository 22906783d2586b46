//! # sync-store
//!
//! Persistent key-value store for portal sync.
//!
//! Values are stored as JSON strings in an injected [`StorageBackend`]
//! (the local-device storage medium). [`PersistentStore`] layers typed
//! get/set on top, keeps an in-memory mirror of every value it has seen, and
//! never surfaces storage or decoding failures to callers of `get`/`set`:
//! they log and fall back to the caller's initial value instead.
//!
//! ## Example
//!
//! ```ignore
//! use sync_store::{FileBackend, PersistentStore};
//!
//! let backend = FileBackend::open("store.json")?;
//! let store = PersistentStore::new(backend);
//!
//! store.set("theme", &"dark");
//! let theme: String = store.get("theme", "light".to_string());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
mod error;
mod store;

pub use backend::{BackendError, FileBackend, MemoryBackend, StorageBackend};
pub use error::StoreError;
pub use store::{PersistentStore, StoredValue};
