//! Storage medium abstraction for sync-store.
//!
//! This module provides the raw string key-value interface that the typed
//! store sits on (the local-device equivalent of browser local storage).
//!
//! # Design
//!
//! Backends store raw strings only. JSON encoding is the store's job, so
//! backends stay free of any serde contract:
//! - `get_item()` reads a raw value
//! - `set_item()` writes a raw value
//! - `remove_item()` / `clear()` delete
//! - `keys()` lists what is stored
//!
//! Calls are synchronous; local storage I/O is treated as non-suspending.

mod file;
mod memory;

pub use file::FileBackend;
pub use memory::MemoryBackend;

use std::path::PathBuf;
use thiserror::Error;

/// Storage medium errors.
#[derive(Debug, Error)]
pub enum BackendError {
    /// I/O against the medium failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The write would exceed the medium's quota.
    #[error("quota exceeded: {needed} bytes (limit: {limit} bytes)")]
    QuotaExceeded {
        /// Bytes the medium would hold after the write.
        needed: usize,
        /// Maximum bytes allowed.
        limit: usize,
    },

    /// The medium's own data file could not be parsed.
    #[error("corrupt storage file {path}: {reason}")]
    Corrupt {
        /// Path of the storage file.
        path: PathBuf,
        /// Parser error message.
        reason: String,
    },

    /// The medium refused the operation.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Raw string key-value storage medium.
///
/// Implementations must be safe to share between tasks; last write wins
/// when two callers write the same key.
pub trait StorageBackend: Send + Sync {
    /// Read the raw value stored under `key`.
    fn get_item(&self, key: &str) -> Result<Option<String>, BackendError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> Result<(), BackendError>;

    /// Delete `key`. Deleting a missing key is not an error.
    fn remove_item(&self, key: &str) -> Result<(), BackendError>;

    /// All stored keys.
    fn keys(&self) -> Result<Vec<String>, BackendError>;

    /// Delete every key.
    fn clear(&self) -> Result<(), BackendError>;
}
