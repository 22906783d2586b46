//! Inspect and edit the local store.

use anyhow::{Context, Result};
use serde_json::Value;
use sync_store::PersistentStore;

/// Print the value under `key` as pretty JSON.
pub fn get(store: &PersistentStore, key: &str) -> Result<()> {
    let value: Value = store
        .try_get(key)
        .with_context(|| format!("Failed to read key '{}'", key))?
        .with_context(|| format!("Key not found: {}", key))?;

    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

/// Parse `raw` as JSON and store it under `key`.
pub fn set(store: &PersistentStore, key: &str, raw: &str) -> Result<()> {
    let value: Value = serde_json::from_str(raw)
        .with_context(|| format!("Invalid JSON value for '{}': {}", key, raw))?;

    store
        .try_set(key, &value)
        .with_context(|| format!("Failed to write key '{}'", key))?;
    println!("Stored {}", key);
    Ok(())
}

/// Delete `key`. Removing a missing key is not an error.
pub fn remove(store: &PersistentStore, key: &str) {
    store.remove(key);
    println!("Removed {}", key);
}

/// Print every key, one per line.
pub fn keys(store: &PersistentStore) {
    for key in store.keys() {
        println!("{}", key);
    }
}

/// Delete every key.
pub fn clear(store: &PersistentStore) {
    let count = store.keys().len();
    store.clear();
    println!("Cleared {} keys", count);
}
