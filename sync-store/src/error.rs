//! Error types for sync-store.

use thiserror::Error;

use crate::backend::BackendError;

/// Errors from the fallible `try_*` store operations.
///
/// The plain `get`/`set` API never returns these; it logs them instead.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No persistent storage medium is available.
    #[error("storage unavailable")]
    Unavailable,

    /// Stored data is not valid JSON or does not match the requested type.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The storage medium rejected the operation.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}
