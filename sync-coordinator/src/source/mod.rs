//! Remote data sources for sync pulls.
//!
//! This module provides a pluggable source layer that abstracts where the
//! portal's assignments and submissions come from (HTTP API, mock for
//! testing).
//!
//! # Design
//!
//! The source trait is async and stateless from the caller's view:
//! - `fetch_assignments()` returns the current assignment list
//! - `fetch_submissions()` returns the current submission list
//!
//! Retries and backoff are not part of this layer.

mod http;
mod mock;

pub use http::HttpSource;
pub use mock::MockSource;

use async_trait::async_trait;
use sync_types::{Assignment, Submission};
use thiserror::Error;

/// Remote source errors.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The request could not be sent or completed.
    #[error("request failed: {0}")]
    Request(String),

    /// The server answered with a non-success status.
    #[error("unexpected status {status} from {url}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Requested URL.
        url: String,
    },

    /// The response body did not decode.
    #[error("decode failed: {0}")]
    Decode(String),

    /// The request timed out.
    #[error("request timeout")]
    Timeout,

    /// The source is not reachable or not configured.
    #[error("source unavailable: {0}")]
    Unavailable(String),
}

/// Source of the portal's remote data.
///
/// Implementations handle the underlying transport (HTTP, mock, etc).
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Fetch every assignment visible to the session.
    async fn fetch_assignments(&self) -> Result<Vec<Assignment>, SourceError>;

    /// Fetch every submission visible to the session.
    async fn fetch_submissions(&self) -> Result<Vec<Submission>, SourceError>;
}
