//! Sync triggers.
//!
//! A trigger is a zero-argument, fire-and-forget refresh. The coordinator
//! dispatches triggers and never looks at their outcome, so every
//! implementation must contain its own failures.
//!
//! [`PullTrigger`] is the standard trigger: it pulls one data set from a
//! [`RemoteSource`] and writes it, plus a [`SyncStatus`], to the store.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use sync_store::PersistentStore;
use sync_types::{SyncKind, SyncStatus};

use crate::source::{RemoteSource, SourceError};

/// A fire-and-forget sync operation.
///
/// `sync` must not panic or report errors; failures are handled inside.
#[async_trait]
pub trait SyncTrigger: Send + Sync {
    /// Refresh the locally cached data.
    async fn sync(&self);
}

/// The trigger to run for each sync kind.
#[derive(Clone)]
pub struct Triggers {
    assignments: Arc<dyn SyncTrigger>,
    submissions: Arc<dyn SyncTrigger>,
}

impl Triggers {
    /// Pair an assignment trigger with a submission trigger.
    pub fn new<A, S>(assignments: A, submissions: S) -> Self
    where
        A: SyncTrigger + 'static,
        S: SyncTrigger + 'static,
    {
        Self {
            assignments: Arc::new(assignments),
            submissions: Arc::new(submissions),
        }
    }

    /// Pull triggers for both kinds sharing one source and store.
    pub fn pull<R: RemoteSource + 'static>(source: Arc<R>, store: PersistentStore) -> Self {
        Self::new(
            PullTrigger::new(SyncKind::Assignments, Arc::clone(&source), store.clone()),
            PullTrigger::new(SyncKind::Submissions, source, store),
        )
    }

    /// The trigger for `kind`.
    pub fn for_kind(&self, kind: SyncKind) -> Arc<dyn SyncTrigger> {
        match kind {
            SyncKind::Assignments => Arc::clone(&self.assignments),
            SyncKind::Submissions => Arc::clone(&self.submissions),
        }
    }
}

impl std::fmt::Debug for Triggers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Triggers").finish_non_exhaustive()
    }
}

/// Pulls one data set from a remote source into the store.
pub struct PullTrigger<R> {
    kind: SyncKind,
    source: Arc<R>,
    store: PersistentStore,
}

impl<R: RemoteSource> PullTrigger<R> {
    /// Create a trigger for `kind`.
    pub fn new(kind: SyncKind, source: Arc<R>, store: PersistentStore) -> Self {
        Self {
            kind,
            source,
            store,
        }
    }

    /// Fetch and store, returning the number of records written.
    ///
    /// On error nothing is written, so previously cached data stays intact.
    pub async fn pull(&self) -> Result<usize, SourceError> {
        let key = self.kind.storage_key();
        let count = match self.kind {
            SyncKind::Assignments => {
                let records = self.source.fetch_assignments().await?;
                self.store.set(key, &records);
                records.len()
            }
            SyncKind::Submissions => {
                let records = self.source.fetch_submissions().await?;
                self.store.set(key, &records);
                records.len()
            }
        };
        Ok(count)
    }
}

#[async_trait]
impl<R: RemoteSource + 'static> SyncTrigger for PullTrigger<R> {
    async fn sync(&self) {
        let result = self.pull().await;

        let status: SyncStatus = self.store.get(self.kind.status_key(), SyncStatus::default());
        let now = now_ms();
        let status = match result {
            Ok(count) => {
                tracing::info!("Synced {} {}", count, self.kind);
                status.succeeded(now, count)
            }
            Err(e) => {
                tracing::warn!("Sync of {} failed: {}", self.kind, e);
                status.failed(now, e.to_string())
            }
        };
        self.store.set(self.kind.status_key(), &status);
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
