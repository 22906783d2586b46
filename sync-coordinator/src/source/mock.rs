//! Mock source for testing.
//!
//! Allows setting canned records, forcing failures and counting fetches.

use super::{RemoteSource, SourceError};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use sync_types::{Assignment, Submission, SyncKind};

/// Mock remote source for testing.
///
/// Clones share state, so a test can keep one clone for setup and
/// verification while the trigger owns another.
#[derive(Debug, Default, Clone)]
pub struct MockSource {
    inner: Arc<Mutex<MockSourceInner>>,
}

#[derive(Debug, Default)]
struct MockSourceInner {
    assignments: Vec<Assignment>,
    submissions: Vec<Submission>,
    fail_next: Option<String>,
    assignment_fetches: usize,
    submission_fetches: usize,
}

impl MockSource {
    /// Create a new mock source with no records.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records returned by `fetch_assignments()`.
    pub fn set_assignments(&self, assignments: Vec<Assignment>) {
        self.inner.lock().unwrap().assignments = assignments;
    }

    /// Records returned by `fetch_submissions()`.
    pub fn set_submissions(&self, submissions: Vec<Submission>) {
        self.inner.lock().unwrap().submissions = submissions;
    }

    /// Cause the next fetch of either kind to fail with the given error.
    pub fn fail_next(&self, error: &str) {
        self.inner.lock().unwrap().fail_next = Some(error.to_string());
    }

    /// Number of fetches made for `kind`, including failed ones.
    pub fn fetches(&self, kind: SyncKind) -> usize {
        let inner = self.inner.lock().unwrap();
        match kind {
            SyncKind::Assignments => inner.assignment_fetches,
            SyncKind::Submissions => inner.submission_fetches,
        }
    }
}

#[async_trait]
impl RemoteSource for MockSource {
    async fn fetch_assignments(&self) -> Result<Vec<Assignment>, SourceError> {
        let mut inner = self.inner.lock().unwrap();
        inner.assignment_fetches += 1;

        if let Some(error) = inner.fail_next.take() {
            return Err(SourceError::Unavailable(error));
        }
        Ok(inner.assignments.clone())
    }

    async fn fetch_submissions(&self) -> Result<Vec<Submission>, SourceError> {
        let mut inner = self.inner.lock().unwrap();
        inner.submission_fetches += 1;

        if let Some(error) = inner.fail_next.take() {
            return Err(SourceError::Unavailable(error));
        }
        Ok(inner.submissions.clone())
    }
}
