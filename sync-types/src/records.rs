//! Cached record types and sync bookkeeping.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which remote data set a sync refreshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncKind {
    /// Course assignments (student view).
    Assignments,
    /// Assignment submissions (faculty view).
    Submissions,
}

impl SyncKind {
    /// All kinds, in a stable order.
    pub const ALL: [SyncKind; 2] = [SyncKind::Assignments, SyncKind::Submissions];

    /// Store key holding the cached records for this kind.
    pub fn storage_key(&self) -> &'static str {
        match self {
            SyncKind::Assignments => "assignments",
            SyncKind::Submissions => "submissions",
        }
    }

    /// Store key holding the [`SyncStatus`] for this kind.
    pub fn status_key(&self) -> &'static str {
        match self {
            SyncKind::Assignments => "syncStatus:assignments",
            SyncKind::Submissions => "syncStatus:submissions",
        }
    }
}

impl fmt::Display for SyncKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.storage_key())
    }
}

/// A course assignment as served by the portal API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    /// Assignment identifier.
    pub id: String,
    /// Course the assignment belongs to.
    pub course_id: String,
    /// Title shown in listings.
    pub title: String,
    /// Longer description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Due date, as sent by the API (ISO 8601).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_at: Option<String>,
}

/// A student's submission for an assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    /// Submission identifier.
    pub id: String,
    /// Assignment this submission answers.
    pub assignment_id: String,
    /// Submitting student.
    pub student_id: String,
    /// Submission time, as sent by the API (ISO 8601).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<String>,
    /// Grade, once marked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<f64>,
    /// Marker feedback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

/// Outcome of the most recent sync attempts for one kind.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    /// Unix millis of the last attempt.
    pub last_attempt_ms: u64,
    /// Unix millis of the last successful pull.
    #[serde(default)]
    pub last_success_ms: Option<u64>,
    /// Error message from the last attempt, cleared on success.
    #[serde(default)]
    pub last_error: Option<String>,
    /// Number of records stored by the last successful pull.
    #[serde(default)]
    pub item_count: usize,
}

impl SyncStatus {
    /// Record a successful pull of `item_count` records at `now_ms`.
    pub fn succeeded(self, now_ms: u64, item_count: usize) -> Self {
        Self {
            last_attempt_ms: now_ms,
            last_success_ms: Some(now_ms),
            last_error: None,
            item_count,
        }
    }

    /// Record a failed attempt at `now_ms`, keeping the last success.
    pub fn failed(self, now_ms: u64, error: impl Into<String>) -> Self {
        Self {
            last_attempt_ms: now_ms,
            last_error: Some(error.into()),
            ..self
        }
    }
}
