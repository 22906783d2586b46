//! Role-to-sync policy.
//!
//! Decides which data set a role keeps fresh and how often. Only one kind is
//! ever assigned to a role, so at most one timer is armed per coordinator.

use std::time::Duration;
use sync_types::{Role, SyncKind};

/// Default refresh interval for every sync kind (60 seconds).
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_millis(60_000);

/// Which sync runs for which role, and at what interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPolicy {
    /// Interval between assignment pulls.
    pub assignments_interval: Duration,
    /// Interval between submission pulls.
    pub submissions_interval: Duration,
}

impl SyncPolicy {
    /// Policy with the default interval for every kind.
    pub fn new() -> Self {
        Self {
            assignments_interval: DEFAULT_SYNC_INTERVAL,
            submissions_interval: DEFAULT_SYNC_INTERVAL,
        }
    }

    /// Override the interval for one kind.
    pub fn with_interval(mut self, kind: SyncKind, interval: Duration) -> Self {
        match kind {
            SyncKind::Assignments => self.assignments_interval = interval,
            SyncKind::Submissions => self.submissions_interval = interval,
        }
        self
    }

    /// The sync kind a role keeps fresh, if any.
    ///
    /// Admins and role-less users sync nothing.
    pub fn kind_for(&self, role: Role) -> Option<SyncKind> {
        match role {
            Role::Student => Some(SyncKind::Assignments),
            Role::Faculty => Some(SyncKind::Submissions),
            Role::Admin | Role::None => None,
        }
    }

    /// Refresh interval for a kind.
    pub fn interval_for(&self, kind: SyncKind) -> Duration {
        match kind {
            SyncKind::Assignments => self.assignments_interval,
            SyncKind::Submissions => self.submissions_interval,
        }
    }
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self::new()
    }
}
