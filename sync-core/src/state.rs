//! Coordinator state machine for portal sync.
//!
//! This module provides a pure, side-effect-free state machine for the
//! periodic sync lifecycle. The machine takes events as input and produces a
//! new state plus a list of actions to execute.
//!
//! Arming timers and dispatching syncs is performed by sync-coordinator,
//! not by this module. This enables instant unit testing without a runtime.
//!
//! Every armed timer is tagged with an epoch. A timer firing whose kind or
//! epoch no longer matches the current state is dropped, so a tick that was
//! already queued when the role changed can never run a stale sync.

use std::time::Duration;
use sync_types::{Role, Session, SyncKind};

use crate::policy::SyncPolicy;

/// Coordinator lifecycle state - NO I/O, just state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    /// No session, or the session is not authenticated. No timers.
    Idle,
    /// Authenticated student. Assignment timer armed.
    ActiveStudent {
        /// Epoch of the armed assignment timer.
        epoch: u64,
    },
    /// Authenticated faculty member. Submission timer armed.
    ActiveFaculty {
        /// Epoch of the armed submission timer.
        epoch: u64,
    },
    /// Authenticated with a role that syncs nothing. No timers.
    ActiveOther {
        /// The authenticated role.
        role: Role,
    },
    /// Owning scope torn down. All further events are ignored.
    Terminated,
}

impl CoordinatorState {
    /// Create a new state machine in the Idle state.
    pub fn new() -> Self {
        Self::Idle
    }

    /// Role of the active session, `None` when idle or terminated.
    pub fn role(&self) -> Option<Role> {
        match self {
            Self::ActiveStudent { .. } => Some(Role::Student),
            Self::ActiveFaculty { .. } => Some(Role::Faculty),
            Self::ActiveOther { role } => Some(*role),
            Self::Idle | Self::Terminated => None,
        }
    }

    /// The timer this state expects to be armed, as `(kind, epoch)`.
    pub fn armed_timer(&self) -> Option<(SyncKind, u64)> {
        match self {
            Self::ActiveStudent { epoch } => Some((SyncKind::Assignments, *epoch)),
            Self::ActiveFaculty { epoch } => Some((SyncKind::Submissions, *epoch)),
            _ => None,
        }
    }

    /// Check if a session is currently active.
    pub fn is_active(&self) -> bool {
        self.role().is_some()
    }

    /// Check if the owning scope has been torn down.
    pub fn is_terminated(&self) -> bool {
        matches!(self, Self::Terminated)
    }
}

impl Default for CoordinatorState {
    fn default() -> Self {
        Self::new()
    }
}

/// Events that drive the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The observed session changed.
    SessionChanged {
        /// The new session value.
        session: Session,
    },
    /// A periodic timer fired.
    TimerFired {
        /// Kind the timer was armed for.
        kind: SyncKind,
        /// Epoch the timer was armed with.
        epoch: u64,
    },
    /// The owning scope is being torn down.
    Teardown,
}

/// Actions to be executed by the sync-coordinator runtime.
///
/// These are instructions, not side effects. When a transition returns both
/// `CancelTimers` and `ArmTimer`, the cancel always comes first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Cancel every armed timer. Safe when none are armed.
    CancelTimers,
    /// Dispatch a fire-and-forget sync.
    TriggerSync {
        /// Data set to refresh.
        kind: SyncKind,
    },
    /// Arm a repeating timer whose first tick is one `period` from now.
    ArmTimer {
        /// Data set the timer refreshes.
        kind: SyncKind,
        /// Interval between ticks.
        period: Duration,
        /// Epoch to report back in [`Event::TimerFired`].
        epoch: u64,
    },
    /// Emit an event to observers.
    EmitEvent(CoordinatorEvent),
}

/// Why a sync was dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    /// On entering an active state.
    Immediate,
    /// On a periodic timer tick.
    Timer,
}

/// Events emitted to observers of the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorEvent {
    /// A session became active.
    Activated {
        /// The active role.
        role: Role,
    },
    /// The active role changed without signing out.
    RoleChanged {
        /// Previous role.
        from: Role,
        /// New role.
        to: Role,
    },
    /// The session ended.
    Deactivated {
        /// Role that was active.
        role: Role,
    },
    /// A sync was dispatched.
    SyncTriggered {
        /// Data set being refreshed.
        kind: SyncKind,
        /// What caused the dispatch.
        source: TriggerSource,
    },
    /// The coordinator was torn down.
    Terminated,
}

/// State machine plus the bookkeeping it needs across transitions.
///
/// Holds the policy and the epoch counter so callers only feed events.
#[derive(Debug, Clone)]
pub struct SyncMachine {
    state: CoordinatorState,
    policy: SyncPolicy,
    last_epoch: u64,
}

impl SyncMachine {
    /// Create a machine in the Idle state.
    pub fn new(policy: SyncPolicy) -> Self {
        Self {
            state: CoordinatorState::Idle,
            policy,
            last_epoch: 0,
        }
    }

    /// Current state.
    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    /// Process an event and return the actions to execute, in order.
    ///
    /// This is a pure function of the machine's fields - no side effects.
    pub fn on_event(&mut self, event: Event) -> Vec<Action> {
        match event {
            Event::SessionChanged { session } => self.on_session(&session),
            Event::TimerFired { kind, epoch } => self.on_timer(kind, epoch),
            Event::Teardown => self.on_teardown(),
        }
    }

    fn on_session(&mut self, session: &Session) -> Vec<Action> {
        if self.state.is_terminated() {
            return vec![];
        }

        let previous = self.state.role();

        if !session.is_active() {
            return match previous {
                Some(role) => {
                    self.state = CoordinatorState::Idle;
                    vec![
                        Action::CancelTimers,
                        Action::EmitEvent(CoordinatorEvent::Deactivated { role }),
                    ]
                }
                None => vec![],
            };
        }

        let role = session.effective_role();
        if previous == Some(role) {
            return vec![];
        }

        // Cancel is idempotent, so activation from Idle emits it too.
        let mut actions = vec![Action::CancelTimers];

        let kind = self.policy.kind_for(role);
        self.state = match kind {
            Some(kind) => {
                let epoch = self.next_epoch();
                actions.push(Action::TriggerSync { kind });
                actions.push(Action::ArmTimer {
                    kind,
                    period: self.policy.interval_for(kind),
                    epoch,
                });
                match kind {
                    SyncKind::Assignments => CoordinatorState::ActiveStudent { epoch },
                    SyncKind::Submissions => CoordinatorState::ActiveFaculty { epoch },
                }
            }
            None => CoordinatorState::ActiveOther { role },
        };

        actions.push(Action::EmitEvent(match previous {
            Some(from) => CoordinatorEvent::RoleChanged { from, to: role },
            None => CoordinatorEvent::Activated { role },
        }));
        if let Some(kind) = kind {
            actions.push(Action::EmitEvent(CoordinatorEvent::SyncTriggered {
                kind,
                source: TriggerSource::Immediate,
            }));
        }
        actions
    }

    fn on_timer(&mut self, kind: SyncKind, epoch: u64) -> Vec<Action> {
        if self.state.armed_timer() != Some((kind, epoch)) {
            return vec![];
        }
        vec![
            Action::TriggerSync { kind },
            Action::EmitEvent(CoordinatorEvent::SyncTriggered {
                kind,
                source: TriggerSource::Timer,
            }),
        ]
    }

    fn on_teardown(&mut self) -> Vec<Action> {
        if self.state.is_terminated() {
            return vec![];
        }
        self.state = CoordinatorState::Terminated;
        vec![
            Action::CancelTimers,
            Action::EmitEvent(CoordinatorEvent::Terminated),
        ]
    }

    fn next_epoch(&mut self) -> u64 {
        self.last_epoch = self.last_epoch.wrapping_add(1);
        self.last_epoch
    }
}

impl Default for SyncMachine {
    fn default() -> Self {
        Self::new(SyncPolicy::default())
    }
}
