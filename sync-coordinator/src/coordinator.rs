//! SyncCoordinator - drives periodic role-based sync.
//!
//! This module provides [`SyncCoordinator`], the lifecycle component that
//! keeps the signed-in user's data set fresh.
//!
//! # Architecture
//!
//! The coordinator feeds session changes and timer ticks into the pure
//! [`SyncMachine`] from sync-core and interprets the resulting actions.
//!
//! ```text
//! Session (watch) ──┐
//!                   ├──► SyncMachine ──► actions ──► TimerHandle / SyncTrigger
//! TimerHandle tick ─┘        (sync-core, pure)
//! ```
//!
//! Every event is handled synchronously while holding the coordinator lock,
//! so a cancel is always complete before the next timer is armed. Timer
//! tasks and the session listener only hold weak references; dropping the
//! coordinator tears everything down.

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use sync_core::{Action, CoordinatorEvent, CoordinatorState, Event, SyncMachine, SyncPolicy};
use sync_types::{Session, SyncKind};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::timer::TimerHandle;
use crate::trigger::Triggers;

/// Capacity of the observer event channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// The periodic sync coordinator.
///
/// Owns at most one armed timer. Dropping the coordinator is equivalent to
/// calling [`SyncCoordinator::teardown`].
pub struct SyncCoordinator {
    shared: Arc<Shared>,
    listener: Option<JoinHandle<()>>,
}

struct Shared {
    inner: Mutex<Inner>,
    events: broadcast::Sender<CoordinatorEvent>,
}

struct Inner {
    machine: SyncMachine,
    timer: Option<TimerHandle>,
    triggers: Triggers,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SyncCoordinator {
    /// Start coordinating.
    ///
    /// The current session value is evaluated immediately, so an already
    /// signed-in user is synced right away. Must be called from within a
    /// tokio runtime.
    pub fn spawn(
        policy: SyncPolicy,
        mut session: watch::Receiver<Session>,
        triggers: Triggers,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let shared = Arc::new(Shared {
            inner: Mutex::new(Inner {
                machine: SyncMachine::new(policy),
                timer: None,
                triggers,
            }),
            events,
        });

        let initial = session.borrow_and_update().clone();
        dispatch(&shared, Event::SessionChanged { session: initial });

        let weak = Arc::downgrade(&shared);
        let listener = tokio::spawn(listen(weak, session));

        Self {
            shared,
            listener: Some(listener),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> CoordinatorState {
        self.shared.lock().machine.state()
    }

    /// Kind of the currently armed timer, if any.
    pub fn armed_kind(&self) -> Option<SyncKind> {
        self.shared
            .lock()
            .timer
            .as_ref()
            .filter(|timer| timer.is_armed())
            .map(TimerHandle::kind)
    }

    /// Receive events emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<CoordinatorEvent> {
        self.shared.events.subscribe()
    }

    /// Stop listening and cancel every timer.
    ///
    /// Synchronous and idempotent. Syncs already dispatched run to
    /// completion; nothing new is dispatched afterwards.
    pub fn teardown(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
        dispatch(&self.shared, Event::Teardown);
    }
}

impl Drop for SyncCoordinator {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for SyncCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncCoordinator")
            .field("state", &self.state())
            .field("listening", &self.listener.is_some())
            .finish()
    }
}

async fn listen(shared: Weak<Shared>, mut session: watch::Receiver<Session>) {
    while session.changed().await.is_ok() {
        let current = session.borrow_and_update().clone();
        let Some(shared) = shared.upgrade() else {
            return;
        };
        dispatch(&shared, Event::SessionChanged { session: current });
    }

    // Sender dropped: the session no longer exists.
    tracing::debug!("Session channel closed");
    if let Some(shared) = shared.upgrade() {
        dispatch(
            &shared,
            Event::SessionChanged {
                session: Session::anonymous(),
            },
        );
    }
}

/// Run one event through the machine and execute the resulting actions.
fn dispatch(shared: &Arc<Shared>, event: Event) {
    let mut inner = shared.lock();
    let before = inner.machine.state();
    let actions = inner.machine.on_event(event);
    if !actions.is_empty() {
        tracing::debug!("Coordinator {:?} -> {:?}", before, inner.machine.state());
    }

    for action in actions {
        match action {
            Action::CancelTimers => {
                if let Some(mut timer) = inner.timer.take() {
                    timer.cancel();
                }
            }
            Action::TriggerSync { kind } => {
                let trigger = inner.triggers.for_kind(kind);
                tokio::spawn(async move {
                    trigger.sync().await;
                });
            }
            Action::ArmTimer {
                kind,
                period,
                epoch,
            } => {
                let weak = Arc::downgrade(shared);
                let timer = TimerHandle::arm(kind, period, epoch, move || match weak.upgrade() {
                    Some(shared) => {
                        dispatch(&shared, Event::TimerFired { kind, epoch });
                        true
                    }
                    None => false,
                });
                inner.timer = Some(timer);
            }
            Action::EmitEvent(event) => {
                // No subscribers is fine.
                let _ = shared.events.send(event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{session_channel, SessionPublisher};
    use crate::trigger::SyncTrigger;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use sync_core::TriggerSource;
    use sync_types::{Role, User};
    use tokio::time::{sleep_until, Instant};

    #[derive(Default)]
    struct CountingTrigger {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl SyncTrigger for CountingTrigger {
        async fn sync(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct PanickingTrigger {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl SyncTrigger for PanickingTrigger {
        async fn sync(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            panic!("remote exploded");
        }
    }

    struct Harness {
        publisher: SessionPublisher,
        coordinator: SyncCoordinator,
        assignments: Arc<AtomicUsize>,
        submissions: Arc<AtomicUsize>,
        start: Instant,
    }

    impl Harness {
        fn new() -> Self {
            let (publisher, rx) = session_channel();
            Self::with_receiver(publisher, rx)
        }

        fn with_receiver(publisher: SessionPublisher, rx: watch::Receiver<Session>) -> Self {
            let assignments = Arc::new(AtomicUsize::new(0));
            let submissions = Arc::new(AtomicUsize::new(0));
            let triggers = Triggers::new(
                CountingTrigger {
                    calls: Arc::clone(&assignments),
                },
                CountingTrigger {
                    calls: Arc::clone(&submissions),
                },
            );
            let start = Instant::now();
            let coordinator = SyncCoordinator::spawn(SyncPolicy::default(), rx, triggers);
            Self {
                publisher,
                coordinator,
                assignments,
                submissions,
                start,
            }
        }

        /// Advance the paused clock to `ms` after start and let tasks run.
        async fn at(&self, ms: u64) {
            sleep_until(self.start + Duration::from_millis(ms)).await;
        }

        fn assignment_syncs(&self) -> usize {
            self.assignments.load(Ordering::SeqCst)
        }

        fn submission_syncs(&self) -> usize {
            self.submissions.load(Ordering::SeqCst)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn idle_without_session() {
        let h = Harness::new();
        h.at(200_000).await;

        assert_eq!(h.coordinator.state(), CoordinatorState::Idle);
        assert_eq!(h.assignment_syncs(), 0);
        assert_eq!(h.submission_syncs(), 0);
        assert_eq!(h.coordinator.armed_kind(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn student_login_syncs_once_before_first_tick() {
        let h = Harness::new();
        h.publisher.login(User::new("u1", Role::Student));

        h.at(1).await;
        assert_eq!(h.assignment_syncs(), 1);
        assert_eq!(h.coordinator.armed_kind(), Some(SyncKind::Assignments));

        h.at(59_999).await;
        assert_eq!(h.assignment_syncs(), 1);

        h.at(60_001).await;
        assert_eq!(h.assignment_syncs(), 2);
        assert_eq!(h.submission_syncs(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn student_syncs_every_interval() {
        let h = Harness::new();
        h.publisher.login(User::new("u1", Role::Student));

        h.at(120_001).await;
        // t=0, t=60000, t=120000
        assert_eq!(h.assignment_syncs(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn logout_stops_syncing() {
        let h = Harness::new();
        h.publisher.login(User::new("u1", Role::Student));

        h.at(60_001).await;
        assert_eq!(h.assignment_syncs(), 2);

        h.at(90_000).await;
        h.publisher.logout();
        h.at(90_001).await;
        assert_eq!(h.coordinator.state(), CoordinatorState::Idle);
        assert_eq!(h.coordinator.armed_kind(), None);

        h.at(300_000).await;
        assert_eq!(h.assignment_syncs(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn role_switch_moves_to_submissions() {
        let h = Harness::new();
        h.publisher.login(User::new("u1", Role::Student));
        h.at(1).await;
        assert_eq!(h.assignment_syncs(), 1);

        h.at(30_000).await;
        h.publisher.set_role(Role::Faculty);
        h.at(30_001).await;
        assert_eq!(h.submission_syncs(), 1);
        assert_eq!(h.coordinator.armed_kind(), Some(SyncKind::Submissions));

        h.at(60_001).await;
        assert_eq!(h.assignment_syncs(), 1);
        assert_eq!(h.submission_syncs(), 1);

        h.at(90_001).await;
        assert_eq!(h.submission_syncs(), 2);
        assert_eq!(h.assignment_syncs(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn switch_to_admin_stops_assignment_timer() {
        let h = Harness::new();
        h.publisher.login(User::new("u1", Role::Student));
        h.at(1).await;
        assert_eq!(h.assignment_syncs(), 1);
        assert_eq!(h.coordinator.armed_kind(), Some(SyncKind::Assignments));

        h.at(30_000).await;
        h.publisher.set_role(Role::Admin);
        h.at(30_001).await;
        assert_eq!(
            h.coordinator.state(),
            CoordinatorState::ActiveOther { role: Role::Admin }
        );
        assert_eq!(h.coordinator.armed_kind(), None);

        h.at(300_000).await;
        assert_eq!(h.assignment_syncs(), 1);
        assert_eq!(h.submission_syncs(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn admin_syncs_nothing() {
        let h = Harness::new();
        h.publisher.login(User::new("root", Role::Admin));

        h.at(200_000).await;
        assert_eq!(
            h.coordinator.state(),
            CoordinatorState::ActiveOther { role: Role::Admin }
        );
        assert_eq!(h.coordinator.armed_kind(), None);
        assert_eq!(h.assignment_syncs(), 0);
        assert_eq!(h.submission_syncs(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn already_signed_in_session_syncs_on_spawn() {
        let publisher = SessionPublisher::new(Session::authenticated(User::new("f1", Role::Faculty)));
        let rx = publisher.subscribe();
        let h = Harness::with_receiver(publisher, rx);

        h.at(1).await;
        assert_eq!(h.submission_syncs(), 1);
        assert!(matches!(
            h.coordinator.state(),
            CoordinatorState::ActiveFaculty { .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn profile_refresh_does_not_resync() {
        let h = Harness::new();
        h.publisher.login(User::new("u1", Role::Student));
        h.at(1).await;

        h.publisher
            .login(User::new("u1", Role::Student).with_name("New Display Name"));
        h.at(2).await;
        assert_eq!(h.assignment_syncs(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_twice_is_safe() {
        let mut h = Harness::new();
        h.publisher.login(User::new("u1", Role::Student));
        h.at(1).await;

        h.coordinator.teardown();
        h.coordinator.teardown();
        assert_eq!(h.coordinator.state(), CoordinatorState::Terminated);
        assert_eq!(h.coordinator.armed_kind(), None);

        h.at(200_000).await;
        assert_eq!(h.assignment_syncs(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_ignores_later_sessions() {
        let mut h = Harness::new();
        h.coordinator.teardown();

        h.publisher.login(User::new("u1", Role::Student));
        h.at(120_000).await;
        assert_eq!(h.assignment_syncs(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_cancels_timers() {
        let h = Harness::new();
        h.publisher.login(User::new("u1", Role::Faculty));
        h.at(1).await;

        let Harness {
            publisher: _publisher,
            coordinator,
            submissions,
            start,
            ..
        } = h;
        drop(coordinator);

        sleep_until(start + Duration::from_millis(300_000)).await;
        assert_eq!(submissions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn closed_session_channel_goes_idle() {
        let h = Harness::new();
        h.publisher.login(User::new("u1", Role::Student));
        h.at(1).await;

        let Harness {
            publisher,
            coordinator,
            assignments,
            start,
            ..
        } = h;
        drop(publisher);
        sleep_until(start + Duration::from_millis(2)).await;
        assert_eq!(coordinator.state(), CoordinatorState::Idle);

        sleep_until(start + Duration::from_millis(300_000)).await;
        assert_eq!(assignments.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_trigger_does_not_stop_timer() {
        let calls = Arc::new(AtomicUsize::new(0));
        let triggers = Triggers::new(
            PanickingTrigger {
                calls: Arc::clone(&calls),
            },
            CountingTrigger::default(),
        );
        let (publisher, rx) = session_channel();
        let start = Instant::now();
        let coordinator = SyncCoordinator::spawn(SyncPolicy::default(), rx, triggers);

        publisher.login(User::new("u1", Role::Student));
        sleep_until(start + Duration::from_millis(120_001)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(
            coordinator.state(),
            CoordinatorState::ActiveStudent { .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn observers_see_lifecycle_events() {
        let h = Harness::new();
        let mut events = h.coordinator.subscribe();

        h.publisher.login(User::new("u1", Role::Student));
        h.at(1).await;
        h.publisher.logout();
        h.at(2).await;

        assert_eq!(
            events.recv().await.unwrap(),
            CoordinatorEvent::Activated {
                role: Role::Student
            }
        );
        assert_eq!(
            events.recv().await.unwrap(),
            CoordinatorEvent::SyncTriggered {
                kind: SyncKind::Assignments,
                source: TriggerSource::Immediate,
            }
        );
        assert_eq!(
            events.recv().await.unwrap(),
            CoordinatorEvent::Deactivated {
                role: Role::Student
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn custom_interval_is_honored() {
        let (publisher, rx) = session_channel();
        let calls = Arc::new(AtomicUsize::new(0));
        let triggers = Triggers::new(
            CountingTrigger::default(),
            CountingTrigger {
                calls: Arc::clone(&calls),
            },
        );
        let policy = SyncPolicy::new().with_interval(SyncKind::Submissions, Duration::from_secs(5));
        let start = Instant::now();
        let _coordinator = SyncCoordinator::spawn(policy, rx, triggers);

        publisher.login(User::new("f1", Role::Faculty));
        sleep_until(start + Duration::from_millis(15_001)).await;

        // t=0, 5s, 10s, 15s
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }
}
