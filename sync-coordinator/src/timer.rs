//! Scoped periodic timers.
//!
//! A [`TimerHandle`] is returned by [`TimerHandle::arm`] and owns the task
//! that ticks it. Cancelling is idempotent and dropping the handle cancels,
//! so a timer can never outlive whatever owns it.

use std::time::Duration;
use sync_types::SyncKind;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Shortest period a timer will tick at.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Owned handle to a repeating timer.
#[derive(Debug)]
pub struct TimerHandle {
    kind: SyncKind,
    epoch: u64,
    task: Option<JoinHandle<()>>,
}

impl TimerHandle {
    /// Arm a timer that calls `on_tick` every `period`, first after one
    /// full period.
    ///
    /// The timer stops by itself once `on_tick` returns `false`. Must be
    /// called from within a tokio runtime.
    pub fn arm<F>(kind: SyncKind, period: Duration, epoch: u64, on_tick: F) -> Self
    where
        F: Fn() -> bool + Send + 'static,
    {
        let period = period.max(MIN_PERIOD);
        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if !on_tick() {
                    break;
                }
            }
        });

        tracing::info!(
            "Armed {} timer (epoch {}, every {}ms)",
            kind,
            epoch,
            period.as_millis()
        );
        Self {
            kind,
            epoch,
            task: Some(task),
        }
    }

    /// Kind of sync this timer drives.
    pub fn kind(&self) -> SyncKind {
        self.kind
    }

    /// True until cancelled.
    pub fn is_armed(&self) -> bool {
        self.task.is_some()
    }

    /// Stop the timer. Calling this more than once is a no-op.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::info!("Cancelled {} timer (epoch {})", self.kind, self.epoch);
        }
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}
