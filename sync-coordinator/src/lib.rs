//! # sync-coordinator
//!
//! Periodic sync coordinator for the course portal.
//!
//! This is the runtime half of the sync core. It watches the session,
//! feeds changes into the pure state machine from `sync-core`, and
//! interprets the resulting actions: arming and cancelling timers and
//! dispatching fire-and-forget sync triggers.
//!
//! ## Features
//!
//! - **Session Subscription**: Re-evaluates on every `watch` notification
//! - **Scoped Timers**: Owned [`TimerHandle`]s, cancelled on drop
//! - **Failure-Opaque Triggers**: Sync failures never reach the timer loop
//! - **Pluggable Remote**: [`RemoteSource`] trait (HTTP, mock)
//!
//! ## Example
//!
//! ```ignore
//! use sync_coordinator::{session_channel, HttpSource, SyncCoordinator, Triggers};
//!
//! let (publisher, session) = session_channel();
//! let triggers = Triggers::pull(Arc::new(HttpSource::new(&config.remote)?), store.clone());
//! let mut coordinator = SyncCoordinator::spawn(config.policy(), session, triggers);
//!
//! publisher.login(User::new("u1", Role::Student));
//! // ... later
//! coordinator.teardown();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod coordinator;
pub mod session;
pub mod source;
pub mod timer;
pub mod trigger;

pub use config::{Config, ConfigError, RemoteConfig, SyncConfig};
pub use coordinator::SyncCoordinator;
pub use session::{session_channel, SessionPublisher};
pub use source::{HttpSource, MockSource, RemoteSource, SourceError};
pub use timer::TimerHandle;
pub use trigger::{PullTrigger, SyncTrigger, Triggers};
