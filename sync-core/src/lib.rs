//! # sync-core
//!
//! Pure logic for portal sync (no I/O, instant tests).
//!
//! This crate implements the coordinator state machine and the role policy
//! without any timers, tasks or storage, enabling fast unit tests.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects. This enables:
//! - Instant unit tests (no mocks, no async)
//! - Deterministic behavior (same input → same output)
//! - Easy reasoning about state transitions
//!
//! The actual I/O (timers, dispatching syncs) is performed by
//! `sync-coordinator`, which interprets the actions produced by these state
//! machines.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod policy;
pub mod state;

pub use policy::{SyncPolicy, DEFAULT_SYNC_INTERVAL};
pub use state::{
    Action, CoordinatorEvent, CoordinatorState, Event, SyncMachine, TriggerSource,
};
