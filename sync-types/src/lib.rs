//! # sync-types
//!
//! Shared domain types for the course portal sync core.
//!
//! This crate provides the foundational types used across all portal-sync crates:
//! - [`Role`], [`User`], [`Session`] - The authenticated-user context
//! - [`SyncKind`] - Which remote data set a sync refreshes
//! - [`Assignment`], [`Submission`] - Cached records written by sync pulls
//! - [`SyncStatus`] - Per-kind bookkeeping persisted next to the data
//! - [`ParseRoleError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod records;
mod session;

pub use error::ParseRoleError;
pub use records::{Assignment, Submission, SyncKind, SyncStatus};
pub use session::{Role, Session, User};
