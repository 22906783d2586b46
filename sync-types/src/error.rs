//! Error types for portal-sync domain types.

use thiserror::Error;

/// A role string did not name a known portal role.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role: {0}")]
pub struct ParseRoleError(pub String);
