//! Session and role types.
//!
//! The session is owned by the authentication subsystem. Sync components only
//! ever read it, so everything here is a plain value type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseRoleError;

/// Portal role of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Enrolled student.
    Student,
    /// Teaching staff.
    Faculty,
    /// Portal administrator.
    Admin,
    /// No role assigned.
    #[default]
    None,
}

impl Role {
    /// Lowercase name, as used on the wire and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Faculty => "faculty",
            Role::Admin => "admin",
            Role::None => "none",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "faculty" => Ok(Role::Faculty),
            "admin" => Ok(Role::Admin),
            "none" | "" => Ok(Role::None),
            _ => Err(ParseRoleError(s.to_string())),
        }
    }
}

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Portal user identifier.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Role used to pick which data set to keep fresh.
    #[serde(rename = "userRole", default)]
    pub role: Role,
}

impl User {
    /// Create a user with the given id and role.
    pub fn new(id: &str, role: Role) -> Self {
        Self {
            id: id.to_string(),
            name: String::new(),
            role,
        }
    }

    /// Set the display name.
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }
}

/// Authentication context as seen by the sync layer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Whether the user is currently signed in.
    pub is_authenticated: bool,
    /// The signed-in user, if any.
    pub user: Option<User>,
}

impl Session {
    /// A signed-out session.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A signed-in session for `user`.
    pub fn authenticated(user: User) -> Self {
        Self {
            is_authenticated: true,
            user: Some(user),
        }
    }

    /// The role that drives sync decisions.
    ///
    /// `Role::None` unless the session is authenticated and carries a user.
    pub fn effective_role(&self) -> Role {
        match (&self.user, self.is_authenticated) {
            (Some(user), true) => user.role,
            _ => Role::None,
        }
    }

    /// True when authenticated with a user attached.
    pub fn is_active(&self) -> bool {
        self.is_authenticated && self.user.is_some()
    }
}
