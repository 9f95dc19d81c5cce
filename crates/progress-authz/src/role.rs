//! User roles and the acting identity passed into every policy call.
use crate::{AuthzError, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Guest,
    Contributor,
    Manager,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Guest => "guest",
            Role::Contributor => "contributor",
            Role::Manager => "manager",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = AuthzError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "guest" => Ok(Role::Guest),
            "contributor" => Ok(Role::Contributor),
            "manager" => Ok(Role::Manager),
            other => Err(AuthzError::InvalidRole(other.to_string())),
        }
    }
}

/// The identity a request acts as.
///
/// Resolved once per request from the bearer token and the user registry,
/// then threaded explicitly into the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    /// No identity was presented.
    Anonymous,
    User { id: UserId, role: Role },
}

impl Actor {
    pub fn user(id: UserId, role: Role) -> Self {
        Actor::User { id, role }
    }

    pub fn id(&self) -> Option<UserId> {
        match self {
            Actor::Anonymous => None,
            Actor::User { id, .. } => Some(*id),
        }
    }

    /// Label used for log fields and metric tags.
    pub fn label(&self) -> &'static str {
        match self {
            Actor::Anonymous => "anonymous",
            Actor::User { role, .. } => role.as_str(),
        }
    }
}
