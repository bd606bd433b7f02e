//! Authenticated caller identity.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::UserId;

/// Platform role carried in the access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Gives money.
    Donor,
    /// Raises money through campaigns.
    Recipient,
    /// Reviews submitted campaigns.
    Moderator,
    /// Full administrative rights.
    Admin,
}

/// The user on whose behalf an operation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    /// Account identifier.
    pub user_id: UserId,
    /// Account role.
    pub role: Role,
}

impl Actor {
    /// Creates an actor.
    #[must_use]
    pub const fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Returns `true` if the actor may take moderation decisions.
    #[must_use]
    pub const fn is_reviewer(&self) -> bool {
        matches!(self.role, Role::Moderator | Role::Admin)
    }

    /// Returns `true` for administrators.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reviewer_roles() {
        assert!(Actor::new(UserId::new(), Role::Moderator).is_reviewer());
        assert!(Actor::new(UserId::new(), Role::Admin).is_reviewer());
        assert!(!Actor::new(UserId::new(), Role::Recipient).is_reviewer());
        assert!(!Actor::new(UserId::new(), Role::Moderator).is_admin());
    }
}
