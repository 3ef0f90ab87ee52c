//! The calling subject.
//!
//! Identity is always threaded explicitly through every call — never held in
//! ambient/global state — so the policy engine and the consent state machine
//! stay pure and independently testable.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use clinsign_core::Role;

/// The authenticated caller: user id plus assigned roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    /// User's unique identifier.
    pub user_id: Uuid,

    /// User's assigned roles.
    pub roles: Vec<Role>,
}

impl Subject {
    pub fn new(user_id: Uuid, roles: Vec<Role>) -> Self {
        Self { user_id, roles }
    }

    /// Returns `true` if the subject has a specific role.
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Returns `true` if the subject has any of the specified roles.
    #[must_use]
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.iter().any(|role| self.has_role(*role))
    }

    /// Returns `true` if the subject carries an elevated role.
    #[must_use]
    pub fn is_elevated(&self) -> bool {
        self.roles.iter().any(Role::is_elevated)
    }
}
