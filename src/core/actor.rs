//! Caller identity attached to every mutation for audit and privilege checks.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};

/// Privilege level of a caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Day-to-day operations
    Staff,
    /// May restore and permanently delete recycle bin entries
    Admin,
}

/// An authenticated caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Stable user identifier recorded on every row the caller writes
    pub user_id: String,
    /// Privilege level
    pub role: Role,
}

impl Actor {
    /// Creates an actor.
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    /// Fails with [`Error::Unauthorized`] unless the actor is an admin.
    pub fn require_admin(&self, action: &str) -> Result<()> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            tracing::warn!(user_id = %self.user_id, action, "Refused privileged action");
            Err(Error::Unauthorized {
                user_id: self.user_id.clone(),
                action: action.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn test_require_admin() {
        let admin = Actor::new("owner", Role::Admin);
        let staff = Actor::new("clerk", Role::Staff);

        assert!(admin.require_admin("restore invoices").is_ok());
        let err = staff.require_admin("restore invoices").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
        assert_eq!(
            err.to_string(),
            "User clerk is not allowed to restore invoices"
        );
    }
}
