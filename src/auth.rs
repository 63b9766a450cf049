//! Signed-in identity passed explicitly to every service call

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::Role;

/// Who is acting. Issued by sign-in; services never look it up themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub role: Role,
}

impl Session {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self { user_id: user_id.into(), role }
    }

    /// Fail unless the session has exactly `role`
    pub fn require(&self, role: Role, action: &str) -> Result<()> {
        self.require_any(&[role], action)
    }

    /// Fail unless the session has one of `roles`
    pub fn require_any(&self, roles: &[Role], action: &str) -> Result<()> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            tracing::warn!(user = %self.user_id, role = %self.role, "Refused: {}", action);
            Err(Error::Forbidden(format!("a {} cannot {}", self.role, action)))
        }
    }
}
