//! Caller identity resolution

use std::sync::Arc;

use crate::error::{AdminError, AdminResult};
use crate::models::{normalize_email, Role, UserContext};
use crate::store::UserStore;

/// Resolves who is calling from their email
#[derive(Clone)]
pub struct IdentityService {
    users: Arc<dyn UserStore>,
}

impl IdentityService {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Effective role and scope of `email`. Unregistered users get `NoAccess`.
    /// `role_override` lets a general administrator preview another role and
    /// is ignored for everyone else.
    pub async fn resolve(&self, email: &str, role_override: Option<Role>) -> AdminResult<UserContext> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(AdminError::Unauthorized);
        }

        let mut context = match self.users.get_by_email(&email).await? {
            Some(user) => UserContext::from_record(&user),
            None => {
                tracing::debug!(email = %email, "Caller not registered");
                UserContext::unregistered(&email)
            }
        };

        if let Some(role) = role_override {
            if context.role == Role::GeneralAdmin {
                tracing::debug!(email = %email, role = %role, "Role override applied");
                context.role = role;
            } else if role != context.role {
                tracing::warn!(email = %email, requested = %role, "Role override ignored");
            }
        }

        Ok(context)
    }
}
