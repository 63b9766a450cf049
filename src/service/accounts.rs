//! User profiles: sign-up, sign-in and admin user management
//!
//! Credentials are checked by the external authentication service; this
//! module only owns the profile documents and the role claim.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;

use crate::auth::Session;
use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::model::{Role, User, new_id};
use crate::store::{Direction, DocumentStore, Query, docpath};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// Profile operations
pub struct Accounts<'a, S> {
    store: &'a S,
    clock: &'a dyn Clock,
}

impl<'a, S: DocumentStore> Accounts<'a, S> {
    pub fn new(store: &'a S, clock: &'a dyn Clock) -> Self {
        Self { store, clock }
    }

    /// Create a student or professor profile
    pub async fn sign_up(&self, fullname: &str, email: &str, role: Role) -> Result<User> {
        let fullname = fullname.trim();
        let email = email.trim().to_lowercase();

        if fullname.is_empty() {
            return Err(Error::Validation("Full name is required".to_string()));
        }
        if !EMAIL_RE.is_match(&email) {
            return Err(Error::Validation("Invalid email format.".to_string()));
        }
        if role == Role::Admin {
            return Err(Error::Validation(
                "Admin accounts are promoted by an existing admin".to_string(),
            ));
        }
        if self.find_by_email(&email).await?.is_some() {
            return Err(Error::Conflict("Email already in use. Try logging in.".to_string()));
        }

        let user = User {
            id: new_id(),
            fullname: fullname.to_string(),
            email,
            role,
            created_at: self.clock.now(),
        };
        self.store.set_as(&docpath::user(&user.id), &user).await?;

        tracing::info!(user = %user.id, role = %user.role, "Signed up");
        Ok(user)
    }

    /// Resolve a profile by email into a session
    pub async fn sign_in(&self, email: &str) -> Result<Session> {
        let email = email.trim().to_lowercase();
        let user =
            self.find_by_email(&email).await?.ok_or_else(|| Error::not_found("user", &email))?;

        tracing::info!(user = %user.id, "Signed in");
        Ok(Session::new(user.id, user.role))
    }

    /// The signed-in user's profile
    pub async fn profile(&self, session: &Session) -> Result<User> {
        self.get_user(&session.user_id).await
    }

    pub async fn get_user(&self, user_id: &str) -> Result<User> {
        self.store
            .get_as(&docpath::user(user_id))
            .await?
            .ok_or_else(|| Error::not_found("user", user_id))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let query = Query::new(docpath::users()).where_eq("email", email);
        Ok(self.store.query_as::<User>(&query).await?.into_iter().next())
    }

    /// Admin: all users, optionally of one role, oldest first
    pub async fn list_users(&self, session: &Session, role: Option<Role>) -> Result<Vec<User>> {
        session.require(Role::Admin, "list users")?;

        let mut query = Query::new(docpath::users()).order_by("createdAt", Direction::Ascending);
        if let Some(role) = role {
            query = query.where_eq("role", role.as_str());
        }
        self.store.query_as(&query).await
    }

    /// Admin: change a user's display name
    pub async fn rename_user(&self, session: &Session, user_id: &str, fullname: &str) -> Result<()> {
        session.require(Role::Admin, "rename users")?;

        let fullname = fullname.trim();
        if fullname.is_empty() {
            return Err(Error::Validation("Full name is required".to_string()));
        }
        self.get_user(user_id).await?;
        self.store.merge(&docpath::user(user_id), json!({ "fullname": fullname })).await?;

        tracing::info!(user = %user_id, "Renamed user");
        Ok(())
    }

    /// Admin: delete a profile. Progress and class memberships are left as is.
    pub async fn delete_user(&self, session: &Session, user_id: &str) -> Result<()> {
        session.require(Role::Admin, "delete users")?;

        if session.user_id == user_id {
            return Err(Error::Validation("You cannot delete your own account".to_string()));
        }
        if !self.store.delete(&docpath::user(user_id)).await? {
            return Err(Error::not_found("user", user_id));
        }

        tracing::info!(user = %user_id, "Deleted user");
        Ok(())
    }

    /// Admin: grant the admin role
    pub async fn promote_to_admin(&self, session: &Session, user_id: &str) -> Result<()> {
        session.require(Role::Admin, "promote users")?;

        self.get_user(user_id).await?;
        self.store.merge(&docpath::user(user_id), json!({ "role": Role::Admin })).await?;

        tracing::info!(user = %user_id, "Promoted to admin");
        Ok(())
    }
}
