use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use tuapp_auth_types::token::Subject;
use tuapp_domain::pagination::PageRequest;

use crate::domain::repository::{AdminUserRepository, Clock};
use crate::domain::types::{AdminChanges, AdminUser};
use crate::error::TransitError;
use crate::infra::password::{hash_password, verify_password};
use crate::usecase::session::{SessionGrant, SessionGrantor};

pub struct RegisterAdminInput {
    pub username: String,
    pub email: String,
    pub password: String,
}

pub struct RegisterAdminUseCase<A: AdminUserRepository> {
    pub admins: A,
}

impl<A: AdminUserRepository> RegisterAdminUseCase<A> {
    pub async fn execute(&self, input: RegisterAdminInput) -> Result<AdminUser, TransitError> {
        // The email is the session subject, so it has to decode as one later.
        if !input.email.contains('@') {
            return Err(TransitError::InvalidEmail);
        }
        let user = AdminUser {
            id: Uuid::now_v7(),
            username: input.username,
            email: input.email,
            password_hash: hash_password(input.password).await?,
            disabled: false,
            created_at: Utc::now(),
        };
        self.admins.create(&user).await?;
        Ok(user)
    }
}

pub struct LoginAdminInput {
    pub username: String,
    pub password: String,
}

pub struct LoginAdminUseCase<A, C>
where
    A: AdminUserRepository,
    C: Clock,
{
    pub admins: A,
    pub clock: C,
    pub sessions: SessionGrantor,
}

impl<A, C> LoginAdminUseCase<A, C>
where
    A: AdminUserRepository,
    C: Clock,
{
    /// Unknown user, disabled account and wrong password are indistinguishable.
    pub async fn execute(&self, input: LoginAdminInput) -> Result<SessionGrant, TransitError> {
        let user = self
            .admins
            .find_by_username(&input.username)
            .await?
            .filter(|u| !u.disabled)
            .ok_or(TransitError::InvalidCredentials)?;

        if !verify_password(input.password, user.password_hash).await? {
            return Err(TransitError::InvalidCredentials);
        }

        self.sessions
            .grant(&Subject::Admin(user.email), self.clock.now())
    }
}

// ── User management ──────────────────────────────────────────────────────────

pub struct ListAdminsUseCase<A: AdminUserRepository> {
    pub admins: A,
}

impl<A: AdminUserRepository> ListAdminsUseCase<A> {
    pub async fn execute(&self, page: PageRequest) -> Result<Vec<AdminUser>, TransitError> {
        self.admins.list(page.clamped()).await
    }
}

pub struct GetAdminUseCase<A: AdminUserRepository> {
    pub admins: A,
}

impl<A: AdminUserRepository> GetAdminUseCase<A> {
    pub async fn execute(&self, id: Uuid) -> Result<AdminUser, TransitError> {
        self.admins
            .find_by_id(id)
            .await?
            .ok_or(TransitError::AdminNotFound)
    }
}

/// Resolves the account behind an admin session.
pub struct GetCurrentAdminUseCase<A: AdminUserRepository> {
    pub admins: A,
}

impl<A: AdminUserRepository> GetCurrentAdminUseCase<A> {
    pub async fn execute(&self, email: &str) -> Result<AdminUser, TransitError> {
        self.admins
            .find_by_email(email)
            .await?
            .ok_or(TransitError::AdminNotFound)
    }
}

#[derive(Default)]
pub struct UpdateAdminInput {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub disabled: Option<bool>,
}

pub struct UpdateAdminUseCase<A: AdminUserRepository> {
    pub admins: A,
}

impl<A: AdminUserRepository> UpdateAdminUseCase<A> {
    pub async fn execute(&self, id: Uuid, input: UpdateAdminInput) -> Result<AdminUser, TransitError> {
        if input.email.as_deref().is_some_and(|e| !e.contains('@')) {
            return Err(TransitError::InvalidEmail);
        }
        let password_hash = match input.password {
            Some(password) => Some(hash_password(password).await?),
            None => None,
        };
        let changes = AdminChanges {
            username: input.username,
            email: input.email,
            password_hash,
            disabled: input.disabled,
        };
        if changes.is_empty() {
            return Err(TransitError::NoChanges);
        }
        let user = self.admins.update(id, &changes).await?;
        info!(admin_id = %user.id, disabled = user.disabled, "admin user updated");
        Ok(user)
    }
}

pub struct DeleteAdminUseCase<A: AdminUserRepository> {
    pub admins: A,
}

impl<A: AdminUserRepository> DeleteAdminUseCase<A> {
    /// `actor_email` is the session subject of the caller, who may not delete itself.
    pub async fn execute(&self, actor_email: &str, id: Uuid) -> Result<(), TransitError> {
        let user = self
            .admins
            .find_by_id(id)
            .await?
            .ok_or(TransitError::AdminNotFound)?;
        if user.email == actor_email {
            return Err(TransitError::CannotDeleteSelf);
        }
        if !self.admins.delete(id).await? {
            return Err(TransitError::AdminNotFound);
        }
        info!(admin_id = %id, "admin user deleted");
        Ok(())
    }
}
