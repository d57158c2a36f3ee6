use tracing::info;

use super::access_guard::AccessGuard;
use super::password::{hash_password, verify_password};
use crate::data::user_repository::{UserCredentials, UserRepository};
use crate::domain::error::DomainError;
use crate::domain::identity::Identity;
use crate::domain::user::{
    ChangePasswordRequest, RoleFlags, User, normalize_email, normalize_nickname,
};

pub(crate) struct UserService<R: UserRepository + Clone> {
    repo: R,
    guard: AccessGuard<R>,
}

impl<R: UserRepository + Clone> UserService<R> {
    pub(crate) fn new(repo: R) -> Self {
        Self {
            guard: AccessGuard::new(repo.clone()),
            repo,
        }
    }

    pub(crate) async fn me(&self, actor: &Identity) -> Result<User, DomainError> {
        self.guard.require_user(actor).await
    }

    pub(crate) async fn change_password(
        &self,
        actor: &Identity,
        req: ChangePasswordRequest,
    ) -> Result<(), DomainError> {
        let req = req.validate()?;
        let creds = self.credentials(actor).await?;
        verify_password(&req.current_password, &creds.password_hash)?;

        let password_hash = hash_password(&req.new_password)?;
        if !self.repo.update_password(creds.user.id, &password_hash).await? {
            return Err(DomainError::not_found("user"));
        }
        info!(user_id = %creds.user.id, "password changed");
        Ok(())
    }

    pub(crate) async fn change_nickname(
        &self,
        actor: &Identity,
        nickname: &str,
    ) -> Result<User, DomainError> {
        let nickname = normalize_nickname(nickname)?;
        let user = self.guard.require_user(actor).await?;
        self.repo
            .update_nickname(user.id, &nickname)
            .await?
            .ok_or_else(|| DomainError::not_found("user"))
    }

    /// Requires the current password. A mismatch leaves the account intact.
    pub(crate) async fn delete_account(
        &self,
        actor: &Identity,
        password: &str,
    ) -> Result<(), DomainError> {
        if password.is_empty() {
            return Err(DomainError::Validation {
                field: "password",
                message: "must not be empty",
            });
        }
        let creds = self.credentials(actor).await?;
        verify_password(password, &creds.password_hash)?;

        if !self.repo.delete_user(creds.user.id).await? {
            return Err(DomainError::not_found("user"));
        }
        info!(user_id = %creds.user.id, "account deleted");
        Ok(())
    }

    pub(crate) async fn list_users(&self, actor: &Identity) -> Result<Vec<User>, DomainError> {
        self.guard.require_admin(actor).await?;
        self.repo.list_users().await
    }

    pub(crate) async fn update_roles(
        &self,
        actor: &Identity,
        email: &str,
        roles: RoleFlags,
    ) -> Result<User, DomainError> {
        let admin = self.guard.require_admin(actor).await?;
        let email = normalize_email(email)?;

        let user = self
            .repo
            .update_roles(&email, roles)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("user {email}")))?;
        let granted = user.roles();
        info!(
            admin_id = %admin.id,
            user_id = %user.id,
            is_admin = granted.is_admin,
            is_staff = granted.is_staff,
            "roles updated"
        );
        Ok(user)
    }

    /// Staff accounts, shown publicly as the site's authors.
    pub(crate) async fn list_authors(&self) -> Result<Vec<User>, DomainError> {
        self.repo.list_staff().await
    }

    async fn credentials(&self, actor: &Identity) -> Result<UserCredentials, DomainError> {
        self.repo
            .find_credentials_by_id(actor.user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("user"))
    }
}
