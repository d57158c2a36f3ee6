use crate::data::user_repository::UserRepository;
use crate::domain::error::DomainError;
use crate::domain::identity::Identity;
use crate::domain::user::User;

/// Existence first, privilege second. Privilege is read from the stored
/// record, never from the token claims.
#[derive(Clone)]
pub(crate) struct AccessGuard<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> AccessGuard<R> {
    pub(crate) fn new(repo: R) -> Self {
        Self { repo }
    }

    pub(crate) async fn require_user(&self, identity: &Identity) -> Result<User, DomainError> {
        self.repo
            .find_by_id(identity.user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("user"))
    }

    pub(crate) async fn require_admin(&self, identity: &Identity) -> Result<User, DomainError> {
        let user = self.require_user(identity).await?;
        ensure_admin(&user)?;
        Ok(user)
    }
}

pub(crate) fn ensure_admin(user: &User) -> Result<(), DomainError> {
    if user.is_admin {
        Ok(())
    } else {
        Err(DomainError::Unauthorized("admin privilege required"))
    }
}
