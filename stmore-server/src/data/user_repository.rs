use async_trait::async_trait;

use crate::domain::error::DomainError;
use crate::domain::id::ObjectId;
use crate::domain::user::{RoleFlags, User};

#[derive(Debug, Clone)]
pub(crate) struct UserCredentials {
    pub(crate) user: User,
    pub(crate) password_hash: String,
}

#[derive(Debug, Clone)]
pub(crate) struct NewUser {
    pub(crate) id: ObjectId,
    pub(crate) email: String,
    pub(crate) nickname: String,
    pub(crate) password_hash: String,
}

#[async_trait]
pub(crate) trait UserRepository: Send + Sync {
    async fn create_user(&self, input: NewUser) -> Result<User, DomainError>;
    async fn find_by_id(&self, id: ObjectId) -> Result<Option<User>, DomainError>;
    async fn find_credentials_by_id(
        &self,
        id: ObjectId,
    ) -> Result<Option<UserCredentials>, DomainError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<UserCredentials>, DomainError>;
    async fn activate(&self, id: ObjectId) -> Result<bool, DomainError>;
    async fn update_password(&self, id: ObjectId, password_hash: &str)
    -> Result<bool, DomainError>;
    async fn update_nickname(
        &self,
        id: ObjectId,
        nickname: &str,
    ) -> Result<Option<User>, DomainError>;
    async fn update_roles(
        &self,
        email: &str,
        roles: RoleFlags,
    ) -> Result<Option<User>, DomainError>;
    async fn delete_user(&self, id: ObjectId) -> Result<bool, DomainError>;
    /// Admins first, then staff, then oldest accounts.
    async fn list_users(&self) -> Result<Vec<User>, DomainError>;
    async fn list_staff(&self) -> Result<Vec<User>, DomainError>;
}
