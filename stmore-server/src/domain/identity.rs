use super::id::ObjectId;
use super::user::User;

/// Caller identity as carried by a verified session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Identity {
    pub(crate) user_id: ObjectId,
    pub(crate) email: String,
    pub(crate) nickname: String,
    pub(crate) is_active: bool,
    pub(crate) is_staff: bool,
    pub(crate) is_admin: bool,
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Identity {
            user_id: user.id,
            email: user.email.clone(),
            nickname: user.nickname.clone(),
            is_active: user.is_active,
            is_staff: user.is_staff,
            is_admin: user.is_admin,
        }
    }
}
