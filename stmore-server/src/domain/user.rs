use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

use super::error::DomainError;
use super::id::ObjectId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct SignUpRequest {
    pub(crate) email: String,
    pub(crate) nickname: String,
    pub(crate) password: String,
}

impl SignUpRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        let email = normalize_email(&self.email)?;
        let nickname = normalize_nickname(&self.nickname)?;
        validate_new_password(&self.password)?;
        Ok(Self {
            email,
            nickname,
            password: self.password,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct SignInRequest {
    pub(crate) email: String,
    pub(crate) password: String,
}

impl SignInRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        let email = self.email.trim().to_lowercase();
        if email.is_empty() {
            return Err(DomainError::Validation {
                field: "email",
                message: "must not be empty",
            });
        }

        if self.password.is_empty() {
            return Err(DomainError::Validation {
                field: "password",
                message: "must not be empty",
            });
        }
        Ok(Self {
            email,
            password: self.password,
        })
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ChangePasswordRequest {
    pub(crate) current_password: String,
    pub(crate) new_password: String,
}

impl ChangePasswordRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        if self.current_password.is_empty() {
            return Err(DomainError::Validation {
                field: "current_password",
                message: "must not be empty",
            });
        }
        validate_new_password(&self.new_password)?;
        Ok(self)
    }
}

/// Role flags an admin can grant or revoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct RoleFlags {
    pub(crate) is_admin: bool,
    pub(crate) is_staff: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct User {
    pub(crate) id: ObjectId,
    pub(crate) email: String,
    pub(crate) nickname: String,
    pub(crate) is_active: bool,
    pub(crate) is_staff: bool,
    pub(crate) is_admin: bool,
    pub(crate) created_at: DateTime<Utc>,
}

impl User {
    pub(crate) fn new(
        id: ObjectId,
        email: impl Into<String>,
        nickname: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let email = normalize_email(&email.into())?;
        let nickname = normalize_nickname(&nickname.into())?;

        Ok(Self {
            id,
            email,
            nickname,
            is_active: false,
            is_staff: false,
            is_admin: false,
            created_at,
        })
    }

    pub(crate) fn with_flags(mut self, is_active: bool, roles: RoleFlags) -> Self {
        self.is_active = is_active;
        self.is_staff = roles.is_staff;
        self.is_admin = roles.is_admin;
        self
    }

    pub(crate) fn roles(&self) -> RoleFlags {
        RoleFlags {
            is_admin: self.is_admin,
            is_staff: self.is_staff,
        }
    }
}

pub(crate) fn normalize_nickname(nickname: &str) -> Result<String, DomainError> {
    let nickname = nickname.trim();
    let len = nickname.chars().count();
    if !(2..=32).contains(&len) {
        return Err(DomainError::Validation {
            field: "nickname",
            message: "must be 2..32 chars",
        });
    }
    Ok(nickname.to_string())
}

pub(crate) fn normalize_email(email: &str) -> Result<String, DomainError> {
    let email = email.trim().to_lowercase();
    if !email.validate_email() {
        return Err(DomainError::Validation {
            field: "email",
            message: "must be a valid email",
        });
    }
    Ok(email)
}

pub(crate) fn validate_new_password(password: &str) -> Result<(), DomainError> {
    let password_len = password.chars().count();
    if !(8..=128).contains(&password_len) {
        return Err(DomainError::Validation {
            field: "password",
            message: "must be 8..128 chars",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{
        ChangePasswordRequest, RoleFlags, SignInRequest, SignUpRequest, User, normalize_email,
        normalize_nickname,
    };
    use crate::domain::error::DomainError;
    use crate::domain::id::ObjectId;
    use chrono::Utc;

    #[test]
    fn normalize_email_trims_and_lowercases() {
        let value = normalize_email("  TeSt@Example.COM ").expect("must be valid");
        assert_eq!(value, "test@example.com");
    }

    #[test]
    fn nickname_rules_are_applied() {
        assert!(normalize_nickname(" a ").is_err());
        assert!(normalize_nickname(&"x".repeat(33)).is_err());
        assert_eq!(normalize_nickname("  writer ").expect("must be valid"), "writer");
    }

    #[test]
    fn sign_up_rejects_empty_fields() {
        let cases = [
            ("", "writer", "very-secure-password", "email"),
            ("writer@example.com", "", "very-secure-password", "nickname"),
            ("writer@example.com", "writer", "", "password"),
        ];

        for (email, nickname, password, expected_field) in cases {
            let req = SignUpRequest {
                email: email.to_string(),
                nickname: nickname.to_string(),
                password: password.to_string(),
            };
            match req.validate() {
                Err(DomainError::Validation { field, .. }) => assert_eq!(field, expected_field),
                other => panic!("expected validation error, got {other:?}"),
            }
        }
    }

    #[test]
    fn sign_up_normalizes_fields() {
        let req = SignUpRequest {
            email: " Writer@Example.com ".to_string(),
            nickname: " writer ".to_string(),
            password: "very-secure-password".to_string(),
        };
        let validated = req.validate().expect("must be valid");
        assert_eq!(validated.email, "writer@example.com");
        assert_eq!(validated.nickname, "writer");
    }

    #[test]
    fn sign_in_requires_password() {
        let req = SignInRequest {
            email: "writer@example.com".to_string(),
            password: String::new(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn change_password_checks_new_password_length() {
        let req = ChangePasswordRequest {
            current_password: "old-password".to_string(),
            new_password: "short".to_string(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn new_user_starts_inactive_without_roles() {
        let user = User::new(ObjectId::generate(), "a@example.com", "writer", Utc::now())
            .expect("must be valid");
        assert!(!user.is_active);
        assert_eq!(
            user.roles(),
            RoleFlags {
                is_admin: false,
                is_staff: false
            }
        );

        let promoted = user.with_flags(
            true,
            RoleFlags {
                is_admin: true,
                is_staff: true,
            },
        );
        assert!(promoted.is_active && promoted.is_admin && promoted.is_staff);
    }
}
