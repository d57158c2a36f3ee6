use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::id::ObjectId;
use crate::domain::identity::Identity;
use crate::domain::user::User;

#[derive(Debug, Error)]
pub(crate) enum JwtError {
    #[error("token encode failed")]
    Encode(#[source] jsonwebtoken::errors::Error),

    #[error("token decode/validation failed")]
    Decode(#[source] jsonwebtoken::errors::Error),

    #[error("token issued for a different purpose")]
    Purpose,
}

/// Session token payload. Every field is required, so a token missing any
/// claim or carrying a malformed id is rejected at decode time.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Claims {
    pub(crate) id: ObjectId,
    pub(crate) email: String,
    pub(crate) nickname: String,
    pub(crate) is_active: bool,
    pub(crate) is_staff: bool,
    pub(crate) is_admin: bool,
    pub(crate) exp: i64,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Identity {
            user_id: claims.id,
            email: claims.email,
            nickname: claims.nickname,
            is_active: claims.is_active,
            is_staff: claims.is_staff,
            is_admin: claims.is_admin,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub(crate) enum TokenPurpose {
    Activation,
    PasswordReset,
}

/// Payload of the single-purpose tokens mailed out in activation and reset links.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub(crate) struct ActionClaims {
    pub(crate) sub: ObjectId,
    pub(crate) purpose: TokenPurpose,
    /// Binds a reset token to the password hash it was issued against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) stamp: Option<String>,
    pub(crate) exp: i64,
}

pub(crate) struct JwtService {
    secret: String,
    ttl_seconds: i64,
}

impl JwtService {
    const DEFAULT_TTL_SECONDS: i64 = 72 * 60 * 60;

    pub(crate) fn new(secret: &str, ttl_seconds: i64) -> Self {
        let ttl_seconds = if ttl_seconds > 0 {
            ttl_seconds
        } else {
            Self::DEFAULT_TTL_SECONDS
        };

        JwtService {
            secret: secret.into(),
            ttl_seconds,
        }
    }

    pub(crate) fn generate_token(&self, user: &User) -> Result<String, JwtError> {
        let claims = Claims {
            id: user.id,
            email: user.email.clone(),
            nickname: user.nickname.clone(),
            is_active: user.is_active,
            is_staff: user.is_staff,
            is_admin: user.is_admin,
            exp: expires_in(self.ttl_seconds),
        };
        self.sign(&claims)
    }

    pub(crate) fn verify_token(&self, token: &str) -> Result<Claims, JwtError> {
        self.decode_claims(token)
    }

    pub(crate) fn generate_action_token(
        &self,
        sub: ObjectId,
        purpose: TokenPurpose,
        stamp: Option<String>,
        ttl_seconds: i64,
    ) -> Result<String, JwtError> {
        let claims = ActionClaims {
            sub,
            purpose,
            stamp,
            exp: expires_in(ttl_seconds),
        };
        self.sign(&claims)
    }

    pub(crate) fn verify_action_token(
        &self,
        token: &str,
        expected: TokenPurpose,
    ) -> Result<ActionClaims, JwtError> {
        let claims: ActionClaims = self.decode_claims(token)?;
        if claims.purpose != expected {
            return Err(JwtError::Purpose);
        }
        Ok(claims)
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, JwtError> {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(JwtError::Encode)
    }

    fn decode_claims<T: serde::de::DeserializeOwned>(&self, token: &str) -> Result<T, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 10;

        let token_data = decode::<T>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(JwtError::Decode)?;

        Ok(token_data.claims)
    }
}

fn expires_in(ttl_seconds: i64) -> i64 {
    (Utc::now() + Duration::seconds(ttl_seconds)).timestamp()
}
