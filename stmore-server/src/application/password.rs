use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        Error as PasswordHashError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
        rand_core::OsRng,
    },
};
use sha2::{Digest, Sha256};

use crate::domain::error::DomainError;

/// Verified against when the account does not exist, so unknown emails cost
/// the same as wrong passwords.
pub(crate) const DUMMY_PASSWORD_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$MDEyMzQ1Njc4OWFiY2RlZg$gwN6hT1sNdk9kI95f7n2Gl3fL0qRmBf2Ffkj2r90/0M";

pub(crate) fn hash_password(raw_password: &str) -> Result<String, DomainError> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = argon2()?
        .hash_password(raw_password.as_bytes(), &salt)
        .map_err(|err| DomainError::Unexpected(err.to_string()))?;
    Ok(password_hash.to_string())
}

pub(crate) fn verify_password(raw_password: &str, password_hash: &str) -> Result<(), DomainError> {
    let parsed_hash =
        PasswordHash::new(password_hash).map_err(|err| DomainError::Unexpected(err.to_string()))?;
    argon2()?
        .verify_password(raw_password.as_bytes(), &parsed_hash)
        .map_err(|err| match err {
            PasswordHashError::Password => DomainError::InvalidCredentials,
            _ => DomainError::Unexpected(err.to_string()),
        })
}

/// Burns one verification against the dummy hash. Only hashing failures escape.
pub(crate) fn verify_dummy(raw_password: &str) -> Result<(), DomainError> {
    match verify_password(raw_password, DUMMY_PASSWORD_HASH) {
        Ok(()) | Err(DomainError::InvalidCredentials) => Ok(()),
        Err(err) => Err(err),
    }
}

/// Short fingerprint of a password hash. Reset tokens carry it, so they stop
/// verifying once the password changes.
pub(crate) fn password_stamp(password_hash: &str) -> String {
    let digest = hex::encode(Sha256::digest(password_hash.as_bytes()));
    digest[..16].to_string()
}

fn argon2() -> Result<Argon2<'static>, DomainError> {
    let params =
        Params::new(19 * 1024, 2, 1, None).map_err(|err| DomainError::Unexpected(err.to_string()))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

#[cfg(test)]
mod tests {
    use super::{hash_password, password_stamp, verify_dummy, verify_password};
    use crate::domain::error::DomainError;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("correct-password").expect("hash must be created");
        assert!(hash.starts_with("$argon2id$"));

        verify_password("correct-password", &hash).expect("password must match");
        let err = verify_password("wrong-password", &hash).expect_err("must not match");
        assert!(matches!(err, DomainError::InvalidCredentials));
    }

    #[test]
    fn hashes_are_salted() {
        let first = hash_password("same-password").expect("hash");
        let second = hash_password("same-password").expect("hash");
        assert_ne!(first, second);
    }

    #[test]
    fn dummy_verification_never_fails_on_mismatch() {
        verify_dummy("anything at all").expect("dummy hash must parse");
    }

    #[test]
    fn stamp_follows_the_hash() {
        let first = password_stamp("$argon2id$first");
        assert_eq!(first.len(), 16);
        assert_eq!(first, password_stamp("$argon2id$first"));
        assert_ne!(first, password_stamp("$argon2id$second"));
    }
}
