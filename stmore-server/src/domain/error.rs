use thiserror::Error;

/// Failures every layer below the HTTP surface reports. The presentation
/// layer decides the status code; `Unexpected` details never leave the server.
#[derive(Debug, Error)]
pub(crate) enum DomainError {
    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: &'static str,
    },

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account is not activated")]
    InactiveAccount,

    #[error("unexpected: {0}")]
    Unexpected(String),
}

impl DomainError {
    pub(crate) fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }
}
