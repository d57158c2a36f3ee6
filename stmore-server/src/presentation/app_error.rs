use axum::{
    Json,
    extract::{
        multipart::MultipartError,
        rejection::{FormRejection, JsonRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

use crate::domain::error::DomainError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("multipart error: {0}")]
    Multipart(#[from] MultipartError),

    #[error("json body rejected: {0}")]
    Json(#[from] JsonRejection),

    #[error("form body rejected: {0}")]
    Form(#[from] FormRejection),

    #[error("unauthorized")]
    Unauthorized,

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

pub(crate) type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl AppError {
    fn status_and_message(self) -> (StatusCode, String) {
        match self {
            AppError::Domain(err) => {
                let status = match &err {
                    DomainError::Validation { .. } => StatusCode::BAD_REQUEST,
                    DomainError::NotFound(_) => StatusCode::NOT_FOUND,
                    DomainError::AlreadyExists(_) => StatusCode::CONFLICT,
                    DomainError::Unauthorized(_)
                    | DomainError::InvalidCredentials
                    | DomainError::InactiveAccount => StatusCode::UNAUTHORIZED,
                    DomainError::Unexpected(detail) => {
                        error!(%detail, "unexpected domain error");
                        return (
                            StatusCode::INTERNAL_SERVER_ERROR,
                            "internal error".to_string(),
                        );
                    }
                };
                (status, err.to_string())
            }
            AppError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Multipart(err) => (err.status(), err.body_text()),
            AppError::Json(err) => (err.status(), err.body_text()),
            AppError::Form(err) => (err.status(), err.body_text()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_string()),
            AppError::Internal(err) => {
                error!(error = %err, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, msg) = self.status_and_message();
        (status, Json(ErrorBody { error: msg })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::AppError;
    use crate::domain::error::DomainError;

    fn status_of(err: impl Into<AppError>) -> StatusCode {
        err.into().status_and_message().0
    }

    #[test]
    fn domain_errors_map_to_statuses() {
        assert_eq!(
            status_of(DomainError::Validation {
                field: "id",
                message: "bad"
            }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(DomainError::NotFound("story".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(DomainError::AlreadyExists("email".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(DomainError::Unauthorized("admin privilege required")),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(status_of(DomainError::InvalidCredentials), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(DomainError::InactiveAccount), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn unexpected_detail_is_not_exposed() {
        let (status, msg) =
            AppError::from(DomainError::Unexpected("connection refused on 10.0.0.5".into()))
                .status_and_message();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(msg, "internal error");
    }
}
