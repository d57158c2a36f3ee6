use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Html,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::domain::user::{SignInRequest, SignUpRequest, User};
use crate::presentation::AppState;
use crate::presentation::app_error::AppResult;
use crate::presentation::extract::JsonOrForm;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct SignUpDto {
    #[validate(email)]
    pub(crate) email: String,
    #[validate(length(min = 2, max = 32))]
    pub(crate) nickname: String,
    #[validate(length(min = 8, max = 128))]
    pub(crate) password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct SignInDto {
    #[validate(length(min = 1, max = 254))]
    pub(crate) email: String,
    #[validate(length(min = 1))]
    pub(crate) password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct PasswordResetRequestDto {
    #[validate(length(min = 1, max = 254))]
    pub(crate) email: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub(crate) struct ResetLinkQuery {
    /// Token from the reset mail.
    pub(crate) token: String,
}

/// Sent as JSON by API clients, or as a form by the reset page.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct PasswordResetConfirmDto {
    #[validate(length(min = 1))]
    pub(crate) token: String,
    #[validate(length(min = 8, max = 128))]
    pub(crate) new_password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct AuthResponseDto {
    pub(crate) access_token: String,
    pub(crate) user: UserDto,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct MessageDto {
    pub(crate) message: &'static str,
}

/// Public view of an account. The password hash never leaves the data layer.
#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct UserDto {
    pub(crate) id: String,
    pub(crate) email: String,
    pub(crate) nickname: String,
    pub(crate) is_active: bool,
    pub(crate) is_staff: bool,
    pub(crate) is_admin: bool,
    pub(crate) created_at: DateTime<Utc>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_hex(),
            email: user.email,
            nickname: user.nickname,
            is_active: user.is_active,
            is_staff: user.is_staff,
            is_admin: user.is_admin,
            created_at: user.created_at,
        }
    }
}

#[utoipa::path(
    post,
    path = "/sign-up",
    tag = "auth",
    request_body = SignUpDto,
    responses(
        (status = 201, description = "Account created, activation mail queued", body = UserDto),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Email or nickname already taken"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn sign_up(
    State(state): State<AppState>,
    Json(dto): Json<SignUpDto>,
) -> AppResult<(StatusCode, Json<UserDto>)> {
    dto.validate()?;

    let req = SignUpRequest {
        email: dto.email,
        nickname: dto.nickname,
        password: dto.password,
    };
    let user = state.auth_service.sign_up(req).await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

#[utoipa::path(
    post,
    path = "/sign-in",
    tag = "auth",
    request_body = SignInDto,
    responses(
        (status = 200, description = "Signed in", body = AuthResponseDto),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid credentials or inactive account"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn sign_in(
    State(state): State<AppState>,
    Json(dto): Json<SignInDto>,
) -> AppResult<(StatusCode, Json<AuthResponseDto>)> {
    dto.validate()?;

    let req = SignInRequest {
        email: dto.email,
        password: dto.password,
    };
    let result = state.auth_service.sign_in(req).await?;

    Ok((
        StatusCode::OK,
        Json(AuthResponseDto {
            access_token: result.access_token,
            user: result.user.into(),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/activate/{token}",
    tag = "auth",
    params(
        ("token" = String, Path, description = "Activation token from the sign-up mail")
    ),
    responses(
        (status = 200, description = "Account active", body = UserDto),
        (status = 401, description = "Invalid or expired token"),
        (status = 404, description = "Account no longer exists"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn activate(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<(StatusCode, Json<UserDto>)> {
    let user = state.auth_service.activate(&token).await?;
    Ok((StatusCode::OK, Json(user.into())))
}

#[utoipa::path(
    post,
    path = "/password-reset",
    tag = "auth",
    request_body = PasswordResetRequestDto,
    responses(
        (status = 202, description = "Reset mail queued if the address is registered", body = MessageDto),
        (status = 400, description = "Validation error"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn request_password_reset(
    State(state): State<AppState>,
    Json(dto): Json<PasswordResetRequestDto>,
) -> AppResult<(StatusCode, Json<MessageDto>)> {
    dto.validate()?;
    state.auth_service.request_password_reset(&dto.email).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(MessageDto {
            message: "if the address is registered, a reset link is on its way",
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/password-reset",
    tag = "auth",
    params(ResetLinkQuery),
    responses(
        (status = 200, description = "Form that posts the new password to /password-reset/confirm", body = String, content_type = "text/html"),
        (status = 400, description = "Missing token")
    )
)]
pub(crate) async fn password_reset_page(Query(query): Query<ResetLinkQuery>) -> Html<String> {
    Html(reset_form(&query.token))
}

fn reset_form(token: &str) -> String {
    let token = html_escape::encode_safe(token);
    format!(
        r#"<!doctype html>
<html>
<head><meta charset="utf-8"><title>Reset password</title></head>
<body>
<form method="post" action="/password-reset/confirm">
<input type="hidden" name="token" value="{token}">
<label>New password <input type="password" name="new_password" minlength="8" maxlength="128" required></label>
<button type="submit">Reset password</button>
</form>
</body>
</html>
"#
    )
}

#[utoipa::path(
    post,
    path = "/password-reset/confirm",
    tag = "auth",
    request_body = PasswordResetConfirmDto,
    responses(
        (status = 204, description = "Password replaced"),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid, expired or already used token"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn confirm_password_reset(
    State(state): State<AppState>,
    JsonOrForm(dto): JsonOrForm<PasswordResetConfirmDto>,
) -> AppResult<StatusCode> {
    dto.validate()?;
    state
        .auth_service
        .reset_password(&dto.token, &dto.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
