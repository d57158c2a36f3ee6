use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use super::auth::UserDto;
use crate::domain::user::{ChangePasswordRequest, RoleFlags};
use crate::presentation::AppState;
use crate::presentation::app_error::AppResult;
use crate::presentation::middleware::auth::AuthenticatedUser;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct ChangePasswordDto {
    #[validate(length(min = 1))]
    pub(crate) current_password: String,
    #[validate(length(min = 8, max = 128))]
    pub(crate) new_password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct ChangeNicknameDto {
    #[validate(length(min = 2, max = 32))]
    pub(crate) nickname: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct DeleteAccountDto {
    #[validate(length(min = 1))]
    pub(crate) password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct RoleFlagsDto {
    pub(crate) is_admin: bool,
    pub(crate) is_staff: bool,
}

#[utoipa::path(
    get,
    path = "/users/me",
    tag = "users",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Caller's account", body = UserDto),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Account no longer exists"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn me(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
) -> AppResult<(StatusCode, Json<UserDto>)> {
    let user = state.user_service.me(&identity).await?;
    Ok((StatusCode::OK, Json(user.into())))
}

#[utoipa::path(
    patch,
    path = "/users/me/password",
    tag = "users",
    security(
        ("bearer_auth" = [])
    ),
    request_body = ChangePasswordDto,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized or wrong current password"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn change_password(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Json(dto): Json<ChangePasswordDto>,
) -> AppResult<StatusCode> {
    dto.validate()?;
    let req = ChangePasswordRequest {
        current_password: dto.current_password,
        new_password: dto.new_password,
    };
    state.user_service.change_password(&identity, req).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    patch,
    path = "/users/me/nickname",
    tag = "users",
    security(
        ("bearer_auth" = [])
    ),
    request_body = ChangeNicknameDto,
    responses(
        (status = 200, description = "Nickname changed", body = UserDto),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Nickname already taken"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn change_nickname(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Json(dto): Json<ChangeNicknameDto>,
) -> AppResult<(StatusCode, Json<UserDto>)> {
    dto.validate()?;
    let user = state
        .user_service
        .change_nickname(&identity, &dto.nickname)
        .await?;
    Ok((StatusCode::OK, Json(user.into())))
}

#[utoipa::path(
    delete,
    path = "/users/me",
    tag = "users",
    security(
        ("bearer_auth" = [])
    ),
    request_body = DeleteAccountDto,
    responses(
        (status = 204, description = "Account and its posts deleted"),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized or wrong password"),
        (status = 404, description = "Account no longer exists"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn delete_account(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Json(dto): Json<DeleteAccountDto>,
) -> AppResult<StatusCode> {
    dto.validate()?;
    state
        .user_service
        .delete_account(&identity, &dto.password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/authors",
    tag = "users",
    responses(
        (status = 200, description = "Staff accounts, admins first", body = [UserDto]),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn list_authors(
    State(state): State<AppState>,
) -> AppResult<(StatusCode, Json<Vec<UserDto>>)> {
    let users = state.user_service.list_authors().await?;
    Ok((
        StatusCode::OK,
        Json(users.into_iter().map(UserDto::from).collect()),
    ))
}

#[utoipa::path(
    get,
    path = "/users",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Every account: admins, then staff, then by age", body = [UserDto]),
        (status = 401, description = "Unauthorized or not an admin"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn list_users(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
) -> AppResult<(StatusCode, Json<Vec<UserDto>>)> {
    let users = state.user_service.list_users(&identity).await?;
    Ok((
        StatusCode::OK,
        Json(users.into_iter().map(UserDto::from).collect()),
    ))
}

#[utoipa::path(
    patch,
    path = "/users/{email}",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("email" = String, Path, description = "Email of the account to change")
    ),
    request_body = RoleFlagsDto,
    responses(
        (status = 200, description = "Role flags replaced", body = UserDto),
        (status = 400, description = "Malformed email"),
        (status = 401, description = "Unauthorized or not an admin"),
        (status = 404, description = "No account with that email"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn update_roles(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Path(email): Path<String>,
    Json(dto): Json<RoleFlagsDto>,
) -> AppResult<(StatusCode, Json<UserDto>)> {
    let roles = RoleFlags {
        is_admin: dto.is_admin,
        is_staff: dto.is_staff,
    };
    let user = state
        .user_service
        .update_roles(&identity, &email, roles)
        .await?;
    Ok((StatusCode::OK, Json(user.into())))
}
