use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::presentation::handlers::auth::{
    AuthResponseDto, MessageDto, PasswordResetConfirmDto, PasswordResetRequestDto, SignInDto,
    SignUpDto, UserDto,
};
use crate::presentation::handlers::posts::{
    CreatePostDto, ListPostsResponseDto, PostDto, PostSummaryDto, PublishDto, ThumbnailUpload,
    UpdatePostDto,
};
use crate::presentation::handlers::users::{
    ChangeNicknameDto, ChangePasswordDto, DeleteAccountDto, RoleFlagsDto,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::presentation::handlers::auth::sign_up,
        crate::presentation::handlers::auth::sign_in,
        crate::presentation::handlers::auth::activate,
        crate::presentation::handlers::auth::password_reset_page,
        crate::presentation::handlers::auth::request_password_reset,
        crate::presentation::handlers::auth::confirm_password_reset,
        crate::presentation::handlers::users::me,
        crate::presentation::handlers::users::change_password,
        crate::presentation::handlers::users::change_nickname,
        crate::presentation::handlers::users::delete_account,
        crate::presentation::handlers::users::list_authors,
        crate::presentation::handlers::users::list_users,
        crate::presentation::handlers::users::update_roles,
        crate::presentation::handlers::posts::list_posts,
        crate::presentation::handlers::posts::count_posts,
        crate::presentation::handlers::posts::list_own_posts,
        crate::presentation::handlers::posts::list_author_posts,
        crate::presentation::handlers::posts::count_author_posts,
        crate::presentation::handlers::posts::get_post,
        crate::presentation::handlers::posts::create_post,
        crate::presentation::handlers::posts::update_post,
        crate::presentation::handlers::posts::set_published,
        crate::presentation::handlers::posts::upload_thumbnail,
        crate::presentation::handlers::posts::delete_post
    ),
    components(
        schemas(
            SignUpDto,
            SignInDto,
            PasswordResetRequestDto,
            PasswordResetConfirmDto,
            AuthResponseDto,
            MessageDto,
            UserDto,
            ChangePasswordDto,
            ChangeNicknameDto,
            DeleteAccountDto,
            RoleFlagsDto,
            CreatePostDto,
            UpdatePostDto,
            PublishDto,
            ThumbnailUpload,
            PostDto,
            PostSummaryDto,
            ListPostsResponseDto
        )
    ),
    tags(
        (name = "auth", description = "Sign-up, sign-in, activation and password reset"),
        (name = "users", description = "Account self-service and the public author list"),
        (name = "admin", description = "User administration"),
        (name = "posts", description = "Stories, board posts and notices; `kind` is story, board or notice")
    ),
    modifiers(&SecurityAddon)
)]
pub(crate) struct ApiDoc;

pub(crate) struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let mut components = openapi.components.take().unwrap_or_default();
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
        openapi.components = Some(components);
    }
}
