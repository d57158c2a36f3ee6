use sqlx::PgPool;
use std::sync::Arc;

use crate::application::auth_service::AuthService;
use crate::application::post_service::PostService;
use crate::application::user_service::UserService;
use crate::data::repositories::postgres::post_repository::PostgresPostRepository;
use crate::data::repositories::postgres::user_repository::PostgresUserRepository;
use crate::infrastructure::jwt::JwtService;

pub(crate) mod app_error;
pub(crate) mod extract;
pub(crate) mod handlers;
pub(crate) mod http_handlers;
pub(crate) mod middleware;
pub(crate) mod openapi;
pub(crate) mod routes;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) pool: PgPool,
    pub(crate) auth_service: Arc<AuthService<PostgresUserRepository>>,
    pub(crate) post_service: Arc<PostService<PostgresPostRepository, PostgresUserRepository>>,
    pub(crate) user_service: Arc<UserService<PostgresUserRepository>>,
    pub(crate) jwt: Arc<JwtService>,
}

impl AppState {
    pub(crate) fn new(
        pool: PgPool,
        auth_service: Arc<AuthService<PostgresUserRepository>>,
        post_service: Arc<PostService<PostgresPostRepository, PostgresUserRepository>>,
        user_service: Arc<UserService<PostgresUserRepository>>,
        jwt: Arc<JwtService>,
    ) -> Self {
        Self {
            pool,
            auth_service,
            post_service,
            user_service,
            jwt,
        }
    }
}
