use std::sync::Arc;

use anyhow::{Context, Result};

mod application;
mod data;
mod domain;
mod infrastructure;
mod presentation;
mod server;

use application::auth_service::{AuthService, LinkSettings};
use application::post_service::PostService;
use application::user_service::UserService;
use data::repositories::postgres::post_repository::PostgresPostRepository;
use data::repositories::postgres::user_repository::PostgresUserRepository;
use infrastructure::database::{create_pool, run_migrations};
use infrastructure::jwt::JwtService;
use infrastructure::logging::init_logging;
use infrastructure::mailer::{MailDispatcher, build_mailer};
use infrastructure::media::LocalMediaStore;
use infrastructure::settings::Settings;
use presentation::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let settings = Settings::from_env()?;

    init_logging(&settings.log_level)?;

    let pool = create_pool(&settings.database).await?;
    run_migrations(&pool).await?;

    tokio::fs::create_dir_all(&settings.media_dir)
        .await
        .with_context(|| format!("failed to create {}", settings.media_dir.display()))?;

    let jwt = Arc::new(JwtService::new(
        &settings.jwt_secret,
        settings.jwt_ttl_seconds,
    ));
    let mail = MailDispatcher::new(
        build_mailer(settings.smtp.as_ref()).context("failed to configure the mailer")?,
    );
    let media = Arc::new(LocalMediaStore::new(
        settings.media_dir.clone(),
        settings.media_url_prefix.clone(),
    ));

    let users = PostgresUserRepository::new(pool.clone(), &settings.collections);
    let posts = PostgresPostRepository::new(pool.clone(), settings.collections.clone());

    let auth_service = Arc::new(AuthService::new(
        users.clone(),
        Arc::clone(&jwt),
        mail,
        LinkSettings {
            public_base_url: settings.public_base_url.clone(),
            activation_ttl_seconds: settings.activation_ttl_seconds,
            password_reset_ttl_seconds: settings.password_reset_ttl_seconds,
        },
    ));
    let post_service = Arc::new(PostService::new(posts, users.clone(), media));
    let user_service = Arc::new(UserService::new(users));

    let state = AppState::new(pool, auth_service, post_service, user_service, jwt);
    server::run_http(&settings, state).await
}
