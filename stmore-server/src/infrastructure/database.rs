use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use tracing::info;

use super::settings::{DatabaseSettings, DatabaseTarget};

pub(crate) async fn create_pool(settings: &DatabaseSettings) -> Result<PgPool> {
    let options = connect_options(&settings.target)?;

    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .connect_with(options)
        .await
        .context("failed to connect to the database")?;

    info!(
        max_connections = settings.max_connections,
        "database pool ready"
    );
    Ok(pool)
}

pub(crate) async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("failed to run database migrations")?;
    info!("database migrations applied");
    Ok(())
}

fn connect_options(target: &DatabaseTarget) -> Result<PgConnectOptions> {
    let options = match target {
        DatabaseTarget::Url(url) => {
            PgConnectOptions::from_str(url).context("DATABASE_URL is not a valid postgres url")?
        }
        DatabaseTarget::Secrets(secrets) => PgConnectOptions::new()
            .host(&secrets.host)
            .port(secrets.port)
            .username(&secrets.user)
            .password(&secrets.password)
            .database(&secrets.database),
    };
    Ok(options)
}
