use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::data::repositories::postgres::Collections;

#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub(crate) database: DatabaseSettings,
    pub(crate) collections: Collections,
    pub(crate) jwt_secret: String,
    pub(crate) jwt_ttl_seconds: i64,
    pub(crate) activation_ttl_seconds: i64,
    pub(crate) password_reset_ttl_seconds: i64,
    pub(crate) http_addr: String,
    pub(crate) public_base_url: String,
    pub(crate) cors_origins: Vec<String>,
    pub(crate) log_level: String,
    pub(crate) http_request_body_limit_bytes: usize,
    pub(crate) http_concurrency_limit: usize,
    pub(crate) http_request_timeout_secs: u64,
    pub(crate) media_dir: PathBuf,
    pub(crate) media_url_prefix: String,
    pub(crate) smtp: Option<SmtpAccount>,
}

#[derive(Debug, Clone)]
pub(crate) struct DatabaseSettings {
    pub(crate) target: DatabaseTarget,
    pub(crate) max_connections: u32,
    pub(crate) acquire_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub(crate) enum DatabaseTarget {
    Url(String),
    Secrets(DatabaseSecrets),
}

/// Contents of `DATABASE_SECRETS_FILE`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DatabaseSecrets {
    pub(crate) host: String,
    #[serde(default = "default_postgres_port")]
    pub(crate) port: u16,
    pub(crate) user: String,
    pub(crate) password: String,
    pub(crate) database: String,
}

/// Contents of `SMTP_SECRETS_FILE`: the sender account and its relay.
#[derive(Clone, Deserialize)]
pub(crate) struct SmtpAccount {
    #[serde(alias = "Email")]
    pub(crate) email: String,
    #[serde(alias = "Password")]
    pub(crate) password: String,
    #[serde(alias = "Host")]
    pub(crate) host: String,
    #[serde(default = "default_smtp_port", alias = "Port")]
    pub(crate) port: u16,
}

impl std::fmt::Debug for SmtpAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpAccount")
            .field("email", &self.email)
            .field("host", &self.host)
            .field("port", &self.port)
            .finish_non_exhaustive()
    }
}

fn default_postgres_port() -> u16 {
    5432
}

fn default_smtp_port() -> u16 {
    587
}

impl Settings {
    pub(crate) fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let env = Env(lookup);

        let target = match (env.get("DATABASE_URL"), env.get("DATABASE_SECRETS_FILE")) {
            (Some(url), _) => DatabaseTarget::Url(url),
            (None, Some(path)) => DatabaseTarget::Secrets(read_secrets_file(Path::new(&path))?),
            (None, None) => {
                return Err(anyhow!(
                    "DATABASE_URL or DATABASE_SECRETS_FILE is required"
                ));
            }
        };
        let database = DatabaseSettings {
            target,
            max_connections: env.positive("DATABASE_MAX_CONNECTIONS", 10u32)?,
            acquire_timeout_secs: env.positive("DATABASE_ACQUIRE_TIMEOUT_SECS", 5u64)?,
        };

        let defaults = Collections::default();
        let collections = Collections {
            users: env.get("COLLECTION_USERS").unwrap_or(defaults.users),
            story: env.get("COLLECTION_STORY").unwrap_or(defaults.story),
            board: env.get("COLLECTION_BOARD").unwrap_or(defaults.board),
            notice: env.get("COLLECTION_NOTICE").unwrap_or(defaults.notice),
        }
        .validate()?;

        let jwt_secret = env.get("JWT_SECRET").context("JWT_SECRET is required")?;
        if jwt_secret.chars().count() < 32 {
            return Err(anyhow!("JWT_SECRET must be at least 32 characters"));
        }
        let jwt_ttl_seconds = env.positive("JWT_TTL_SECONDS", 72 * 60 * 60i64)?;
        let activation_ttl_seconds = env.positive("ACTIVATION_TTL_SECONDS", 72 * 60 * 60i64)?;
        let password_reset_ttl_seconds = env.positive("PASSWORD_RESET_TTL_SECONDS", 3600i64)?;

        let http_addr = env
            .get("HTTP_ADDR")
            .unwrap_or_else(|| "0.0.0.0:8080".to_string());
        let public_base_url = env
            .get("PUBLIC_BASE_URL")
            .unwrap_or_else(|| "http://localhost:8080".to_string())
            .trim_end_matches('/')
            .to_string();
        let cors_origins = parse_cors_origins(
            &env.get("CORS_ORIGINS")
                .unwrap_or_else(|| "http://localhost:8000,http://127.0.0.1:8000".to_string()),
        );
        let log_level = env
            .get("LOG_LEVEL")
            .or_else(|| env.get("RUST_LOG"))
            .unwrap_or_else(|| "info".to_string());

        let media_dir = PathBuf::from(env.get("MEDIA_DIR").unwrap_or_else(|| "./media".to_string()));
        let media_url_prefix = normalize_url_prefix(
            &env.get("MEDIA_URL_PREFIX")
                .unwrap_or_else(|| "/media".to_string()),
        )?;

        let smtp = env
            .get("SMTP_SECRETS_FILE")
            .map(|path| read_secrets_file::<SmtpAccount>(Path::new(&path)))
            .transpose()?;

        Ok(Self {
            database,
            collections,
            jwt_secret,
            jwt_ttl_seconds,
            activation_ttl_seconds,
            password_reset_ttl_seconds,
            http_addr,
            public_base_url,
            cors_origins,
            log_level,
            http_request_body_limit_bytes: env
                .positive("HTTP_REQUEST_BODY_LIMIT_BYTES", 5 * 1024 * 1024usize)?,
            http_concurrency_limit: env.positive("HTTP_CONCURRENCY_LIMIT", 256usize)?,
            http_request_timeout_secs: env.positive("HTTP_REQUEST_TIMEOUT_SECS", 10u64)?,
            media_dir,
            media_url_prefix,
            smtp,
        })
    }
}

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// Trimmed value; blank counts as unset.
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn positive<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: std::str::FromStr + PartialOrd + Default + Copy,
    {
        let value = match self.get(key) {
            Some(raw) => raw
                .parse::<T>()
                .map_err(|_| anyhow!("Failed to parse {key}, expecting positive integer"))?,
            None => default,
        };

        if value <= T::default() {
            return Err(anyhow!("{key} must be > 0"));
        }
        Ok(value)
    }
}

fn read_secrets_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read secrets file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse secrets file {}", path.display()))
}

fn parse_cors_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

fn normalize_url_prefix(raw: &str) -> Result<String> {
    let trimmed = raw.trim_matches('/');
    if trimmed.is_empty() || trimmed.contains(['{', '}', '*']) {
        return Err(anyhow!("MEDIA_URL_PREFIX must be a plain path like /media"));
    }
    Ok(format!("/{trimmed}"))
}
