use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::Collections;
use crate::data::user_repository::{NewUser, UserCredentials, UserRepository};
use crate::domain::error::DomainError;
use crate::domain::id::ObjectId;
use crate::domain::user::{RoleFlags, User};

const USER_COLUMNS: &str = "id, email, nickname, is_active, is_staff, is_admin, created_at";

#[derive(Debug, Clone)]
pub(crate) struct PostgresUserRepository {
    pool: PgPool,
    table: String,
}

impl PostgresUserRepository {
    pub(crate) fn new(pool: PgPool, collections: &Collections) -> Self {
        Self {
            pool,
            table: collections.users.clone(),
        }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    email: String,
    nickname: String,
    is_active: bool,
    is_staff: bool,
    is_admin: bool,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct UserCredentialsRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create_user(&self, input: NewUser) -> Result<User, DomainError> {
        let sql = format!(
            r#"
            INSERT INTO {} (id, email, nickname, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#,
            self.table
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(input.id.to_hex())
            .bind(&input.email)
            .bind(&input.nickname)
            .bind(&input.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(map_user_db_error)?;

        map_row_to_user(row)
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<User>, DomainError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM {} WHERE id = $1", self.table);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id.to_hex())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_user_db_error)?;

        row.map(map_row_to_user).transpose()
    }

    async fn find_credentials_by_id(
        &self,
        id: ObjectId,
    ) -> Result<Option<UserCredentials>, DomainError> {
        let sql = format!(
            "SELECT {USER_COLUMNS}, password_hash FROM {} WHERE id = $1",
            self.table
        );
        let row = sqlx::query_as::<_, UserCredentialsRow>(&sql)
            .bind(id.to_hex())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_user_db_error)?;

        row.map(map_row_to_credentials).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserCredentials>, DomainError> {
        let sql = format!(
            "SELECT {USER_COLUMNS}, password_hash FROM {} WHERE email = $1",
            self.table
        );
        let row = sqlx::query_as::<_, UserCredentialsRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_user_db_error)?;

        row.map(map_row_to_credentials).transpose()
    }

    async fn activate(&self, id: ObjectId) -> Result<bool, DomainError> {
        let sql = format!("UPDATE {} SET is_active = TRUE WHERE id = $1", self.table);
        let result = sqlx::query(&sql)
            .bind(id.to_hex())
            .execute(&self.pool)
            .await
            .map_err(map_user_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_password(
        &self,
        id: ObjectId,
        password_hash: &str,
    ) -> Result<bool, DomainError> {
        let sql = format!("UPDATE {} SET password_hash = $2 WHERE id = $1", self.table);
        let result = sqlx::query(&sql)
            .bind(id.to_hex())
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .map_err(map_user_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_nickname(
        &self,
        id: ObjectId,
        nickname: &str,
    ) -> Result<Option<User>, DomainError> {
        let sql = format!(
            "UPDATE {} SET nickname = $2 WHERE id = $1 RETURNING {USER_COLUMNS}",
            self.table
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id.to_hex())
            .bind(nickname)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_user_db_error)?;

        row.map(map_row_to_user).transpose()
    }

    async fn update_roles(
        &self,
        email: &str,
        roles: RoleFlags,
    ) -> Result<Option<User>, DomainError> {
        let sql = format!(
            r#"
            UPDATE {}
            SET is_admin = $2,
                is_staff = $3
            WHERE email = $1
            RETURNING {USER_COLUMNS}
            "#,
            self.table
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .bind(roles.is_admin)
            .bind(roles.is_staff)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_user_db_error)?;

        row.map(map_row_to_user).transpose()
    }

    async fn delete_user(&self, id: ObjectId) -> Result<bool, DomainError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", self.table);
        let result = sqlx::query(&sql)
            .bind(id.to_hex())
            .execute(&self.pool)
            .await
            .map_err(map_user_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_users(&self) -> Result<Vec<User>, DomainError> {
        let sql = format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM {}
            ORDER BY is_admin DESC, is_staff DESC, created_at ASC
            "#,
            self.table
        );
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(map_user_db_error)?;

        rows.into_iter().map(map_row_to_user).collect()
    }

    async fn list_staff(&self) -> Result<Vec<User>, DomainError> {
        let sql = format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM {}
            WHERE is_staff = TRUE
            ORDER BY is_admin DESC, created_at ASC
            "#,
            self.table
        );
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(map_user_db_error)?;

        rows.into_iter().map(map_row_to_user).collect()
    }
}

fn map_row_to_user(row: UserRow) -> Result<User, DomainError> {
    let id = row
        .id
        .parse::<ObjectId>()
        .map_err(|err| DomainError::Unexpected(err.to_string()))?;
    let user = User::new(id, row.email, row.nickname, row.created_at)
        .map_err(|err| DomainError::Unexpected(err.to_string()))?;

    Ok(user.with_flags(
        row.is_active,
        RoleFlags {
            is_admin: row.is_admin,
            is_staff: row.is_staff,
        },
    ))
}

fn map_row_to_credentials(row: UserCredentialsRow) -> Result<UserCredentials, DomainError> {
    Ok(UserCredentials {
        user: map_row_to_user(row.user)?,
        password_hash: row.password_hash,
    })
}

fn map_user_db_error(err: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db_err) = &err
        && db_err.code().as_deref() == Some("23505")
    {
        let resource = match db_err.constraint() {
            Some(name) if name.ends_with("nickname_key") => "nickname",
            Some(name) if name.ends_with("email_key") => "email",
            _ => "user",
        };
        return DomainError::AlreadyExists(resource.to_string());
    }
    DomainError::Unexpected(err.to_string())
}
