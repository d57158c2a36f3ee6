use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::Collections;
use crate::data::post_repository::{NewPost, PostFilter, PostPatch, PostRepository};
use crate::domain::error::DomainError;
use crate::domain::id::ObjectId;
use crate::domain::pagination::PageRequest;
use crate::domain::post::{Post, PostKind, PostSummary};

#[derive(Debug, Clone)]
pub(crate) struct PostgresPostRepository {
    pool: PgPool,
    collections: Collections,
}

impl PostgresPostRepository {
    pub(crate) fn new(pool: PgPool, collections: Collections) -> Self {
        Self { pool, collections }
    }

    /// Wraps a statement that yields post rows (`p`) so the author nickname
    /// is joined in from the users table.
    fn select_with_author(&self, source: &str, with_content: bool) -> String {
        let content = if with_content { "p.content," } else { "" };
        format!(
            r#"
            SELECT
                p.id,
                p.author_id,
                u.nickname AS author_nickname,
                p.thumbnail,
                p.title,
                {content}
                p.category,
                p.is_published,
                p.created_at,
                p.updated_at
            FROM {source} p
            JOIN {users} u ON u.id = p.author_id
            "#,
            users = self.collections.users,
        )
    }

    fn returning_post(&self, statement: &str) -> String {
        format!(
            "WITH changed AS ({statement} RETURNING *) {}",
            self.select_with_author("changed", true)
        )
    }
}

#[derive(sqlx::FromRow)]
struct PostRow {
    id: String,
    author_id: String,
    author_nickname: String,
    thumbnail: Option<String>,
    title: String,
    content: String,
    category: Option<String>,
    is_published: bool,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

#[derive(sqlx::FromRow)]
struct PostSummaryRow {
    id: String,
    author_id: String,
    author_nickname: String,
    thumbnail: Option<String>,
    title: String,
    category: Option<String>,
    is_published: bool,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create_post(&self, kind: PostKind, input: NewPost) -> Result<Post, DomainError> {
        let table = self.collections.posts(kind);
        let sql = self.returning_post(&format!(
            r#"
            INSERT INTO {table} (id, author_id, title, content, category, is_published)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#
        ));
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(input.id.to_hex())
            .bind(input.author_id.to_hex())
            .bind(&input.title)
            .bind(&input.content)
            .bind(&input.category)
            .bind(input.is_published)
            .fetch_one(&self.pool)
            .await
            .map_err(map_post_db_error)?;

        map_row_to_post(kind, row)
    }

    async fn get_post(&self, kind: PostKind, id: ObjectId) -> Result<Option<Post>, DomainError> {
        let sql = format!(
            "{} WHERE p.id = $1",
            self.select_with_author(self.collections.posts(kind), true)
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id.to_hex())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_post_db_error)?;

        row.map(|row| map_row_to_post(kind, row)).transpose()
    }

    async fn update_post(
        &self,
        kind: PostKind,
        id: ObjectId,
        patch: PostPatch,
    ) -> Result<Option<Post>, DomainError> {
        let table = self.collections.posts(kind);
        let sql = self.returning_post(&format!(
            r#"
            UPDATE {table}
            SET title = $2,
                content = $3,
                category = $4,
                updated_at = NOW()
            WHERE id = $1
            "#
        ));
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id.to_hex())
            .bind(&patch.title)
            .bind(&patch.content)
            .bind(&patch.category)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_post_db_error)?;

        row.map(|row| map_row_to_post(kind, row)).transpose()
    }

    async fn set_published(
        &self,
        kind: PostKind,
        id: ObjectId,
        is_published: bool,
    ) -> Result<Option<Post>, DomainError> {
        let table = self.collections.posts(kind);
        let sql = self.returning_post(&format!(
            "UPDATE {table} SET is_published = $2, updated_at = NOW() WHERE id = $1"
        ));
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id.to_hex())
            .bind(is_published)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_post_db_error)?;

        row.map(|row| map_row_to_post(kind, row)).transpose()
    }

    async fn set_thumbnail(
        &self,
        kind: PostKind,
        id: ObjectId,
        thumbnail: &str,
    ) -> Result<Option<Post>, DomainError> {
        let table = self.collections.posts(kind);
        let sql = self.returning_post(&format!(
            "UPDATE {table} SET thumbnail = $2, updated_at = NOW() WHERE id = $1"
        ));
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id.to_hex())
            .bind(thumbnail)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_post_db_error)?;

        row.map(|row| map_row_to_post(kind, row)).transpose()
    }

    async fn delete_post(&self, kind: PostKind, id: ObjectId) -> Result<bool, DomainError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", self.collections.posts(kind));
        let result = sqlx::query(&sql)
            .bind(id.to_hex())
            .execute(&self.pool)
            .await
            .map_err(map_post_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_posts(
        &self,
        kind: PostKind,
        filter: PostFilter,
        page: PageRequest,
    ) -> Result<Vec<PostSummary>, DomainError> {
        let sql = format!(
            r#"
            {}
            WHERE ($1::text IS NULL OR p.author_id = $1)
              AND ($2::boolean IS NULL OR p.is_published = $2)
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT $3
            OFFSET $4
            "#,
            self.select_with_author(self.collections.posts(kind), false)
        );
        let rows = sqlx::query_as::<_, PostSummaryRow>(&sql)
            .bind(filter.author_id.map(ObjectId::to_hex))
            .bind(filter.published_only.then_some(true))
            .bind(page.limit())
            .bind(page.skip())
            .fetch_all(&self.pool)
            .await
            .map_err(map_post_db_error)?;

        rows.into_iter()
            .map(|row| map_row_to_summary(kind, row))
            .collect()
    }

    async fn count_posts(&self, kind: PostKind, filter: PostFilter) -> Result<i64, DomainError> {
        let sql = format!(
            r#"
            SELECT COUNT(*)
            FROM {}
            WHERE ($1::text IS NULL OR author_id = $1)
              AND ($2::boolean IS NULL OR is_published = $2)
            "#,
            self.collections.posts(kind)
        );
        sqlx::query_scalar::<_, i64>(&sql)
            .bind(filter.author_id.map(ObjectId::to_hex))
            .bind(filter.published_only.then_some(true))
            .fetch_one(&self.pool)
            .await
            .map_err(map_post_db_error)
    }
}

fn parse_stored_id(raw: &str) -> Result<ObjectId, DomainError> {
    raw.parse()
        .map_err(|err: DomainError| DomainError::Unexpected(err.to_string()))
}

fn map_row_to_post(kind: PostKind, row: PostRow) -> Result<Post, DomainError> {
    Ok(Post {
        id: parse_stored_id(&row.id)?,
        kind,
        author_id: parse_stored_id(&row.author_id)?,
        author_nickname: row.author_nickname,
        thumbnail: row.thumbnail,
        title: row.title,
        content: row.content,
        category: row.category,
        is_published: row.is_published,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn map_row_to_summary(kind: PostKind, row: PostSummaryRow) -> Result<PostSummary, DomainError> {
    Ok(PostSummary {
        id: parse_stored_id(&row.id)?,
        kind,
        author_id: parse_stored_id(&row.author_id)?,
        author_nickname: row.author_nickname,
        thumbnail: row.thumbnail,
        title: row.title,
        category: row.category,
        is_published: row.is_published,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn map_post_db_error(err: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db_err) = &err
        && db_err.code().as_deref() == Some("23503")
    {
        return DomainError::not_found("author");
    }
    DomainError::Unexpected(err.to_string())
}
