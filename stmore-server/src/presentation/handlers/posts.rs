use axum::{
    Extension, Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::application::post_service::ListPostsResult;
use crate::domain::id::ObjectId;
use crate::domain::post::{CreatePostRequest, Post, PostKind, PostSummary, UpdatePostRequest};
use crate::presentation::AppState;
use crate::presentation::app_error::{AppError, AppResult};
use crate::presentation::extract::JsonOrForm;
use crate::presentation::middleware::auth::AuthenticatedUser;

const THUMBNAIL_FIELD: &str = "thumbnail";

/// Accepted as JSON or as an urlencoded form.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct CreatePostDto {
    #[validate(length(min = 1, max = 255))]
    pub(crate) title: String,
    #[validate(length(min = 1))]
    pub(crate) content: String,
    #[validate(length(max = 64))]
    pub(crate) category: Option<String>,
    /// Defaults to draft for stories, published otherwise.
    pub(crate) is_published: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct UpdatePostDto {
    #[validate(length(min = 1, max = 255))]
    pub(crate) title: String,
    #[validate(length(min = 1))]
    pub(crate) content: String,
    #[validate(length(max = 64))]
    pub(crate) category: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct PublishDto {
    pub(crate) is_published: bool,
}

/// Zero or missing values fall back to page 1 and the kind's page size.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub(crate) struct PaginationQuery {
    pub(crate) page: Option<u32>,
    pub(crate) limit: Option<u32>,
}

/// Documents the multipart body of a thumbnail upload; the handler reads
/// the field straight from the stream.
#[derive(ToSchema)]
#[allow(dead_code)]
pub(crate) struct ThumbnailUpload {
    #[schema(value_type = String, format = Binary)]
    thumbnail: Vec<u8>,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct PostDto {
    pub(crate) id: String,
    pub(crate) kind: &'static str,
    pub(crate) author_id: String,
    pub(crate) author_nickname: String,
    pub(crate) thumbnail: Option<String>,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) category: Option<String>,
    pub(crate) is_published: bool,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: Option<DateTime<Utc>>,
}

/// List entry. Carries no body text.
#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct PostSummaryDto {
    pub(crate) id: String,
    pub(crate) kind: &'static str,
    pub(crate) author_id: String,
    pub(crate) author_nickname: String,
    pub(crate) thumbnail: Option<String>,
    pub(crate) title: String,
    pub(crate) category: Option<String>,
    pub(crate) is_published: bool,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct ListPostsResponseDto {
    pub(crate) posts: Vec<PostSummaryDto>,
    pub(crate) page: u32,
    pub(crate) limit: u32,
    pub(crate) total: i64,
}

impl From<Post> for PostDto {
    fn from(post: Post) -> Self {
        Self {
            id: post.id.to_hex(),
            kind: post.kind.as_str(),
            author_id: post.author_id.to_hex(),
            author_nickname: post.author_nickname,
            thumbnail: post.thumbnail,
            title: post.title,
            content: post.content,
            category: post.category,
            is_published: post.is_published,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

impl From<PostSummary> for PostSummaryDto {
    fn from(post: PostSummary) -> Self {
        Self {
            id: post.id.to_hex(),
            kind: post.kind.as_str(),
            author_id: post.author_id.to_hex(),
            author_nickname: post.author_nickname,
            thumbnail: post.thumbnail,
            title: post.title,
            category: post.category,
            is_published: post.is_published,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

impl From<ListPostsResult> for ListPostsResponseDto {
    fn from(result: ListPostsResult) -> Self {
        Self {
            posts: result.posts.into_iter().map(PostSummaryDto::from).collect(),
            page: result.page,
            limit: result.limit,
            total: result.total,
        }
    }
}

#[utoipa::path(
    get,
    path = "/{kind}",
    tag = "posts",
    params(
        ("kind" = String, Path, description = "story, board or notice"),
        PaginationQuery
    ),
    responses(
        (status = 200, description = "Published posts, newest first", body = ListPostsResponseDto),
        (status = 401, description = "Invalid bearer token"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn list_posts(
    State(state): State<AppState>,
    Extension(kind): Extension<PostKind>,
    Query(query): Query<PaginationQuery>,
) -> AppResult<(StatusCode, Json<ListPostsResponseDto>)> {
    let result = state
        .post_service
        .list_published(kind, query.page, query.limit)
        .await?;
    Ok((StatusCode::OK, Json(result.into())))
}

#[utoipa::path(
    get,
    path = "/{kind}/count",
    tag = "posts",
    params(
        ("kind" = String, Path, description = "story, board or notice")
    ),
    responses(
        (status = 200, description = "Number of published posts", body = String, content_type = "text/plain"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn count_posts(
    State(state): State<AppState>,
    Extension(kind): Extension<PostKind>,
) -> AppResult<String> {
    let total = state.post_service.count_published(kind).await?;
    Ok(total.to_string())
}

#[utoipa::path(
    get,
    path = "/{kind}/mine",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("kind" = String, Path, description = "story, board or notice"),
        PaginationQuery
    ),
    responses(
        (status = 200, description = "Caller's posts, drafts included", body = ListPostsResponseDto),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Account no longer exists"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn list_own_posts(
    State(state): State<AppState>,
    Extension(kind): Extension<PostKind>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Query(query): Query<PaginationQuery>,
) -> AppResult<(StatusCode, Json<ListPostsResponseDto>)> {
    let result = state
        .post_service
        .list_own(kind, &identity, query.page, query.limit)
        .await?;
    Ok((StatusCode::OK, Json(result.into())))
}

#[utoipa::path(
    get,
    path = "/{kind}/author/{author_id}",
    tag = "posts",
    params(
        ("kind" = String, Path, description = "story, board or notice"),
        ("author_id" = String, Path, description = "Author id (24 hex chars)"),
        PaginationQuery
    ),
    responses(
        (status = 200, description = "Author's published posts", body = ListPostsResponseDto),
        (status = 400, description = "Malformed id"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn list_author_posts(
    State(state): State<AppState>,
    Extension(kind): Extension<PostKind>,
    Path(author_id): Path<String>,
    Query(query): Query<PaginationQuery>,
) -> AppResult<(StatusCode, Json<ListPostsResponseDto>)> {
    let author_id = author_id.parse::<ObjectId>()?;
    let result = state
        .post_service
        .list_by_author(kind, author_id, query.page, query.limit)
        .await?;
    Ok((StatusCode::OK, Json(result.into())))
}

#[utoipa::path(
    get,
    path = "/{kind}/author/{author_id}/count",
    tag = "posts",
    params(
        ("kind" = String, Path, description = "story, board or notice"),
        ("author_id" = String, Path, description = "Author id (24 hex chars)")
    ),
    responses(
        (status = 200, description = "Number of the author's published posts", body = String, content_type = "text/plain"),
        (status = 400, description = "Malformed id"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn count_author_posts(
    State(state): State<AppState>,
    Extension(kind): Extension<PostKind>,
    Path(author_id): Path<String>,
) -> AppResult<String> {
    let author_id = author_id.parse::<ObjectId>()?;
    let total = state.post_service.count_by_author(kind, author_id).await?;
    Ok(total.to_string())
}

#[utoipa::path(
    get,
    path = "/{kind}/{id}",
    tag = "posts",
    params(
        ("kind" = String, Path, description = "story, board or notice"),
        ("id" = String, Path, description = "Post id (24 hex chars)")
    ),
    responses(
        (status = 200, description = "Post found", body = PostDto),
        (status = 400, description = "Malformed id"),
        (status = 401, description = "Invalid bearer token"),
        (status = 404, description = "Post not found or not visible to the caller"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn get_post(
    State(state): State<AppState>,
    Extension(kind): Extension<PostKind>,
    viewer: Option<AuthenticatedUser>,
    Path(id): Path<String>,
) -> AppResult<(StatusCode, Json<PostDto>)> {
    let id = id.parse::<ObjectId>()?;
    let viewer = viewer.map(|AuthenticatedUser(identity)| identity);
    let post = state.post_service.get(kind, id, viewer.as_ref()).await?;
    Ok((StatusCode::OK, Json(post.into())))
}

#[utoipa::path(
    post,
    path = "/{kind}",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("kind" = String, Path, description = "story, board or notice")
    ),
    request_body = CreatePostDto,
    responses(
        (status = 201, description = "Post created", body = PostDto),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized, or not an admin for notices"),
        (status = 404, description = "Account no longer exists"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn create_post(
    State(state): State<AppState>,
    Extension(kind): Extension<PostKind>,
    AuthenticatedUser(identity): AuthenticatedUser,
    JsonOrForm(dto): JsonOrForm<CreatePostDto>,
) -> AppResult<(StatusCode, Json<PostDto>)> {
    dto.validate()?;
    let req = CreatePostRequest {
        title: dto.title,
        content: dto.content,
        category: dto.category,
        is_published: dto.is_published,
    };

    let post = state.post_service.create(kind, &identity, req).await?;
    Ok((StatusCode::CREATED, Json(post.into())))
}

#[utoipa::path(
    patch,
    path = "/{kind}/{id}",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("kind" = String, Path, description = "story, board or notice"),
        ("id" = String, Path, description = "Post id (24 hex chars)")
    ),
    request_body = UpdatePostDto,
    responses(
        (status = 200, description = "Post updated", body = PostDto),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized or not the author"),
        (status = 404, description = "Post not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn update_post(
    State(state): State<AppState>,
    Extension(kind): Extension<PostKind>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Path(id): Path<String>,
    JsonOrForm(dto): JsonOrForm<UpdatePostDto>,
) -> AppResult<(StatusCode, Json<PostDto>)> {
    let id = id.parse::<ObjectId>()?;
    dto.validate()?;
    let req = UpdatePostRequest {
        title: dto.title,
        content: dto.content,
        category: dto.category,
    };

    let post = state.post_service.update(kind, &identity, id, req).await?;
    Ok((StatusCode::OK, Json(post.into())))
}

#[utoipa::path(
    patch,
    path = "/{kind}/{id}/publish",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("kind" = String, Path, description = "story, board or notice"),
        ("id" = String, Path, description = "Post id (24 hex chars)")
    ),
    request_body = PublishDto,
    responses(
        (status = 200, description = "Publication flag set", body = PostDto),
        (status = 400, description = "Malformed id"),
        (status = 401, description = "Unauthorized or not the author"),
        (status = 404, description = "Post not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn set_published(
    State(state): State<AppState>,
    Extension(kind): Extension<PostKind>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Path(id): Path<String>,
    Json(dto): Json<PublishDto>,
) -> AppResult<(StatusCode, Json<PostDto>)> {
    let id = id.parse::<ObjectId>()?;
    let post = state
        .post_service
        .set_published(kind, &identity, id, dto.is_published)
        .await?;
    Ok((StatusCode::OK, Json(post.into())))
}

#[utoipa::path(
    put,
    path = "/{kind}/{id}/thumbnail",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("kind" = String, Path, description = "story, board or notice"),
        ("id" = String, Path, description = "Post id (24 hex chars)")
    ),
    request_body(content = ThumbnailUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Thumbnail stored", body = PostDto),
        (status = 400, description = "Missing field or unsupported image type"),
        (status = 401, description = "Unauthorized or not the author"),
        (status = 404, description = "Post not found"),
        (status = 413, description = "Upload too large"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn upload_thumbnail(
    State(state): State<AppState>,
    Extension(kind): Extension<PostKind>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<PostDto>)> {
    let id = id.parse::<ObjectId>()?;

    let mut image = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(THUMBNAIL_FIELD) {
            image = Some(field.bytes().await?);
            break;
        }
    }
    let image = image.ok_or_else(|| {
        AppError::BadRequest(format!("missing multipart field '{THUMBNAIL_FIELD}'"))
    })?;

    let post = state
        .post_service
        .attach_thumbnail(kind, &identity, id, &image)
        .await?;
    Ok((StatusCode::OK, Json(post.into())))
}

#[utoipa::path(
    delete,
    path = "/{kind}/{id}",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("kind" = String, Path, description = "story, board or notice"),
        ("id" = String, Path, description = "Post id (24 hex chars)")
    ),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 400, description = "Malformed id"),
        (status = 401, description = "Unauthorized or not the author"),
        (status = 404, description = "Post not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn delete_post(
    State(state): State<AppState>,
    Extension(kind): Extension<PostKind>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let id = id.parse::<ObjectId>()?;
    state.post_service.delete(kind, &identity, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        extract::{FromRequest, Request},
        http::header,
    };
    use chrono::Utc;
    use validator::Validate;

    use super::{CreatePostDto, ListPostsResponseDto, PostSummaryDto};
    use crate::presentation::extract::JsonOrForm;
    use crate::application::post_service::ListPostsResult;
    use crate::domain::id::ObjectId;
    use crate::domain::post::{PostKind, PostSummary};

    fn summary() -> PostSummary {
        PostSummary {
            id: ObjectId::generate(),
            kind: PostKind::Story,
            author_id: ObjectId::generate(),
            author_nickname: "writer".to_string(),
            thumbnail: None,
            title: "title".to_string(),
            category: Some("travel".to_string()),
            is_published: true,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn list_response_never_carries_content() {
        let dto = ListPostsResponseDto::from(ListPostsResult {
            posts: vec![summary()],
            page: 1,
            limit: 15,
            total: 1,
        });
        let json = serde_json::to_value(dto).expect("serialize");

        let entry = json["posts"][0].as_object().expect("object");
        assert!(!entry.contains_key("content"));
        assert!(!entry.keys().any(|key| key.contains("password")));
        assert_eq!(entry["kind"], "story");
        assert_eq!(json["limit"], 15);
    }

    #[test]
    fn ids_render_as_hex() {
        let source = summary();
        let expected = source.id.to_hex();
        let dto = PostSummaryDto::from(source);
        assert_eq!(dto.id, expected);
    }

    #[tokio::test]
    async fn create_accepts_form_fields() {
        let req = Request::builder()
            .method("POST")
            .uri("/board")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("title=Weekly+notes&content=Hello%21&is_published=true"))
            .expect("request");

        let JsonOrForm(dto) = JsonOrForm::<CreatePostDto>::from_request(req, &())
            .await
            .expect("form must decode");
        dto.validate().expect("valid");
        assert_eq!(dto.title, "Weekly notes");
        assert_eq!(dto.content, "Hello!");
        assert_eq!(dto.is_published, Some(true));
        assert!(dto.category.is_none());
    }
}
