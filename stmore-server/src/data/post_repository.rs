use async_trait::async_trait;

use crate::domain::error::DomainError;
use crate::domain::id::ObjectId;
use crate::domain::pagination::PageRequest;
use crate::domain::post::{Post, PostKind, PostSummary};

#[derive(Debug, Clone)]
pub(crate) struct NewPost {
    pub(crate) id: ObjectId,
    pub(crate) author_id: ObjectId,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) category: Option<String>,
    pub(crate) is_published: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct PostPatch {
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) category: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct PostFilter {
    pub(crate) author_id: Option<ObjectId>,
    pub(crate) published_only: bool,
}

impl PostFilter {
    pub(crate) fn published() -> Self {
        Self {
            author_id: None,
            published_only: true,
        }
    }

    pub(crate) fn published_by(author_id: ObjectId) -> Self {
        Self {
            author_id: Some(author_id),
            published_only: true,
        }
    }

    pub(crate) fn everything_by(author_id: ObjectId) -> Self {
        Self {
            author_id: Some(author_id),
            published_only: false,
        }
    }
}

#[async_trait]
pub(crate) trait PostRepository: Send + Sync {
    async fn create_post(&self, kind: PostKind, input: NewPost) -> Result<Post, DomainError>;
    async fn get_post(&self, kind: PostKind, id: ObjectId) -> Result<Option<Post>, DomainError>;
    async fn update_post(
        &self,
        kind: PostKind,
        id: ObjectId,
        patch: PostPatch,
    ) -> Result<Option<Post>, DomainError>;
    async fn set_published(
        &self,
        kind: PostKind,
        id: ObjectId,
        is_published: bool,
    ) -> Result<Option<Post>, DomainError>;
    async fn set_thumbnail(
        &self,
        kind: PostKind,
        id: ObjectId,
        thumbnail: &str,
    ) -> Result<Option<Post>, DomainError>;
    async fn delete_post(&self, kind: PostKind, id: ObjectId) -> Result<bool, DomainError>;
    /// Newest first.
    async fn list_posts(
        &self,
        kind: PostKind,
        filter: PostFilter,
        page: PageRequest,
    ) -> Result<Vec<PostSummary>, DomainError>;
    async fn count_posts(&self, kind: PostKind, filter: PostFilter) -> Result<i64, DomainError>;
}
