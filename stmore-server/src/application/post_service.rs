use std::sync::Arc;

use tracing::info;

use super::access_guard::{AccessGuard, ensure_admin};
use crate::data::post_repository::{NewPost, PostFilter, PostPatch, PostRepository};
use crate::data::user_repository::UserRepository;
use crate::domain::error::DomainError;
use crate::domain::id::ObjectId;
use crate::domain::identity::Identity;
use crate::domain::pagination::PageRequest;
use crate::domain::post::{CreatePostRequest, Post, PostKind, PostSummary, UpdatePostRequest};
use crate::domain::user::User;
use crate::infrastructure::media::MediaStore;

#[derive(Debug, Clone)]
pub(crate) struct ListPostsResult {
    pub(crate) posts: Vec<PostSummary>,
    pub(crate) page: u32,
    pub(crate) limit: u32,
    pub(crate) total: i64,
}

pub(crate) struct PostService<P: PostRepository, U: UserRepository> {
    repo: P,
    guard: AccessGuard<U>,
    media: Arc<dyn MediaStore>,
}

impl<P: PostRepository, U: UserRepository> PostService<P, U> {
    pub(crate) fn new(repo: P, users: U, media: Arc<dyn MediaStore>) -> Self {
        Self {
            repo,
            guard: AccessGuard::new(users),
            media,
        }
    }

    pub(crate) async fn create(
        &self,
        kind: PostKind,
        actor: &Identity,
        req: CreatePostRequest,
    ) -> Result<Post, DomainError> {
        let user = self.guard.require_user(actor).await?;
        if kind.requires_admin() {
            ensure_admin(&user)?;
        }
        let req = req.validate()?;

        let post = self
            .repo
            .create_post(
                kind,
                NewPost {
                    id: ObjectId::generate(),
                    author_id: user.id,
                    title: req.title,
                    content: req.content,
                    category: req.category,
                    is_published: req
                        .is_published
                        .unwrap_or_else(|| kind.published_by_default()),
                },
            )
            .await?;

        info!(kind = kind.as_str(), post_id = %post.id, author_id = %user.id, "post created");
        Ok(post)
    }

    pub(crate) async fn list_published(
        &self,
        kind: PostKind,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> Result<ListPostsResult, DomainError> {
        self.list(kind, PostFilter::published(), page, limit).await
    }

    pub(crate) async fn count_published(&self, kind: PostKind) -> Result<i64, DomainError> {
        self.repo.count_posts(kind, PostFilter::published()).await
    }

    pub(crate) async fn list_by_author(
        &self,
        kind: PostKind,
        author_id: ObjectId,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> Result<ListPostsResult, DomainError> {
        self.list(kind, PostFilter::published_by(author_id), page, limit)
            .await
    }

    pub(crate) async fn count_by_author(
        &self,
        kind: PostKind,
        author_id: ObjectId,
    ) -> Result<i64, DomainError> {
        self.repo
            .count_posts(kind, PostFilter::published_by(author_id))
            .await
    }

    /// The caller's own posts, drafts included.
    pub(crate) async fn list_own(
        &self,
        kind: PostKind,
        actor: &Identity,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> Result<ListPostsResult, DomainError> {
        let user = self.guard.require_user(actor).await?;
        self.list(kind, PostFilter::everything_by(user.id), page, limit)
            .await
    }

    /// Drafts are visible to their author and to admins only; anyone else
    /// gets not-found.
    pub(crate) async fn get(
        &self,
        kind: PostKind,
        id: ObjectId,
        viewer: Option<&Identity>,
    ) -> Result<Post, DomainError> {
        let post = self.load(kind, id).await?;
        if post.is_published {
            return Ok(post);
        }

        let may_view = match viewer {
            Some(viewer) if viewer.user_id == post.author_id => true,
            Some(viewer) => match self.guard.require_user(viewer).await {
                Ok(user) => user.is_admin,
                Err(DomainError::NotFound(_)) => false,
                Err(err) => return Err(err),
            },
            None => false,
        };
        if !may_view {
            return Err(not_found(kind, id));
        }
        Ok(post)
    }

    pub(crate) async fn update(
        &self,
        kind: PostKind,
        actor: &Identity,
        id: ObjectId,
        req: UpdatePostRequest,
    ) -> Result<Post, DomainError> {
        let user = self.guard.require_user(actor).await?;
        let req = req.validate()?;
        let post = self.load(kind, id).await?;
        authorize(kind, &user, &post)?;

        let patch = PostPatch {
            title: req.title,
            content: req.content,
            category: req.category,
        };
        self.repo
            .update_post(kind, id, patch)
            .await?
            .ok_or_else(|| not_found(kind, id))
    }

    pub(crate) async fn set_published(
        &self,
        kind: PostKind,
        actor: &Identity,
        id: ObjectId,
        is_published: bool,
    ) -> Result<Post, DomainError> {
        let user = self.guard.require_user(actor).await?;
        let post = self.load(kind, id).await?;
        authorize(kind, &user, &post)?;

        let post = self
            .repo
            .set_published(kind, id, is_published)
            .await?
            .ok_or_else(|| not_found(kind, id))?;
        info!(kind = kind.as_str(), post_id = %id, is_published, "publication changed");
        Ok(post)
    }

    /// Authorizes before anything touches the media store.
    pub(crate) async fn attach_thumbnail(
        &self,
        kind: PostKind,
        actor: &Identity,
        id: ObjectId,
        image: &[u8],
    ) -> Result<Post, DomainError> {
        let user = self.guard.require_user(actor).await?;
        let post = self.load(kind, id).await?;
        authorize(kind, &user, &post)?;

        let url = self.media.store_image(image).await?;
        self.repo
            .set_thumbnail(kind, id, &url)
            .await?
            .ok_or_else(|| not_found(kind, id))
    }

    pub(crate) async fn delete(
        &self,
        kind: PostKind,
        actor: &Identity,
        id: ObjectId,
    ) -> Result<(), DomainError> {
        let user = self.guard.require_user(actor).await?;
        let post = self.load(kind, id).await?;
        authorize(kind, &user, &post)?;

        if !self.repo.delete_post(kind, id).await? {
            return Err(not_found(kind, id));
        }
        info!(kind = kind.as_str(), post_id = %id, actor_id = %user.id, "post deleted");
        Ok(())
    }

    async fn load(&self, kind: PostKind, id: ObjectId) -> Result<Post, DomainError> {
        self.repo
            .get_post(kind, id)
            .await?
            .ok_or_else(|| not_found(kind, id))
    }

    async fn list(
        &self,
        kind: PostKind,
        filter: PostFilter,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> Result<ListPostsResult, DomainError> {
        let request = PageRequest::new(page, limit, kind.default_page_size());
        let posts = self.repo.list_posts(kind, filter, request).await?;
        let total = self.repo.count_posts(kind, filter).await?;

        Ok(ListPostsResult {
            posts,
            page: request.page,
            limit: request.limit,
            total,
        })
    }
}

/// Notices belong to the admins collectively; everything else to its author.
fn authorize(kind: PostKind, user: &User, post: &Post) -> Result<(), DomainError> {
    if kind.requires_admin() {
        return ensure_admin(user);
    }
    if post.author_id != user.id {
        return Err(DomainError::Unauthorized("only the author may modify this post"));
    }
    Ok(())
}

fn not_found(kind: PostKind, id: ObjectId) -> DomainError {
    DomainError::not_found(format!("{} id: {id}", kind.as_str()))
}
