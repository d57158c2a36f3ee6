//! In-memory repositories backing the service tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::data::post_repository::{NewPost, PostFilter, PostPatch, PostRepository};
use crate::data::user_repository::{NewUser, UserCredentials, UserRepository};
use crate::domain::error::DomainError;
use crate::domain::id::ObjectId;
use crate::domain::pagination::PageRequest;
use crate::domain::post::{Post, PostKind, PostSummary};
use crate::domain::user::{RoleFlags, User};

#[derive(Clone, Default)]
pub(crate) struct InMemoryUserRepo {
    users: Arc<Mutex<Vec<UserCredentials>>>,
}

impl InMemoryUserRepo {
    pub(crate) fn insert(&self, user: User, password_hash: &str) {
        self.users
            .lock()
            .expect("users mutex poisoned")
            .push(UserCredentials {
                user,
                password_hash: password_hash.to_string(),
            });
    }

    pub(crate) fn get(&self, id: ObjectId) -> Option<UserCredentials> {
        self.users
            .lock()
            .expect("users mutex poisoned")
            .iter()
            .find(|creds| creds.user.id == id)
            .cloned()
    }

    fn modify<T>(&self, id: ObjectId, f: impl FnOnce(&mut UserCredentials) -> T) -> Option<T> {
        self.users
            .lock()
            .expect("users mutex poisoned")
            .iter_mut()
            .find(|creds| creds.user.id == id)
            .map(f)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepo {
    async fn create_user(&self, input: NewUser) -> Result<User, DomainError> {
        let mut users = self.users.lock().expect("users mutex poisoned");
        if users.iter().any(|c| c.user.email == input.email) {
            return Err(DomainError::AlreadyExists("email".to_string()));
        }
        if users.iter().any(|c| c.user.nickname == input.nickname) {
            return Err(DomainError::AlreadyExists("nickname".to_string()));
        }
        let user = User::new(input.id, input.email, input.nickname, Utc::now())?;
        users.push(UserCredentials {
            user: user.clone(),
            password_hash: input.password_hash,
        });
        Ok(user)
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<User>, DomainError> {
        Ok(self.get(id).map(|creds| creds.user))
    }

    async fn find_credentials_by_id(
        &self,
        id: ObjectId,
    ) -> Result<Option<UserCredentials>, DomainError> {
        Ok(self.get(id))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserCredentials>, DomainError> {
        Ok(self
            .users
            .lock()
            .expect("users mutex poisoned")
            .iter()
            .find(|creds| creds.user.email == email)
            .cloned())
    }

    async fn activate(&self, id: ObjectId) -> Result<bool, DomainError> {
        Ok(self.modify(id, |creds| creds.user.is_active = true).is_some())
    }

    async fn update_password(
        &self,
        id: ObjectId,
        password_hash: &str,
    ) -> Result<bool, DomainError> {
        Ok(self
            .modify(id, |creds| creds.password_hash = password_hash.to_string())
            .is_some())
    }

    async fn update_nickname(
        &self,
        id: ObjectId,
        nickname: &str,
    ) -> Result<Option<User>, DomainError> {
        let mut users = self.users.lock().expect("users mutex poisoned");
        if users
            .iter()
            .any(|c| c.user.nickname == nickname && c.user.id != id)
        {
            return Err(DomainError::AlreadyExists("nickname".to_string()));
        }
        Ok(users
            .iter_mut()
            .find(|creds| creds.user.id == id)
            .map(|creds| {
                creds.user.nickname = nickname.to_string();
                creds.user.clone()
            }))
    }

    async fn update_roles(
        &self,
        email: &str,
        roles: RoleFlags,
    ) -> Result<Option<User>, DomainError> {
        Ok(self
            .users
            .lock()
            .expect("users mutex poisoned")
            .iter_mut()
            .find(|creds| creds.user.email == email)
            .map(|creds| {
                creds.user.is_admin = roles.is_admin;
                creds.user.is_staff = roles.is_staff;
                creds.user.clone()
            }))
    }

    async fn delete_user(&self, id: ObjectId) -> Result<bool, DomainError> {
        let mut users = self.users.lock().expect("users mutex poisoned");
        let before = users.len();
        users.retain(|creds| creds.user.id != id);
        Ok(users.len() != before)
    }

    async fn list_users(&self) -> Result<Vec<User>, DomainError> {
        let mut users: Vec<User> = self
            .users
            .lock()
            .expect("users mutex poisoned")
            .iter()
            .map(|creds| creds.user.clone())
            .collect();
        users.sort_by(|a, b| {
            b.is_admin
                .cmp(&a.is_admin)
                .then(b.is_staff.cmp(&a.is_staff))
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(users)
    }

    async fn list_staff(&self) -> Result<Vec<User>, DomainError> {
        let users = self.list_users().await?;
        Ok(users.into_iter().filter(|user| user.is_staff).collect())
    }
}

#[derive(Clone)]
pub(crate) struct InMemoryPostRepo {
    users: InMemoryUserRepo,
    posts: Arc<Mutex<Vec<Post>>>,
}

impl InMemoryPostRepo {
    /// Author nicknames are resolved through `users`, mirroring the SQL join.
    pub(crate) fn new(users: InMemoryUserRepo) -> Self {
        Self {
            users,
            posts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn all(&self) -> Vec<Post> {
        self.posts.lock().expect("posts mutex poisoned").clone()
    }

    fn with_nickname(&self, mut post: Post) -> Option<Post> {
        let author = self.users.get(post.author_id)?;
        post.author_nickname = author.user.nickname;
        Some(post)
    }

    fn modify(&self, kind: PostKind, id: ObjectId, f: impl FnOnce(&mut Post)) -> Option<Post> {
        let updated = {
            let mut posts = self.posts.lock().expect("posts mutex poisoned");
            let post = posts.iter_mut().find(|p| p.kind == kind && p.id == id)?;
            f(post);
            post.updated_at = Some(Utc::now());
            post.clone()
        };
        self.with_nickname(updated)
    }

    fn matching(&self, kind: PostKind, filter: PostFilter) -> Vec<Post> {
        let mut posts: Vec<Post> = self
            .all()
            .into_iter()
            .filter(|p| p.kind == kind)
            .filter(|p| filter.author_id.is_none_or(|author| p.author_id == author))
            .filter(|p| !filter.published_only || p.is_published)
            .filter_map(|p| self.with_nickname(p))
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        posts
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepo {
    async fn create_post(&self, kind: PostKind, input: NewPost) -> Result<Post, DomainError> {
        let author = self
            .users
            .get(input.author_id)
            .ok_or_else(|| DomainError::not_found("author"))?;

        let mut posts = self.posts.lock().expect("posts mutex poisoned");
        // Keep creation order strictly increasing so newest-first is deterministic.
        let created_at = Utc::now() + Duration::milliseconds(posts.len() as i64);
        let post = Post {
            id: input.id,
            kind,
            author_id: input.author_id,
            author_nickname: author.user.nickname,
            thumbnail: None,
            title: input.title,
            content: input.content,
            category: input.category,
            is_published: input.is_published,
            created_at,
            updated_at: None,
        };
        posts.push(post.clone());
        Ok(post)
    }

    async fn get_post(&self, kind: PostKind, id: ObjectId) -> Result<Option<Post>, DomainError> {
        Ok(self
            .all()
            .into_iter()
            .find(|p| p.kind == kind && p.id == id)
            .and_then(|p| self.with_nickname(p)))
    }

    async fn update_post(
        &self,
        kind: PostKind,
        id: ObjectId,
        patch: PostPatch,
    ) -> Result<Option<Post>, DomainError> {
        Ok(self.modify(kind, id, |post| {
            post.title = patch.title;
            post.content = patch.content;
            post.category = patch.category;
        }))
    }

    async fn set_published(
        &self,
        kind: PostKind,
        id: ObjectId,
        is_published: bool,
    ) -> Result<Option<Post>, DomainError> {
        Ok(self.modify(kind, id, |post| post.is_published = is_published))
    }

    async fn set_thumbnail(
        &self,
        kind: PostKind,
        id: ObjectId,
        thumbnail: &str,
    ) -> Result<Option<Post>, DomainError> {
        Ok(self.modify(kind, id, |post| {
            post.thumbnail = Some(thumbnail.to_string())
        }))
    }

    async fn delete_post(&self, kind: PostKind, id: ObjectId) -> Result<bool, DomainError> {
        let mut posts = self.posts.lock().expect("posts mutex poisoned");
        let before = posts.len();
        posts.retain(|p| !(p.kind == kind && p.id == id));
        Ok(posts.len() != before)
    }

    async fn list_posts(
        &self,
        kind: PostKind,
        filter: PostFilter,
        page: PageRequest,
    ) -> Result<Vec<PostSummary>, DomainError> {
        Ok(self
            .matching(kind, filter)
            .into_iter()
            .skip(page.skip() as usize)
            .take(page.limit() as usize)
            .map(PostSummary::from)
            .collect())
    }

    async fn count_posts(&self, kind: PostKind, filter: PostFilter) -> Result<i64, DomainError> {
        Ok(self.matching(kind, filter).len() as i64)
    }
}
