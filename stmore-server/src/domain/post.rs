use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::ObjectId;

/// Content type of a post; each kind lives in its own collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum PostKind {
    Story,
    Board,
    Notice,
}

impl PostKind {
    pub(crate) const ALL: [PostKind; 3] = [PostKind::Story, PostKind::Board, PostKind::Notice];

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            PostKind::Story => "story",
            PostKind::Board => "board",
            PostKind::Notice => "notice",
        }
    }

    pub(crate) fn default_page_size(self) -> u32 {
        match self {
            PostKind::Story | PostKind::Board => 15,
            PostKind::Notice => 20,
        }
    }

    /// Notices are written by admins only.
    pub(crate) fn requires_admin(self) -> bool {
        matches!(self, PostKind::Notice)
    }

    pub(crate) fn published_by_default(self) -> bool {
        !matches!(self, PostKind::Story)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Post {
    pub(crate) id: ObjectId,
    pub(crate) kind: PostKind,
    pub(crate) author_id: ObjectId,
    pub(crate) author_nickname: String,
    pub(crate) thumbnail: Option<String>,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) category: Option<String>,
    pub(crate) is_published: bool,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: Option<DateTime<Utc>>,
}

/// List-view projection of a post. Carries no body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PostSummary {
    pub(crate) id: ObjectId,
    pub(crate) kind: PostKind,
    pub(crate) author_id: ObjectId,
    pub(crate) author_nickname: String,
    pub(crate) thumbnail: Option<String>,
    pub(crate) title: String,
    pub(crate) category: Option<String>,
    pub(crate) is_published: bool,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: Option<DateTime<Utc>>,
}

impl From<Post> for PostSummary {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            kind: post.kind,
            author_id: post.author_id,
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

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct CreatePostRequest {
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) category: Option<String>,
    pub(crate) is_published: Option<bool>,
}

impl CreatePostRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        Ok(Self {
            title: normalize_title(&self.title)?,
            content: normalize_content(&self.content)?,
            category: normalize_category(self.category.as_deref())?,
            is_published: self.is_published,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct UpdatePostRequest {
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) category: Option<String>,
}

impl UpdatePostRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        Ok(Self {
            title: normalize_title(&self.title)?,
            content: normalize_content(&self.content)?,
            category: normalize_category(self.category.as_deref())?,
        })
    }
}

fn normalize_title(title: &str) -> Result<String, DomainError> {
    let title = title.trim();
    if title.is_empty() || title.chars().count() > 255 {
        return Err(DomainError::Validation {
            field: "title",
            message: "must be 1..255 chars",
        });
    }
    Ok(title.to_string())
}

fn normalize_content(content: &str) -> Result<String, DomainError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(DomainError::Validation {
            field: "content",
            message: "must not be empty",
        });
    }
    Ok(content.to_string())
}

fn normalize_category(category: Option<&str>) -> Result<Option<String>, DomainError> {
    let Some(category) = category.map(str::trim).filter(|c| !c.is_empty()) else {
        return Ok(None);
    };
    if category.chars().count() > 64 {
        return Err(DomainError::Validation {
            field: "category",
            message: "must be at most 64 chars",
        });
    }
    Ok(Some(category.to_string()))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{CreatePostRequest, DomainError, Post, PostKind, PostSummary, UpdatePostRequest};
    use crate::domain::id::ObjectId;

    #[test]
    fn create_post_request_validate_rejects_empty_title() {
        let req = CreatePostRequest {
            title: "   ".to_string(),
            content: "valid content".to_string(),
            category: None,
            is_published: None,
        };

        let err = req.validate().expect_err("title must be rejected");
        assert_validation_field(err, "title");
    }

    #[test]
    fn update_post_request_validate_rejects_empty_content() {
        let req = UpdatePostRequest {
            title: "valid title".to_string(),
            content: "   ".to_string(),
            category: None,
        };

        let err = req.validate().expect_err("content must be rejected");
        assert_validation_field(err, "content");
    }

    #[test]
    fn create_post_request_validate_normalizes_fields() {
        let req = CreatePostRequest {
            title: "  title  ".to_string(),
            content: "  content  ".to_string(),
            category: Some("   ".to_string()),
            is_published: Some(true),
        };

        let validated = req.validate().expect("must validate");
        assert_eq!(validated.title, "title");
        assert_eq!(validated.content, "content");
        assert_eq!(validated.category, None);
        assert_eq!(validated.is_published, Some(true));
    }

    #[test]
    fn overlong_category_is_rejected() {
        let req = UpdatePostRequest {
            title: "title".to_string(),
            content: "content".to_string(),
            category: Some("c".repeat(65)),
        };
        assert_validation_field(req.validate().expect_err("must fail"), "category");
    }

    #[test]
    fn kind_policies() {
        assert!(PostKind::Notice.requires_admin());
        assert!(!PostKind::Story.requires_admin());
        assert!(!PostKind::Story.published_by_default());
        assert!(PostKind::Board.published_by_default());
        assert_eq!(PostKind::Notice.default_page_size(), 20);
        assert_eq!(PostKind::Story.default_page_size(), 15);
    }

    #[test]
    fn summary_drops_content() {
        let post = Post {
            id: ObjectId::generate(),
            kind: PostKind::Story,
            author_id: ObjectId::generate(),
            author_nickname: "writer".to_string(),
            thumbnail: None,
            title: "title".to_string(),
            content: "secret body".to_string(),
            category: None,
            is_published: true,
            created_at: Utc::now(),
            updated_at: None,
        };
        let summary = PostSummary::from(post.clone());
        assert_eq!(summary.id, post.id);
        assert_eq!(summary.title, post.title);
    }

    fn assert_validation_field(err: DomainError, expected_field: &'static str) {
        match err {
            DomainError::Validation { field, .. } => assert_eq!(field, expected_field),
            _ => panic!("expected DomainError::Validation"),
        }
    }
}
