pub(crate) mod post_repository;
pub(crate) mod user_repository;

use thiserror::Error;

use crate::domain::post::PostKind;

/// Table names used by the Postgres repositories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Collections {
    pub(crate) users: String,
    pub(crate) story: String,
    pub(crate) board: String,
    pub(crate) notice: String,
}

#[derive(Debug, Error)]
#[error("invalid collection name '{0}': expected [a-z_][a-z0-9_]*")]
pub(crate) struct InvalidCollectionName(pub(crate) String);

impl Default for Collections {
    fn default() -> Self {
        Self {
            users: "users".to_string(),
            story: "story".to_string(),
            board: "board".to_string(),
            notice: "notice".to_string(),
        }
    }
}

impl Collections {
    /// Names are interpolated into SQL, so only plain identifiers pass.
    pub(crate) fn validate(self) -> Result<Self, InvalidCollectionName> {
        for name in [&self.users, &self.story, &self.board, &self.notice] {
            if !is_plain_identifier(name) {
                return Err(InvalidCollectionName(name.clone()));
            }
        }
        Ok(self)
    }

    pub(crate) fn posts(&self, kind: PostKind) -> &str {
        match kind {
            PostKind::Story => &self.story,
            PostKind::Board => &self.board,
            PostKind::Notice => &self.notice,
        }
    }
}

fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() || first == '_' => {}
        _ => return false,
    }
    name.len() <= 63
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
