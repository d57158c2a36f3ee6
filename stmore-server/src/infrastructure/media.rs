use std::path::PathBuf;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::info;

use crate::domain::error::DomainError;

const ALLOWED_MIME: [&str; 4] = ["image/png", "image/jpeg", "image/gif", "image/webp"];

#[async_trait]
pub(crate) trait MediaStore: Send + Sync {
    /// Persists an uploaded image and returns its public URL.
    async fn store_image(&self, bytes: &[u8]) -> Result<String, DomainError>;
}

/// Content-addressed files under `root`, sharded by the first hash byte and
/// served from `url_prefix`.
pub(crate) struct LocalMediaStore {
    root: PathBuf,
    url_prefix: String,
}

impl LocalMediaStore {
    pub(crate) fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            url_prefix: url_prefix.into(),
        }
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn store_image(&self, bytes: &[u8]) -> Result<String, DomainError> {
        if bytes.is_empty() {
            return Err(DomainError::Validation {
                field: "thumbnail",
                message: "must not be empty",
            });
        }

        let kind = infer::get(bytes)
            .filter(|kind| ALLOWED_MIME.contains(&kind.mime_type()))
            .ok_or(DomainError::Validation {
                field: "thumbnail",
                message: "must be a png, jpeg, gif or webp image",
            })?;

        let hash = format!("{:x}", Sha256::digest(bytes));
        let shard = &hash[..2];
        let file_name = format!("{hash}.{}", kind.extension());

        let dir = self.root.join(shard);
        let path = dir.join(&file_name);
        fs::create_dir_all(&dir)
            .await
            .map_err(|err| DomainError::Unexpected(format!("media dir: {err}")))?;

        let exists = fs::try_exists(&path)
            .await
            .map_err(|err| DomainError::Unexpected(format!("media stat: {err}")))?;
        if !exists {
            fs::write(&path, bytes)
                .await
                .map_err(|err| DomainError::Unexpected(format!("media write: {err}")))?;
            info!(file = %path.display(), size = bytes.len(), "stored media file");
        }

        Ok(format!("{}/{shard}/{file_name}", self.url_prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::{LocalMediaStore, MediaStore};
    use crate::domain::error::DomainError;

    const PNG_HEADER: &[u8] = &[
        0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, b'I', b'H', b'D',
        b'R',
    ];

    #[tokio::test]
    async fn stores_png_under_content_hash() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = LocalMediaStore::new(dir.path(), "/media");

        let url = store.store_image(PNG_HEADER).await.expect("must store");
        assert!(url.starts_with("/media/"));
        assert!(url.ends_with(".png"));

        let relative = url.trim_start_matches("/media/");
        assert!(dir.path().join(relative).exists());

        let again = store.store_image(PNG_HEADER).await.expect("must store");
        assert_eq!(url, again);
    }

    #[tokio::test]
    async fn rejects_non_images() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = LocalMediaStore::new(dir.path(), "/media");

        let err = store
            .store_image(b"#!/bin/sh\necho nope\n")
            .await
            .expect_err("must be rejected");
        assert!(matches!(
            err,
            DomainError::Validation {
                field: "thumbnail",
                ..
            }
        ));

        assert!(store.store_image(&[]).await.is_err());
    }
}
