use std::sync::Arc;

use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::backend::ObjectStore;
use crate::domain::PendingFile;
use crate::error::BackendError;

/// Result of resolving the profile image for a write.
///
/// `Failed` is never a "no image" value: the caller has to abort its write.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    /// No file was pending; carries the URL the form already had (may be empty).
    NoChange(String),
    /// The pending file was stored; carries its public URL.
    Uploaded(String),
    Failed(BackendError),
}

/// Uploads pending profile images into the object store.
#[derive(Clone)]
pub struct ImageUploader {
    store: Arc<dyn ObjectStore>,
}

impl ImageUploader {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Stores `pending` under a fresh key and returns its public URL, or passes
    /// `existing_url` through when nothing is pending.
    #[instrument(skip(self, pending), fields(file = pending.map(|f| f.name.as_str())))]
    pub async fn upload_image(&self, pending: Option<&PendingFile>, existing_url: &str) -> UploadOutcome {
        let Some(file) = pending else {
            return UploadOutcome::NoChange(existing_url.to_string());
        };

        let key = storage_key(file);
        if let Err(e) = self
            .store
            .upload(&key, file.bytes.clone(), &file.content_type(), true)
            .await
        {
            error!(key = %key, error = %e, "Image upload failed");
            return UploadOutcome::Failed(e);
        }

        let url = self.store.public_url(&key);
        info!(key = %key, url = %url, "Image uploaded");
        UploadOutcome::Uploaded(url)
    }
}

/// `<uuid>.<ext>` for the file, or a bare `<uuid>` when its name has no extension.
///
/// Only ASCII-alphanumeric extensions are kept, so the key is a single URL path segment
/// that needs no encoding.
pub fn storage_key(file: &PendingFile) -> String {
    let id = Uuid::new_v4();
    match file.extension() {
        Some(ext) if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) => {
            format!("{}.{}", id, ext)
        }
        _ => id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_framework::{create_mock_backend, expect_upload};

    #[test]
    fn test_storage_key_keeps_extension_and_is_fresh() {
        let file = PendingFile::new("portrait.jpeg", vec![0]);
        let first = storage_key(&file);
        let second = storage_key(&file);
        assert!(first.ends_with(".jpeg"));
        assert!(second.ends_with(".jpeg"));
        assert_ne!(first, second);

        let stem = first.trim_end_matches(".jpeg");
        assert!(Uuid::parse_str(stem).is_ok());

        let bare = storage_key(&PendingFile::new("portrait", vec![0]));
        assert!(Uuid::parse_str(&bare).is_ok());
    }

    #[test]
    fn test_storage_key_drops_unsafe_extension() {
        for name in ["me.png#2", "me.png?x=1", "me.p%2Fng", "me.p ng"] {
            let key = storage_key(&PendingFile::new(name, vec![0]));
            assert!(Uuid::parse_str(&key).is_ok(), "{} gave {}", name, key);
        }
    }

    #[tokio::test]
    async fn test_no_pending_file_passes_url_through() {
        let (client, mut receiver) = create_mock_backend(10);
        let uploader = ImageUploader::new(Arc::new(client));

        let outcome = uploader.upload_image(None, "https://img/old.png").await;
        assert_eq!(outcome, UploadOutcome::NoChange("https://img/old.png".to_string()));

        let outcome = uploader.upload_image(None, "").await;
        assert_eq!(outcome, UploadOutcome::NoChange(String::new()));
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_upload_returns_public_url() {
        let (client, mut receiver) = create_mock_backend(10);
        let uploader = ImageUploader::new(Arc::new(client));

        let task = tokio::spawn(async move {
            let file = PendingFile::new("me.png", vec![9, 9]);
            uploader.upload_image(Some(&file), "https://img/old.png").await
        });

        let (key, object, upsert, responder) = expect_upload(&mut receiver).await.expect("Expected Upload");
        assert!(key.ends_with(".png"));
        assert!(upsert);
        assert_eq!(object.bytes, vec![9, 9]);
        assert_eq!(object.content_type, "image/png");
        responder.send(Ok(())).unwrap();

        let outcome = task.await.unwrap();
        assert_eq!(outcome, UploadOutcome::Uploaded(format!("memory://avatars/{}", key)));
    }

    #[tokio::test]
    async fn test_upload_failure_is_tagged() {
        let (client, mut receiver) = create_mock_backend(10);
        let uploader = ImageUploader::new(Arc::new(client));

        let task = tokio::spawn(async move {
            let file = PendingFile::new("me.png", vec![1]);
            uploader.upload_image(Some(&file), "https://img/old.png").await
        });

        let (_, _, _, responder) = expect_upload(&mut receiver).await.expect("Expected Upload");
        responder
            .send(Err(BackendError::Rejected("Bucket not found".to_string())))
            .unwrap();

        assert_eq!(
            task.await.unwrap(),
            UploadOutcome::Failed(BackendError::Rejected("Bucket not found".to_string()))
        );
    }
}
