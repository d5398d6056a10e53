//! Media upload collaborator.
//!
//! The blob store is external; the ledger only needs a URL, a redacted
//! preview URL and a provider id back. Implementations:
//!
//! - **Cloudinary** - signed uploads (server crate)
//! - **Mock** - deterministic URLs for testing, can be told to fail or stall
//!
//! Uploads always run before the owning record's write opens. A batch that
//! fails part-way discards what it already uploaded, best-effort.

mod mock;

pub use mock::MockUploader;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::LedgerError;
use crate::media::{MediaKind, MediaOwner, MediaUpload, NewMedia};

/// Reason an upload failed, as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct UploadError(pub String);

impl UploadError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Object stored by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub url: String,
    pub preview_url: String,
    pub provider_id: Option<String>,
    pub format: Option<String>,
}

/// Trait for media blob stores.
///
/// Implementations must be thread-safe and handle their own retries.
#[async_trait]
pub trait MediaUploader: Send + Sync {
    /// Store `data` under `folder` and return its URLs.
    async fn upload(
        &self,
        data: &[u8],
        folder: &str,
        kind: MediaKind,
    ) -> Result<StoredObject, UploadError>;

    /// Delete a previously stored object.
    async fn discard(&self, _provider_id: &str, _kind: MediaKind) -> Result<(), UploadError> {
        Ok(())
    }

    /// Provider name, for logs and health output.
    fn name(&self) -> &'static str;
}

/// Which upload of a batch becomes the owner's primary attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryRule {
    /// First image; videos are never primary
    FirstImage,
    /// First upload of any kind
    FirstUpload,
}

/// Uploads media for one owner, in order, with a per-file timeout.
#[derive(Clone)]
pub struct MediaBatch {
    uploader: Arc<dyn MediaUploader>,
    root_folder: String,
    timeout: Duration,
}

impl MediaBatch {
    pub fn new(uploader: Arc<dyn MediaUploader>, root_folder: impl Into<String>, timeout: Duration) -> Self {
        Self {
            uploader,
            root_folder: root_folder.into(),
            timeout,
        }
    }

    pub fn uploader(&self) -> &Arc<dyn MediaUploader> {
        &self.uploader
    }

    /// `{root}/{lost_items|found_items|claims}/{images|video}`
    pub fn folder_for(&self, owner: MediaOwner, kind: MediaKind) -> String {
        format!(
            "{}/{}/{}",
            self.root_folder,
            owner.folder_group(),
            kind.folder_segment()
        )
    }

    /// Upload every file and return the attachment records to persist.
    ///
    /// Positions follow `uploads` order. On the first failure, objects that
    /// were already stored are discarded and the upload error is returned.
    pub async fn upload_all(
        &self,
        owner: MediaOwner,
        uploads: Vec<MediaUpload>,
        rule: PrimaryRule,
    ) -> Result<Vec<NewMedia>, LedgerError> {
        let mut stored: Vec<NewMedia> = Vec::with_capacity(uploads.len());
        let mut primary_taken = false;

        for (position, upload) in uploads.into_iter().enumerate() {
            let folder = self.folder_for(owner, upload.kind);
            let result = tokio::time::timeout(
                self.timeout,
                self.uploader.upload(&upload.data, &folder, upload.kind),
            )
            .await;

            let object = match result {
                Ok(Ok(object)) => object,
                Ok(Err(err)) => {
                    self.discard_all(&stored).await;
                    return Err(LedgerError::Upload {
                        kind: upload.kind,
                        reason: err.0,
                    });
                }
                Err(_) => {
                    self.discard_all(&stored).await;
                    return Err(LedgerError::Upload {
                        kind: upload.kind,
                        reason: format!("timed out after {}s", self.timeout.as_secs()),
                    });
                }
            };

            let is_primary = !primary_taken
                && match rule {
                    PrimaryRule::FirstImage => upload.kind == MediaKind::Image,
                    PrimaryRule::FirstUpload => true,
                };
            primary_taken |= is_primary;

            stored.push(NewMedia {
                id: Uuid::new_v4(),
                owner,
                kind: upload.kind,
                url: object.url,
                preview_url: object.preview_url,
                provider_id: object.provider_id,
                format: object.format,
                is_primary,
                position: position as i32,
            });
        }

        Ok(stored)
    }

    /// Best-effort removal of objects whose owning record was never written.
    pub async fn discard_all(&self, media: &[NewMedia]) {
        for m in media {
            let Some(provider_id) = m.provider_id.as_deref() else {
                continue;
            };
            if let Err(e) = self.uploader.discard(provider_id, m.kind).await {
                tracing::warn!(provider_id, error = %e, "Failed to discard orphaned upload");
            }
        }
    }
}

impl std::fmt::Debug for MediaBatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaBatch")
            .field("uploader", &self.uploader.name())
            .field("root_folder", &self.root_folder)
            .field("timeout", &self.timeout)
            .finish()
    }
}
