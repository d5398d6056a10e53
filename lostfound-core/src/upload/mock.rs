//! Mock uploader for testing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{MediaUploader, StoredObject, UploadError};
use crate::media::MediaKind;

/// Deterministic in-process uploader.
/// WARNING: Do not use in production - nothing is actually stored!
#[derive(Debug, Default)]
pub struct MockUploader {
    /// Zero-based call index that fails
    fail_at: Option<usize>,
    fail_all: bool,
    stall: bool,
    calls: AtomicUsize,
    discarded: Mutex<Vec<String>>,
}

impl MockUploader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the upload with this zero-based call index.
    pub fn fail_at(mut self, index: usize) -> Self {
        self.fail_at = Some(index);
        self
    }

    /// Fail every upload.
    pub fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::default()
        }
    }

    /// Never complete an upload.
    pub fn stall(mut self) -> Self {
        self.stall = true;
        self
    }

    /// Number of upload calls made so far.
    pub fn upload_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Provider ids passed to `discard`.
    pub fn discarded(&self) -> Vec<String> {
        self.discarded
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl MediaUploader for MockUploader {
    async fn upload(
        &self,
        data: &[u8],
        folder: &str,
        kind: MediaKind,
    ) -> Result<StoredObject, UploadError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if data.is_empty() {
            return Err(UploadError::new("empty file"));
        }

        if self.stall {
            std::future::pending::<()>().await;
        }
        // Give concurrent callers a chance to interleave, like a network call would.
        tokio::task::yield_now().await;

        if self.fail_all || self.fail_at == Some(n) {
            return Err(UploadError::new("mock provider rejected the file"));
        }

        let ext = match kind {
            MediaKind::Image => "jpg",
            MediaKind::Video => "mp4",
        };
        let provider_id = format!("{folder}/mock-{n}");
        Ok(StoredObject {
            url: format!("https://media.test/{provider_id}.{ext}"),
            preview_url: format!("https://media.test/blur/{provider_id}.jpg"),
            provider_id: Some(provider_id),
            format: Some(ext.to_string()),
        })
    }

    async fn discard(&self, provider_id: &str, _kind: MediaKind) -> Result<(), UploadError> {
        self.discarded
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(provider_id.to_string());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
