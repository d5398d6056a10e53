//! Media storage providers
//!
//! - [`CloudinaryUploader`] when Cloudinary credentials are configured
//! - [`DisabledUploader`] otherwise; every upload fails, so items without
//!   media and JSON submissions keep working

mod cloudinary;

pub use cloudinary::{preview_url, sign, CloudinaryUploader, RetryConfig};

use std::sync::Arc;

use async_trait::async_trait;
use lostfound_core::{MediaKind, MediaUploader, StoredObject, UploadError};

use crate::config::Config;

/// Uploader used when no media provider is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledUploader;

#[async_trait]
impl MediaUploader for DisabledUploader {
    async fn upload(
        &self,
        _data: &[u8],
        _folder: &str,
        _kind: MediaKind,
    ) -> Result<StoredObject, UploadError> {
        Err(UploadError::new("Media storage is not configured"))
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}

/// Pick the uploader for `config`.
pub fn uploader_from_config(config: &Config) -> Result<Arc<dyn MediaUploader>, UploadError> {
    match &config.cloudinary {
        Some(credentials) => {
            tracing::info!(cloud_name = %credentials.cloud_name, "Media storage: Cloudinary");
            Ok(Arc::new(CloudinaryUploader::new(credentials.clone())?))
        }
        None => {
            tracing::warn!("Media storage: not configured, uploads will be rejected");
            Ok(Arc::new(DisabledUploader))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_uploader_rejects_uploads() {
        let err = DisabledUploader
            .upload(b"bytes", "lost_found_app/claims/images", MediaKind::Image)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Media storage is not configured");
        assert_eq!(DisabledUploader.name(), "disabled");
    }

    #[test]
    fn test_uploader_from_default_config_is_disabled() {
        let uploader = uploader_from_config(&Config::default()).unwrap();
        assert_eq!(uploader.name(), "disabled");
    }
}
